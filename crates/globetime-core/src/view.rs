//! Projection of the time and weather maps into displayable cells.

use std::fmt::Write as _;

use globetime_proto::config::City;
use serde_json::Value;

use crate::modules::{
    clock::TimeReadings,
    weather::{WeatherIcon, WeatherReadings},
};

/// Placeholder shown for anything missing or not displayable.
pub const PLACEHOLDER: &str = "N/A";

pub const HEADING: &str = "Around the World : Time & Weather";

/// Convert a possibly-absent value into display text.
///
/// Absent values, `null`, blank strings, objects and arrays become
/// [`PLACEHOLDER`]; any other value is rendered as-is.
///
/// # Examples
///
/// ```
/// use globetime_core::view::safe_string;
/// use serde_json::json;
///
/// assert_eq!(safe_string(None), "N/A");
/// assert_eq!(safe_string(Some(&json!({}))), "N/A");
/// assert_eq!(safe_string(Some(&json!(73))), "73");
/// ```
pub fn safe_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Object(_)) | Some(Value::Array(_)) => {
            PLACEHOLDER.to_owned()
        }
        Some(Value::String(text)) => safe_str(Some(text)),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
    }
}

/// [`safe_string`] for plain text.
pub fn safe_str(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.to_owned(),
        _ => PLACEHOLDER.to_owned(),
    }
}

/// Everything shown for one city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityCell {
    pub name: String,
    pub time: String,
    pub temperature: String,
    pub condition: String,
    pub icon: WeatherIcon,
}

/// Build one cell per city, in configuration order.
pub fn project(cities: &[City], times: &TimeReadings, weather: &WeatherReadings) -> Vec<CityCell> {
    cities
        .iter()
        .map(|city| {
            let reading = weather.get(&city.name);

            CityCell {
                name: safe_str(Some(&city.name)),
                time: safe_str(times.get(&city.name).map(String::as_str)),
                temperature: safe_string(
                    reading.map(|r| r.temperature.to_value()).as_ref(),
                ),
                condition: safe_str(reading.map(|r| r.condition.as_str())),
                icon: reading.map_or(WeatherIcon::Default, |r| r.icon()),
            }
        })
        .collect()
}

/// Render cells as a plain-text frame.
pub fn render_text(cells: &[CityCell]) -> String {
    let mut frame = String::new();
    let _ = writeln!(frame, "{}", HEADING.to_uppercase());
    frame.push('\n');

    for cell in cells {
        let _ = writeln!(frame, "{} {}", cell.icon.glyph(), cell.name.to_uppercase());
        let _ = writeln!(frame, "   {}", cell.time);
        let _ = writeln!(frame, "   Temp: {} ({})", cell.temperature, cell.condition);
        frame.push('\n');
    }

    frame
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use globetime_proto::config::Config;
    use serde_json::json;

    use super::*;
    use crate::modules::weather::{Temperature, WeatherReading};

    #[test]
    fn safe_string_collapses_missing_values() {
        for value in [json!(null), json!(""), json!("   "), json!({})] {
            assert_eq!(safe_string(Some(&value)), "N/A", "{value}");
        }
        assert_eq!(safe_string(None), "N/A");
        assert_eq!(safe_string(Some(&json!([1, 2]))), "N/A");
    }

    #[test]
    fn safe_string_keeps_other_primitives() {
        assert_eq!(safe_string(Some(&json!(73))), "73");
        assert_eq!(safe_string(Some(&json!(-4.5))), "-4.5");
        assert_eq!(safe_string(Some(&json!(false))), "false");
        assert_eq!(safe_string(Some(&json!("Error"))), "Error");
        assert_eq!(safe_string(Some(&json!(" Paris "))), " Paris ");
    }

    #[test]
    fn project_falls_back_for_missing_data() {
        let cities = Config::default().cities().expect("cities");
        let cells = project(&cities, &HashMap::new(), &HashMap::new());

        assert_eq!(cells.len(), 5);
        for cell in &cells {
            assert_eq!(cell.time, "N/A");
            assert_eq!(cell.temperature, "N/A");
            assert_eq!(cell.icon, WeatherIcon::Default);
        }
        assert_eq!(cells[0].name, "SanJuan");
    }

    #[test]
    fn project_uses_readings_and_icons() {
        let cities = Config::default().cities().expect("cities");
        let times: TimeReadings = HashMap::from([("Paris".to_string(), "9:04:05 PM".to_string())]);
        let weather: WeatherReadings = HashMap::from([
            (
                "Paris".to_string(),
                WeatherReading {
                    temperature: Temperature::Degrees(90),
                    condition: "Clear".into(),
                },
            ),
            ("Tokyo".to_string(), WeatherReading::network_error()),
        ]);

        let cells = project(&cities, &times, &weather);
        let paris = &cells[1];
        let tokyo = &cells[2];

        assert_eq!(paris.time, "9:04:05 PM");
        assert_eq!(paris.temperature, "90");
        assert_eq!(paris.icon, WeatherIcon::Sunny);
        assert_eq!(tokyo.temperature, "Network Error");
        assert_eq!(tokyo.condition, "Default");
        assert_eq!(tokyo.icon, WeatherIcon::Default);
    }

    #[test]
    fn render_text_lists_cells_in_order() {
        let cells = vec![
            CityCell {
                name: "Paris".into(),
                time: "9:04:05 PM".into(),
                temperature: "61".into(),
                condition: "Clouds".into(),
                icon: WeatherIcon::Cloudy,
            },
            CityCell {
                name: "Tokyo".into(),
                time: "5:04:05 AM".into(),
                temperature: "Error".into(),
                condition: "Default".into(),
                icon: WeatherIcon::Default,
            },
        ];

        let frame = render_text(&cells);

        assert!(frame.starts_with("AROUND THE WORLD : TIME & WEATHER\n"));
        assert!(frame.contains("☁ PARIS\n   9:04:05 PM\n   Temp: 61 (Clouds)\n"));
        let paris = frame.find("PARIS").expect("paris");
        let tokyo = frame.find("TOKYO").expect("tokyo");
        assert!(paris < tokyo);
    }
}
