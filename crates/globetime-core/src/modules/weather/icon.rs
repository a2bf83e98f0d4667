use super::Temperature;

/// Decorative icon chosen from a temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Sunny,
    Hottie,
    Windy,
    Cloudy,
    Rainy,
    Snowy,
    Default,
}

impl WeatherIcon {
    /// Select an icon by walking the thresholds top to bottom.
    ///
    /// The `>= 85` check shadows `>= 89`, so [`WeatherIcon::Hottie`] is never
    /// returned. The order is kept as is.
    pub fn for_degrees(degrees: f64) -> Self {
        if degrees >= 85.0 {
            WeatherIcon::Sunny
        } else if degrees >= 89.0 {
            WeatherIcon::Hottie
        } else if degrees >= 70.0 {
            WeatherIcon::Windy
        } else if degrees >= 50.0 {
            WeatherIcon::Cloudy
        } else if degrees >= 32.0 {
            WeatherIcon::Rainy
        } else if degrees.is_nan() {
            WeatherIcon::Default
        } else {
            WeatherIcon::Snowy
        }
    }

    /// Icon for a reading; sentinels get [`WeatherIcon::Default`].
    pub fn for_temperature(temperature: &Temperature) -> Self {
        match temperature.degrees() {
            Some(degrees) => Self::for_degrees(degrees as f64),
            None => WeatherIcon::Default,
        }
    }

    /// Stable key naming the icon asset.
    pub fn key(&self) -> &'static str {
        match self {
            WeatherIcon::Sunny => "Sunny",
            WeatherIcon::Hottie => "Hottie",
            WeatherIcon::Windy => "Windy",
            WeatherIcon::Cloudy => "Cloudy",
            WeatherIcon::Rainy => "Rainy",
            WeatherIcon::Snowy => "Snowy",
            WeatherIcon::Default => "Default",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            WeatherIcon::Sunny => "☀",
            WeatherIcon::Hottie => "🔥",
            WeatherIcon::Windy => "🌬",
            WeatherIcon::Cloudy => "☁",
            WeatherIcon::Rainy => "🌧",
            WeatherIcon::Snowy => "❄",
            WeatherIcon::Default => "🌐",
        }
    }
}
