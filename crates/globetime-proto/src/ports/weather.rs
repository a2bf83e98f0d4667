use std::{future::Future, sync::Arc};

use masterror::Error;
use serde::Deserialize;

/// Application-level code reported by the service on success.
pub const SUCCESS_CODE: i64 = 200;

/// Error type returned by [`WeatherPort`] operations.
///
/// Both variants describe failures below the application level; a response
/// that decoded but carries an error `cod` is returned as `Ok`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// The request could not be sent or the connection failed.
    #[error("weather request for '{city}' failed: {context}")]
    Transport { city: Arc<str>, context: Arc<str> },

    /// The response body was not a valid weather payload.
    #[error("weather response for '{city}' could not be decoded: {context}")]
    Decode { city: Arc<str>, context: Arc<str> },
}

impl WeatherError {
    /// Helper for constructing [`WeatherError::Transport`].
    pub fn transport(city: &str, context: impl Into<String>) -> Self {
        Self::Transport {
            city: Arc::from(city),
            context: Arc::from(context.into()),
        }
    }

    /// Helper for constructing [`WeatherError::Decode`].
    pub fn decode(city: &str, context: impl Into<String>) -> Self {
        Self::Decode {
            city: Arc::from(city),
            context: Arc::from(context.into()),
        }
    }
}

/// The `cod` field. The service sends a number on success and a numeric
/// string such as `"404"` on errors. Only the number counts as success.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResponseCode {
    Number(i64),
    Text(String),
}

impl ResponseCode {
    /// Numeric value of the code, if it has one.
    pub fn value(&self) -> Option<i64> {
        match self {
            ResponseCode::Number(code) => Some(*code),
            ResponseCode::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Current-weather response body. Only the consumed fields are modelled.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherResponse {
    #[serde(default)]
    pub cod: Option<ResponseCode>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub main: Option<MainReading>,
    #[serde(default)]
    pub weather: Vec<ConditionReading>,
}

impl WeatherResponse {
    /// Returns `true` when `cod` is the number [`SUCCESS_CODE`].
    pub fn is_success(&self) -> bool {
        self.cod == Some(ResponseCode::Number(SUCCESS_CODE))
    }

    /// Label of the first reported condition, if any.
    pub fn condition(&self) -> Option<&str> {
        self.weather.first().and_then(|w| w.main.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MainReading {
    pub temp: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionReading {
    #[serde(default)]
    pub main: Option<String>,
}

/// Port used to query the current weather for a city by name.
///
/// Implementations perform exactly one request per call and must not retry.
pub trait WeatherPort: Send + Sync {
    fn current_weather(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<WeatherResponse, WeatherError>> + Send;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> WeatherResponse {
        serde_json::from_value(value).expect("valid response")
    }

    #[test]
    fn decodes_success_payload() {
        let response = decode(json!({
            "cod": 200,
            "main": { "temp": 72.6, "humidity": 40 },
            "weather": [{ "main": "Clouds", "description": "broken clouds" }],
            "name": "Paris"
        }));

        assert!(response.is_success());
        assert_eq!(response.main, Some(MainReading { temp: 72.6 }));
        assert_eq!(response.condition(), Some("Clouds"));
    }

    #[test]
    fn decodes_error_payload_with_string_code() {
        let response = decode(json!({ "cod": "404", "message": "city not found" }));

        assert!(!response.is_success());
        assert_eq!(response.cod.as_ref().and_then(ResponseCode::value), Some(404));
        assert_eq!(response.message.as_deref(), Some("city not found"));
        assert_eq!(response.condition(), None);
    }

    #[test]
    fn string_success_code_is_not_success() {
        let response = decode(json!({ "cod": "200", "main": { "temp": 1.0 } }));

        assert!(!response.is_success());
        assert_eq!(response.cod.as_ref().and_then(ResponseCode::value), Some(200));
    }

    #[test]
    fn missing_code_is_not_success() {
        let response = decode(json!({ "main": { "temp": 50.0 } }));
        assert!(!response.is_success());
    }

    #[test]
    fn error_messages_name_the_city() {
        let err = WeatherError::transport("Tokyo", "connection refused");
        assert_eq!(
            err.to_string(),
            "weather request for 'Tokyo' failed: connection refused"
        );
    }
}
