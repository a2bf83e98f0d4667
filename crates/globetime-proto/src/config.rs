use chrono_tz::Tz;
use serde::Deserialize;

mod validation;

pub use validation::ConfigValidationError;

pub const DEFAULT_CONFIG_FILE_PATH: &str = "~/.config/globetime/config.toml";

pub const DEFAULT_WEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

pub const DEFAULT_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// A city entry as written in the configuration file.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CityConfig {
    pub name: String,
    /// IANA timezone identifier, e.g. `Europe/Paris`.
    pub timezone: String,
}

impl CityConfig {
    pub fn new(name: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timezone: timezone.into(),
        }
    }
}

/// A validated city with its timezone resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct City {
    pub name: String,
    pub timezone: Tz,
}

fn default_cities() -> Vec<CityConfig> {
    vec![
        CityConfig::new("SanJuan", "America/Puerto_Rico"),
        CityConfig::new("Paris", "Europe/Paris"),
        CityConfig::new("Tokyo", "Asia/Tokyo"),
        CityConfig::new("Sydney", "Australia/Sydney"),
        CityConfig::new("Moscow", "Europe/Moscow"),
    ]
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ClockModuleConfig {
    #[serde(default = "default_clock_format")]
    pub format: String,
}

impl Default for ClockModuleConfig {
    fn default() -> Self {
        Self {
            format: default_clock_format(),
        }
    }
}

/// US-English medium time style on a 12-hour clock, e.g. `3:04:05 PM`.
pub const DEFAULT_CLOCK_FORMAT: &str = "%-I:%M:%S %p";

fn default_clock_format() -> String {
    DEFAULT_CLOCK_FORMAT.to_string()
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
    Standard,
}

impl UnitSystem {
    /// Value of the `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
            UnitSystem::Standard => "standard",
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WeatherModuleConfig {
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub units: UnitSystem,
    /// Literal API key. Prefer `api_key_env` so the secret stays out of the file.
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Re-run the fetch cycle on this period. Unset means fetch once per mount.
    pub refresh_interval_minutes: Option<u64>,
}

impl Default for WeatherModuleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_weather_endpoint(),
            units: UnitSystem::default(),
            api_key: None,
            api_key_env: default_api_key_env(),
            refresh_interval_minutes: None,
        }
    }
}

impl WeatherModuleConfig {
    /// Resolve the API key from the literal value or, failing that, from the
    /// variable named by `api_key_env` through `lookup`.
    ///
    /// Blank values are treated as missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use globetime_proto::config::WeatherModuleConfig;
    ///
    /// let config = WeatherModuleConfig::default();
    /// let key = config.resolve_api_key_with(|name| {
    ///     (name == "OPENWEATHER_API_KEY").then(|| "secret".to_string())
    /// });
    /// assert_eq!(key.as_deref(), Some("secret"));
    /// ```
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let non_blank = |value: String| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        };

        match self.api_key.clone().and_then(non_blank) {
            Some(key) => Some(key),
            None => lookup(&self.api_key_env).and_then(non_blank),
        }
    }

    /// Resolve the API key using the process environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }
}

fn default_weather_endpoint() -> String {
    DEFAULT_WEATHER_ENDPOINT.to_owned()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_owned()
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub clock: ClockModuleConfig,
    #[serde(default)]
    pub weather: WeatherModuleConfig,
    #[serde(default = "default_cities")]
    pub cities: Vec<CityConfig>,
}

fn default_log_level() -> String {
    "warn".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            clock: ClockModuleConfig::default(),
            weather: WeatherModuleConfig::default(),
            cities: default_cities(),
        }
    }
}
