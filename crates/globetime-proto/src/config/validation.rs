use std::collections::HashSet;

use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use masterror::Error;

use super::{City, Config};

/// Errors returned when validating a [`Config`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// No cities were configured.
    #[error("at least one city must be configured")]
    EmptyCityList,

    /// A city entry has an empty display name.
    #[error("city at position {index} has an empty name")]
    BlankCityName { index: usize },

    /// Two city entries share the same display name.
    #[error("duplicate city definition for '{name}'")]
    DuplicateCity { name: String },

    /// The timezone identifier is not a known IANA zone.
    #[error("city '{city}' has unknown timezone '{timezone}'")]
    InvalidTimezone { city: String, timezone: String },

    /// A refresh interval of zero minutes would spin the fetch loop.
    #[error("weather refresh interval must be greater than zero minutes")]
    ZeroRefreshInterval,

    /// The clock format contains a specifier chrono cannot render.
    #[error("invalid clock format '{format}'")]
    InvalidClockFormat { format: String },
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] if the city list is empty, contains
    /// blank or duplicate names, references an unknown timezone, if the
    /// weather refresh interval is zero, or if the clock format has an
    /// unknown specifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use globetime_proto::config::Config;
    ///
    /// let config = Config::default();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.weather.refresh_interval_minutes == Some(0) {
            return Err(ConfigValidationError::ZeroRefreshInterval);
        }

        if StrftimeItems::new(&self.clock.format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigValidationError::InvalidClockFormat {
                format: self.clock.format.clone(),
            });
        }

        self.cities().map(|_| ())
    }

    /// Resolve the configured cities, preserving their order.
    ///
    /// # Errors
    ///
    /// Same city checks as [`Config::validate`].
    pub fn cities(&self) -> Result<Vec<City>, ConfigValidationError> {
        if self.cities.is_empty() {
            return Err(ConfigValidationError::EmptyCityList);
        }

        let mut seen = HashSet::new();
        let mut cities = Vec::with_capacity(self.cities.len());

        for (index, entry) in self.cities.iter().enumerate() {
            let name = entry.name.trim();

            if name.is_empty() {
                return Err(ConfigValidationError::BlankCityName { index });
            }

            if !seen.insert(name.to_owned()) {
                return Err(ConfigValidationError::DuplicateCity {
                    name: name.to_owned(),
                });
            }

            let timezone = entry.timezone.trim().parse::<Tz>().map_err(|_| {
                ConfigValidationError::InvalidTimezone {
                    city: name.to_owned(),
                    timezone: entry.timezone.clone(),
                }
            })?;

            cities.push(City {
                name: name.to_owned(),
                timezone,
            });
        }

        Ok(cities)
    }
}
