use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub use globetime_proto::config::*;

use log::{info, warn};
use masterror::{AppError, Error};
use shellexpand::full;

/// Failures while locating, reading or validating the configuration file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Shell expansion of the path failed, e.g. an unset variable.
    #[error("failed to expand config path '{path}': {context}")]
    Expand { path: String, context: String },

    /// An explicitly provided config file does not exist.
    #[error("config file does not exist: {path}")]
    NotFound { path: String },

    #[error("failed to read config at {path}: {context}")]
    Read { path: String, context: String },

    #[error("failed to parse config at {path}: {context}")]
    Parse { path: String, context: String },

    #[error("invalid configuration in {path}: {reason}")]
    Validation {
        path: String,
        reason: ConfigValidationError,
    },
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::internal(err.to_string())
    }
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one, the default path is used and
/// a missing file yields [`Config::default`].
pub fn get_config(path: Option<PathBuf>) -> Result<(Config, PathBuf), ConfigError> {
    match path {
        Some(path) => {
            info!("Config path provided {path:?}");
            let expanded = expand_path(&path)?;

            if !expanded.exists() {
                return Err(ConfigError::NotFound {
                    path: expanded.display().to_string(),
                });
            }

            Ok((read_config(&expanded)?, expanded))
        }
        None => {
            let expanded = expand_path(Path::new(DEFAULT_CONFIG_FILE_PATH))?;

            if !expanded.exists() {
                info!("No config at {expanded:?}, using defaults");
                return Ok((Config::default(), expanded));
            }

            Ok((read_config(&expanded)?, expanded))
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    let str_path = path.to_string_lossy();
    let expanded = full(&str_path).map_err(|e| ConfigError::Expand {
        path: str_path.to_string(),
        context: e.to_string(),
    })?;

    Ok(PathBuf::from(expanded.to_string()))
}

/// Read, decode and validate a config file.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let display = path.display().to_string();

    let content = fs::read_to_string(path).map_err(|e| {
        warn!("Failed to read config file: {e}");
        match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound {
                path: display.clone(),
            },
            _ => ConfigError::Read {
                path: display.clone(),
                context: e.to_string(),
            },
        }
    })?;

    info!("Decoding config file {path:?}");

    let config: Config = toml::from_str(&content).map_err(|e| {
        warn!("Failed to parse config file: {e}");
        ConfigError::Parse {
            path: display.clone(),
            context: e.to_string(),
        }
    })?;

    config
        .validate()
        .map_err(|reason| ConfigError::Validation {
            path: display,
            reason,
        })?;

    info!("Config file loaded successfully");
    Ok(config)
}
