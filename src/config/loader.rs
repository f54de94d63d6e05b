use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::types::{DriverConfig, StoreKind, StoreOptions};

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid store_options for '{store}': {source}")]
    OptionsError {
        store: StoreKind,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl DriverConfig {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/vmpool/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("vmpool").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `DriverConfig::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(DriverConfig::default());
        }
        Self::load_from(&path)
    }

    /// Loads and validates configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: DriverConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The pool name is not empty
    /// - `store_options` parse into the options of the selected store
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "pool_name must not be empty".to_string(),
            });
        }
        self.store_options().map(|_| ())
    }

    /// Parse `store_options` into the typed options of `state_store`.
    pub fn store_options(&self) -> Result<StoreOptions, ConfigError> {
        let options = match self.state_store {
            StoreKind::File => StoreOptions::File(self.parse_options()?),
            StoreKind::GitlabSnippet => StoreOptions::GitlabSnippet(self.parse_options()?),
            StoreKind::GitlabCommit => StoreOptions::GitlabCommit(self.parse_options()?),
            StoreKind::Vmpooler => StoreOptions::Vmpooler(self.parse_options()?),
        };

        match &options {
            StoreOptions::GitlabSnippet(o) if o.project_id == 0 => Err(missing_project(self.state_store)),
            StoreOptions::GitlabCommit(o) if o.project_id == 0 => Err(missing_project(self.state_store)),
            StoreOptions::Vmpooler(o) if o.host_url.trim().is_empty() => {
                Err(ConfigError::ValidationError {
                    message: "vmpooler store requires a non-empty host_url".to_string(),
                })
            }
            _ => Ok(options),
        }
    }

    fn parse_options<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        toml::Value::Table(self.store_options.clone())
            .try_into()
            .map_err(|e| ConfigError::OptionsError {
                store: self.state_store,
                source: e,
            })
    }
}

fn missing_project(store: StoreKind) -> ConfigError {
    ConfigError::ValidationError {
        message: format!("{} store requires a positive project_id", store),
    }
}
