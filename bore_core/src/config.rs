//! Application configuration.
//!
//! Read from TOML at `$BOREQUOTE_CONFIG`, falling back to
//! `<config dir>/borequote/config.toml`. A missing file means defaults.
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [defaults]
//! flushing_rate = 40.0
//! buffer_limit_ft = 10.0
//! profile = "Factory"
//!
//! [storage]
//! book_path = "/home/ravi/borewell/invoices.bqi"
//! business_name = "Sri Ganesh Borewells"
//! owner = "Ravi"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{BoreError, BoreResult};
use crate::rates::profiles::FACTORY_PROFILE;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "BOREQUOTE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub defaults: QuoteDefaults,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"bore_core=debug"`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
        }
    }
}

/// Values pre-filled into a new quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteDefaults {
    pub flushing_rate: f64,
    pub buffer_limit_ft: f64,
    /// Rate profile name to price with
    pub profile: String,
}

impl Default for QuoteDefaults {
    fn default() -> Self {
        QuoteDefaults {
            flushing_rate: 0.0,
            buffer_limit_ft: 0.0,
            profile: FACTORY_PROFILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Invoice book to record quotations in; `None` disables saving
    pub book_path: Option<PathBuf>,
    pub business_name: String,
    pub owner: String,
}

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// a `ConfigError`.
    pub fn load(path: &Path) -> BoreResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(AppConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| BoreError::config_error(path.display().to_string(), e.to_string()))?;
        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| BoreError::config_error(path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Write configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> BoreResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| BoreError::config_error(path.display().to_string(), e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                let dir = parent.display().to_string();
                BoreError::file_error("create config dir", dir, e.to_string())
            })?;
        }
        fs::write(path, contents).map_err(|e| {
            BoreError::file_error("write config", path.display().to_string(), e.to_string())
        })
    }
}

/// Config path from `$BOREQUOTE_CONFIG`, else the platform config dir.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("borequote")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn temp_config_path(name: &str) -> PathBuf {
        temp_dir()
            .join(format!("borequote_cfg_{}_{}", name, std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load(&temp_config_path("missing")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.defaults.profile, FACTORY_PROFILE);
        assert!(config.storage.book_path.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [defaults]
            buffer_limit_ft = 10.0
            "#,
        )
        .unwrap();
        assert_eq!(config.defaults.buffer_limit_ft, 10.0);
        assert_eq!(config.defaults.flushing_rate, 0.0);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_config_path("roundtrip");
        let mut config = AppConfig::default();
        config.defaults.flushing_rate = 40.0;
        config.storage.book_path = Some(PathBuf::from("/tmp/invoices.bqi"));
        config.storage.business_name = "Sri Ganesh Borewells".to_string();

        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let path = temp_config_path("malformed");
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(&path, "[defaults\nbuffer_limit_ft = ").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}
