// TerraLens - platform/config.rs
//
// Platform config directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Resolved platform paths for TerraLens configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/terralens/ or %APPDATA%\TerraLens\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Full path of the config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

/// Application configuration loaded from config.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub export: ExportConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when neither RUST_LOG nor --debug is set.
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Maximum number of entries in a single export operation.
    pub max_entries: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_entries: constants::DEFAULT_MAX_EXPORT_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Default for the include-read clause when the CLI flag is absent.
    pub include_read: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { include_read: true }
    }
}

impl AppConfig {
    /// Load and validate config.toml from the given path.
    ///
    /// A missing file yields the defaults; a present-but-invalid file is a
    /// hard error so misconfiguration surfaces at startup rather than as
    /// surprising behaviour later.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: AppConfig = toml::from_str(&raw).map_err(|e| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Range-check all values.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref level) = self.logging.level {
            const KNOWN: &[&str] = &["error", "warn", "info", "debug", "trace"];
            if !KNOWN.contains(&level.to_lowercase().as_str()) {
                return Err(ConfigError::ValueOutOfRange {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    expected: "one of error, warn, info, debug, trace".to_string(),
                });
            }
        }

        let max = self.export.max_entries;
        if !(constants::MIN_MAX_EXPORT_ENTRIES..=constants::ABSOLUTE_MAX_EXPORT_ENTRIES)
            .contains(&max)
        {
            return Err(ConfigError::ValueOutOfRange {
                field: "export.max_entries".to_string(),
                value: max.to_string(),
                expected: format!(
                    "{} to {}",
                    constants::MIN_MAX_EXPORT_ENTRIES,
                    constants::ABSOLUTE_MAX_EXPORT_ENTRIES
                ),
            });
        }

        Ok(())
    }
}
