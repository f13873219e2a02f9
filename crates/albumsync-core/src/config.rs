//! Configuration module for albumsync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for albumsync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory whose immediate subdirectories are the local albums.
    pub photo_dir: PathBuf,
    /// Case-insensitive glob patterns for files considered for upload.
    pub include_files: Vec<String>,
    /// Case-insensitive glob patterns for directory names to skip entirely.
    pub exclude_dirs: Vec<String>,
    /// When true, remote albums with no local counterpart are deleted at the
    /// end of a run.
    pub delete_remote_albums_not_local: bool,
    /// Remote album titles that are never deleted by any cleanup pass.
    pub never_delete_albums: Vec<String>,
    /// When false, albums whose ledger already points at a live remote album
    /// are skipped without re-reconciling.
    pub update_albums_already_remote: bool,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Bounded-retry settings for remote operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per retry scope before the run is aborted.
    pub max_attempts: u32,
    /// Fixed delay between attempts, in seconds.
    pub delay_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/albumsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("albumsync")
            .join("config.yaml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            photo_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Pictures"),
            include_files: vec![
                "*.jpg".into(),
                "*.jpeg".into(),
                "*.bmp".into(),
                "*.gif".into(),
                "*.png".into(),
                "*.mov".into(),
                "*.mpg".into(),
            ],
            exclude_dirs: vec![".DS_Store".into()],
            delete_remote_albums_not_local: false,
            never_delete_albums: vec!["Camera Roll".into()],
            update_albums_already_remote: false,
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay_secs: 120,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"retry.max_attempts"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.photo_dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "photo_dir".into(),
                message: "must not be empty".into(),
            });
        }

        if self.include_files.is_empty() {
            errors.push(ValidationError {
                field: "include_files".into(),
                message: "must contain at least one pattern".into(),
            });
        }

        for (field, patterns) in [
            ("include_files", &self.include_files),
            ("exclude_dirs", &self.exclude_dirs),
        ] {
            for pattern in patterns {
                if let Err(e) = glob::Pattern::new(pattern) {
                    errors.push(ValidationError {
                        field: field.into(),
                        message: format!("invalid glob pattern '{pattern}': {e}"),
                    });
                }
            }
        }

        if self.retry.max_attempts == 0 {
            errors.push(ValidationError {
                field: "retry.max_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}
