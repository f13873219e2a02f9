//! Config command - view and manage the albumsync configuration
//!
//! Provides the `albumsync config` CLI command which:
//! 1. Writes a fresh default configuration file
//! 2. Shows the current configuration (YAML or JSON)
//! 3. Validates the configuration file and reports errors

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use albumsync_core::config::Config;

use crate::output::OutputFormat;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Init { force } => self.execute_init(config_path, *force, format),
            ConfigCommand::Show => self.execute_show(config_path, format),
            ConfigCommand::Validate => self.execute_validate(config_path, format),
        }
    }

    fn execute_init(&self, config_path: &Path, force: bool, format: OutputFormat) -> Result<()> {
        if config_path.exists() && !force {
            format.error(&format!(
                "{} already exists; use --force to overwrite",
                config_path.display()
            ));
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&Config::default())
            .context("Failed to serialize default configuration")?;
        std::fs::write(config_path, yaml).context("Failed to write configuration file")?;

        info!(config_path = %config_path.display(), "Wrote default configuration");
        format.success(&format!("Wrote {}", config_path.display()));
        format.payload(&serde_json::json!({
            "config_path": config_path.display().to_string(),
        }));
        Ok(())
    }

    fn execute_show(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let config = Config::load_or_default(config_path);

        if format.is_json() {
            let json =
                serde_json::to_value(&config).context("Failed to serialize configuration")?;
            format.payload(&json);
        } else {
            format.success(&format!("Configuration ({})", config_path.display()));
            format.detail("");
            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                format.detail(line);
            }
        }
        Ok(())
    }

    fn execute_validate(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let config = match Config::load(config_path) {
            Ok(config) => config,
            Err(e) => {
                format.error(&format!("Cannot load {}: {e}", config_path.display()));
                std::process::exit(1);
            }
        };

        let errors = config.validate();
        if errors.is_empty() {
            format.success("Configuration is valid");
            format.payload(&serde_json::json!({"valid": true}));
            return Ok(());
        }

        format.error(&format!("{} configuration error(s)", errors.len()));
        for e in &errors {
            format.detail(&e.to_string());
        }
        format.payload(&serde_json::json!({
            "valid": false,
            "errors": errors
                .iter()
                .map(|e| serde_json::json!({"field": e.field, "message": e.message}))
                .collect::<Vec<_>>(),
        }));
        std::process::exit(1);
    }
}
