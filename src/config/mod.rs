//! Configuration management for djctl
//!
//! Handles loading, parsing and validation of the YAML configuration file.
//! The binding list itself lives in a separate controls file (see
//! [`crate::prefs`]) which is the one watched for hot reload.

pub mod watcher;

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

pub use watcher::ControlsWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Binding engine settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ControlsConfig {
    /// Controls file; defaults to the one in the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// How long a held pulse key stays live without auto-repeat
    #[serde(default = "default_repeat_ttl_ms")]
    pub repeat_ttl_ms: u64,
    /// Display ticks a fired binding stays highlighted
    #[serde(default = "default_highlight_ticks")]
    pub highlight_ticks: u32,
    /// Reload the controls file when it changes on disk
    #[serde(default = "default_true")]
    pub watch: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            file: None,
            repeat_ttl_ms: default_repeat_ttl_ms(),
            highlight_ticks: default_highlight_ticks(),
            watch: true,
        }
    }
}

impl ControlsConfig {
    pub fn repeat_ttl(&self) -> Duration {
        Duration::from_millis(self.repeat_ttl_ms)
    }
}

/// MIDI input configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MidiConfig {
    /// Substring of the input port name to connect to; none = no MIDI input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_port: Option<String>,
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: None,
            client_name: default_client_name(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write a daily-rolling log file in the logs directory
    #[serde(default)]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.controls.repeat_ttl_ms == 0 {
            anyhow::bail!("controls.repeat_ttl_ms must be greater than 0");
        }
        if self.controls.highlight_ticks == 0 {
            anyhow::bail!("controls.highlight_ticks must be greater than 0");
        }
        if let Some(file) = &self.controls.file {
            if file.trim().is_empty() {
                anyhow::bail!("controls.file cannot be empty");
            }
        }

        if self.midi.client_name.trim().is_empty() {
            anyhow::bail!("MIDI client_name cannot be empty");
        }
        if let Some(port) = &self.midi.input_port {
            if port.trim().is_empty() {
                anyhow::bail!("MIDI input_port cannot be empty when set");
            }
        }

        if self.logging.level.trim().is_empty() {
            anyhow::bail!("logging.level cannot be empty");
        }

        Ok(())
    }
}

// Default value functions
fn default_repeat_ttl_ms() -> u64 { 800 }
fn default_highlight_ticks() -> u32 { 3 }
fn default_true() -> bool { true }
fn default_client_name() -> String { "djctl".to_string() }
fn default_log_level() -> String { "info".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.controls.repeat_ttl(), Duration::from_millis(800));
        assert_eq!(config.controls.highlight_ticks, 3);
        assert!(config.controls.watch);
        assert_eq!(config.midi.client_name, "djctl");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
controls:
  file: "/tmp/studio.controls"
  repeat_ttl_ms: 500
midi:
  input_port: "nanoKONTROL"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.controls.file.as_deref(), Some("/tmp/studio.controls"));
        assert_eq!(config.controls.repeat_ttl_ms, 500);
        assert_eq!(config.controls.highlight_ticks, 3);
        assert_eq!(config.midi.input_port.as_deref(), Some("nanoKONTROL"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.controls.repeat_ttl_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.controls.highlight_ticks = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.midi.client_name = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.midi.input_port = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");
        let path = path.to_string_lossy().to_string();

        let mut config = AppConfig::default();
        config.midi.input_port = Some("Launch".to_string());
        config.logging.file = true;
        config.save(&path).await?;

        let loaded = AppConfig::load(&path).await?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_invalid_yaml_fails() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "controls: [unclosed")?;

        let result = AppConfig::load(&path.to_string_lossy()).await;
        assert!(result.is_err());
        Ok(())
    }
}
