//! Application path management for dev, portable and installed modes.
//!
//! ## Mode Detection
//!
//! - **Dev mode** (debug builds): `djctl.yaml` in the current working
//!   directory; everything lives next to it.
//! - **Portable mode**: a `.portable` marker file next to the executable
//!   keeps all data files in the executable's directory.
//! - **Installed mode** (default): data is stored in the platform data
//!   directory under `djctl` (`~/.local/share/djctl`, `%APPDATA%\djctl`).

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::AppConfig;

/// Application name used for directories in installed mode
const APP_NAME: &str = "djctl";

const CONFIG_FILE: &str = "djctl.yaml";
const CONTROLS_FILE: &str = "djctl.controls";

/// Application paths for config, controls and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Default controls file, used unless the config names another
    pub controls: PathBuf,
    /// Path to the logs directory
    pub logs_dir: PathBuf,
    /// Whether running in portable (or dev) mode
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Called before logging is initialized, so early diagnostics go to
    /// stderr.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join(CONFIG_FILE).exists() {
                eprintln!(
                    "[paths] Running in DEV mode ({} found in cwd: {})",
                    CONFIG_FILE,
                    cwd.display()
                );
                return Self::in_dir(&cwd, true);
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            Self::in_dir(&exe_dir, true)
        } else {
            let app_data = dirs::data_dir()
                .unwrap_or_else(|| {
                    eprintln!(
                        "[paths] WARNING: dirs::data_dir() returned None, falling back to exe dir"
                    );
                    exe_dir.clone()
                })
                .join(APP_NAME);

            #[cfg(debug_assertions)]
            eprintln!(
                "[paths] Running in INSTALLED mode (data dir: {})",
                app_data.display()
            );

            Self::in_dir(&app_data, false)
        }
    }

    /// All paths rooted in one directory
    pub fn in_dir(dir: &Path, is_portable: bool) -> Self {
        Self {
            config: dir.join(CONFIG_FILE),
            controls: dir.join(CONTROLS_FILE),
            logs_dir: dir.join("logs"),
            is_portable,
        }
    }

    /// Get the base directory (for displaying in logs)
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Controls file to use: the configured one (relative paths resolved
    /// against the base directory) or the default.
    pub fn controls_file(&self, config: &AppConfig) -> PathBuf {
        match &config.controls.file {
            Some(file) => {
                let file = PathBuf::from(file);
                if file.is_absolute() {
                    file
                } else {
                    self.base_dir().join(file)
                }
            }
            None => self.controls.clone(),
        }
    }

    /// Ensure the config and logs directories exist.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if !self.logs_dir.exists() {
            debug!("Creating logs directory: {}", self.logs_dir.display());
            std::fs::create_dir_all(&self.logs_dir).with_context(|| {
                format!("Failed to create logs directory: {}", self.logs_dir.display())
            })?;
        }

        let base = self.base_dir();
        if !base.exists() {
            debug!("Creating config directory: {}", base.display());
            std::fs::create_dir_all(&base)
                .with_context(|| format!("Failed to create config directory: {}", base.display()))?;
        }

        Ok(())
    }
}
