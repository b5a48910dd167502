//! Client settings stored in liftoff.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default download write buffer size (512 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 512 * 1024;

pub const DEFAULT_LOGGING_LEVEL: &str = "info";

/// Settings shared by every run of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root directory holding one directory per app.
    pub gallery_dir: PathBuf,
    /// Write buffer used while downloading packages.
    pub buffer_size: usize,
    pub logging_level: String,
    /// Let the app inherit stdout/stderr instead of echoing captured output.
    pub skip_app_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gallery_dir: default_gallery_dir(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            logging_level: DEFAULT_LOGGING_LEVEL.to_string(),
            skip_app_output: false,
        }
    }
}

impl Settings {
    /// Tracing directive for the configured level.
    ///
    /// Unknown levels fall back to `info`.
    pub fn log_directive(&self) -> &'static str {
        match self.logging_level.to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" | "notice" => "info",
            "warn" | "warning" => "warn",
            "error" | "critical" => "error",
            _ => DEFAULT_LOGGING_LEVEL,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.buffer_size == 0 {
            anyhow::bail!("buffer_size must be greater than zero");
        }
        if self.gallery_dir.as_os_str().is_empty() {
            anyhow::bail!("gallery_dir must not be empty");
        }
        Ok(())
    }
}

fn default_gallery_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("liftoff")
        .join("apps")
}

/// Loads and saves [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at `<config dir>/liftoff/liftoff.toml`.
    pub fn from_default_location() -> anyhow::Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("liftoff");
        Ok(Self::from_path(dir.join("liftoff.toml")))
    }

    pub fn from_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, using defaults when the file does not exist.
    pub fn load(&self) -> anyhow::Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", self.path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(settings).context("Failed to serialize settings to TOML")?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.path, content).with_context(|| {
            format!("Failed to write settings file: {}", self.path.display())
        })?;
        Ok(())
    }
}
