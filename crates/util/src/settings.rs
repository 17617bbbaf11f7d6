//! Engine settings persisted as JSON.
//!
//! Settings live at `~/.config/agentflow/settings.json` on most platforms. The path can be
//! overridden with `AGENTFLOW_SETTINGS_PATH`, and individual fields can be overridden with
//! environment variables so one-off runs need no file at all. A missing file yields defaults;
//! a malformed file is logged and ignored.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "AGENTFLOW_SETTINGS_PATH";
/// Overrides [`EngineSettings::step_timeout_ms`]. `0` disables the timeout.
pub const STEP_TIMEOUT_ENV: &str = "AGENTFLOW_STEP_TIMEOUT_MS";
/// Overrides [`EngineSettings::text_model`].
pub const TEXT_MODEL_ENV: &str = "AGENTFLOW_TEXT_MODEL";

/// Default filename for the JSON payload.
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Default filename of the JSON agent store.
pub const AGENT_STORE_FILE_NAME: &str = "agents.json";
/// Model used for text generation when nothing else is configured.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Error surfaced when reading or writing settings fails.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Tunables for workflow runs and their collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// Upper bound for a single step dispatch in milliseconds. `None` waits indefinitely.
    pub step_timeout_ms: Option<u64>,
    /// Model name passed to the text generation service.
    pub text_model: String,
    /// Location of the JSON agent store. Defaults next to the settings file.
    pub agent_store_path: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            step_timeout_ms: None,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            agent_store_path: None,
        }
    }
}

impl EngineSettings {
    /// Loads settings from the default location and applies environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&default_settings_path())
    }

    /// Loads settings from `path` and applies environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let mut settings = load_payload(path)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Writes the settings to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Per-step dispatch budget, if one is configured.
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.filter(|millis| *millis > 0).map(Duration::from_millis)
    }

    /// Resolved location of the JSON agent store.
    pub fn agent_store_path(&self) -> PathBuf {
        match &self.agent_store_path {
            Some(path) => expand_tilde(&path.to_string_lossy()),
            None => agentflow_config_dir().join(AGENT_STORE_FILE_NAME),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = env::var(STEP_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(0) => self.step_timeout_ms = None,
                Ok(millis) => self.step_timeout_ms = Some(millis),
                Err(error) => warn!(variable = STEP_TIMEOUT_ENV, value = %raw, error = %error, "Ignoring invalid step timeout override"),
            }
        }
        if let Ok(model) = env::var(TEXT_MODEL_ENV) {
            let trimmed = model.trim();
            if !trimmed.is_empty() {
                self.text_model = trimmed.to_string();
            }
        }
    }
}

/// Path of the settings file, honoring [`SETTINGS_PATH_ENV`].
pub fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    agentflow_config_dir().join(SETTINGS_FILE_NAME)
}

fn agentflow_config_dir() -> PathBuf {
    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("agentflow")
}

fn load_payload(path: &Path) -> Result<EngineSettings, SettingsError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse settings file; using defaults"
                );
                Ok(EngineSettings::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(EngineSettings::default()),
        Err(error) => Err(SettingsError::Io(error)),
    }
}
