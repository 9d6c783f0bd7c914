//! Process-wide settings
//!
//! Loaded from a TOML file with every key optional, then optionally
//! overridden from the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `CEVENT_ENABLED` | `true` | Load events at all |
//! | `CEVENT_DEBUG` | `false` | Debug-level logging |
//! | `CEVENT_ENABLE_EXAMPLES` | `true` | Register the built-in example events |
//! | `CEVENT_GLOBALS_IN_NORMAL_ROUNDS` | `true` | Re-activate global events when switching to an ordinary round |

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Permission node required by each admin command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub list_cevents: String,
    pub queue_cevent: String,
    pub remove_queued_cevent: String,
    pub view_cevent_queue: String,
    pub clear_cevent_queue: String,
    pub stop_current_cevent: String,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            list_cevents: "kts.listcevents".to_string(),
            queue_cevent: "kts.queuecevent".to_string(),
            remove_queued_cevent: "kts.removequeuedcevent".to_string(),
            view_cevent_queue: "kts.viewqueuedcevent".to_string(),
            clear_cevent_queue: "kts.clearceventqueue".to_string(),
            stop_current_cevent: "kts.stopcurrentcevent".to_string(),
        }
    }
}

/// Settings consumed by the scheduler and the command layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether events are loaded at all
    pub is_enabled: bool,

    /// Sends debug logs to the console
    pub debug: bool,

    /// Whether the built-in example events pass catalog filtering
    pub enable_examples: bool,

    /// Whether global events are re-activated when the round switches to
    /// an ordinary round. When false they only run alongside a CEvent.
    pub global_events_in_normal_rounds: bool,

    /// Permission node per admin command
    pub permissions: Permissions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_enabled: true,
            debug: false,
            enable_examples: true,
            global_events_in_normal_rounds: true,
            permissions: Permissions::default(),
        }
    }
}

impl Settings {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env();
        settings
    }

    /// Override fields from `CEVENT_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Some(v) = parse_bool_env("CEVENT_ENABLED") {
            self.is_enabled = v;
        }
        if let Some(v) = parse_bool_env("CEVENT_DEBUG") {
            self.debug = v;
        }
        if let Some(v) = parse_bool_env("CEVENT_ENABLE_EXAMPLES") {
            self.enable_examples = v;
        }
        if let Some(v) = parse_bool_env("CEVENT_GLOBALS_IN_NORMAL_ROUNDS") {
            self.global_events_in_normal_rounds = v;
        }
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(content: &str) -> SettingsResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings, falling back to defaults.
    ///
    /// A missing file is not an error. When the file exists but cannot be
    /// read or parsed, defaults are returned together with the error so the
    /// caller can report it once logging is up.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<SettingsError>) {
        let path = path.as_ref();
        if !path.exists() {
            return (Self::default(), None);
        }

        match Self::load(path) {
            Ok(settings) => (settings, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Write settings as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> SettingsResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Accepts "1", "true" or "yes" as true and "0", "false" or "no" as false,
/// case-insensitive. Anything else is ignored.
fn parse_bool_env(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
