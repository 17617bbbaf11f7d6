//! Shared helpers for the agentflow crates: settings, path handling, and log hygiene.

pub mod path_processing;
pub mod settings;
pub mod text_processing;

pub use path_processing::expand_tilde;
pub use settings::{EngineSettings, SettingsError};
pub use text_processing::{redact_sensitive, truncate_for_log};
