//! Preset persistence and lookup errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("preset file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("preset '{preset}' has unknown key '{key}'")]
    UnknownKey { preset: String, key: String },

    #[error("preset '{preset}' is invalid: {reason}")]
    InvalidValue { preset: String, reason: String },

    #[error("no preset named '{0}'")]
    NotFound(String),
}
