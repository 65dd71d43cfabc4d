//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading, parsing, or patching settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write the settings file on disk.
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file or a patch.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A patch produced a document that no longer deserializes.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
