//! Error handling module for harmony-batch
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every failure is fatal for the current batch run: errors are raised at the
//! point of detection and never retried.

use thiserror::Error;

/// Main error type for job resolution, host workflows and batch orchestration
#[derive(Error, Debug)]
pub enum BatchError {
    /// A required external pointer (environment variable, project dir) is absent
    #[error("Missing hint: {0}")]
    MissingHint(String),

    /// No candidate path exists on disk
    #[error("{label} not found (tried: {})", tried.join(", "))]
    NotFound { label: String, tried: Vec<String> },

    /// A required job or config field is absent or empty
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A field is present but cannot be interpreted
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// No scene record matches the requested identifier
    #[error("Scene not found in config: {0}")]
    SceneNotFound(String),

    /// The host media importer reported failure
    #[error("Import failed: {0}")]
    ImportFailed(String),

    /// External process exited nonzero, timed out or could not be spawned
    #[error("Process failure: {0}")]
    ProcessFailure(String),

    /// Validation errors (user input, settings values)
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for harmony-batch operations
pub type Result<T> = std::result::Result<T, BatchError>;

// Convenient error constructors
impl BatchError {
    /// Create a missing-hint error
    pub fn missing_hint(msg: impl Into<String>) -> Self {
        Self::MissingHint(msg.into())
    }

    /// Create a not-found error carrying every candidate that was probed
    pub fn not_found(label: impl Into<String>, tried: &[String]) -> Self {
        Self::NotFound {
            label: label.into(),
            tried: tried.to_vec(),
        }
    }

    /// Create a missing-field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create an invalid-field error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an import failure
    pub fn import_failed(msg: impl Into<String>) -> Self {
        Self::ImportFailed(msg.into())
    }

    /// Create a process failure
    pub fn process(msg: impl Into<String>) -> Self {
        Self::ProcessFailure(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
