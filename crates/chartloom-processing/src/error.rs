//! Custom error types for the preprocessing engine.
//!
//! Every failure is terminal for the invocation that raised it. Nothing is
//! retried internally; [`EngineError::is_retryable`] tells callers which
//! errors are worth re-running the whole operation for.
//!
//! Errors serialize as `{ "code", "message" }` so the outward JSON interface
//! can hand them straight to the UI layer.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the preprocessing engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing or invalid caller identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Dataset record is missing or not owned by the caller.
    #[error("Dataset '{0}' not found")]
    NotFound(String),

    /// Source is not the single supported delimited-text format.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Source has no usable data rows.
    #[error("Dataset has no data rows: {0}")]
    EmptySource(String),

    /// Object storage or record store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Input could not be read as delimited text at all.
    #[error("Malformed input: {0}")]
    Parse(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimited-text writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::EmptySource(_) => "EMPTY_SOURCE",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the caller may retry the whole operation.
    ///
    /// Only collaborator failures qualify; everything else is deterministic
    /// and would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Io(_) => true,
            Self::WithContext { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// HTTP status the outward interface maps this error to.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::UnsupportedFormat(_) | Self::EmptySource(_) | Self::Parse(_) => 422,
            Self::InvalidConfig(_) => 400,
            Self::WithContext { source, .. } => source.http_status(),
            _ => 500,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EngineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
