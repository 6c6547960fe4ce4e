//! Error types for the csvsql conversion pipeline.
//!
//! - [`ConvertError`] - streaming conversion errors (input format, parse, I/O)
//! - [`PipelineError`] - file-level driver errors
//! - [`ConfigError`] - invalid server configuration
//! - [`ServerError`] - HTTP transport errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors raised while transcoding CSV rows into INSERT statements.
///
/// Every variant is terminal for the conversion that produced it.
/// Blocks flushed before the failure stay in the output sink.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input has no header row, or its first line is blank.
    #[error("No columns could be detected in the CSV input")]
    NoColumns,

    /// A data row could not be parsed (field-count mismatch, invalid UTF-8).
    #[error("Malformed CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Reading the input or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// True when the failure is caused by the uploaded content rather than
    /// by the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::NoColumns | Self::Parse { .. })
    }
}

impl From<csv::Error> for ConvertError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Self::Io(e),
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => Self::parse(
                line,
                format!("expected {} fields, found {}", expected_len, len),
            ),
            csv::ErrorKind::Utf8 { err, .. } => {
                Self::parse(line, format!("invalid UTF-8: {}", err))
            }
            other => Self::parse(line, format!("{:?}", other)),
        }
    }
}

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Errors from the file-level driver in [`crate::pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Conversion error.
    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    /// Creating the output directory or artifact failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Convert(e) if e.is_input_error())
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while reading [`crate::config::ServerConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload exceeds the configured body limit.
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// Requested artifact does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
