//! Error types for surveysim

use thiserror::Error;

/// Result type for surveysim operations
pub type Result<T> = std::result::Result<T, SurveyError>;

/// Errors that can occur while simulating weather or planning a night
#[derive(Error, Debug)]
pub enum SurveyError {
    /// Invalid construction parameters (date range, time step, config file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Query outside the tabulated range
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Malformed tile catalog
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Table file with unexpected layout, metadata or checksum
    #[error("Invalid table file: {0}")]
    Format(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SurveyError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Returns `true` for errors raised by a query outside the tabulated range.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange(_))
    }
}
