//! Result and error types for Latbench.

use thiserror::Error;

/// Result type for Latbench operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Errors that abort a benchmark run.
///
/// Per-call transport failures are not represented here: they are recorded
/// as failed trials (see [`crate::backend::TransportError`]).
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid or mismatched benchmark configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error came from misconfiguration rather than I/O
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
