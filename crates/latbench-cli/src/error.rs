//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error (missing credentials, unreadable config file)
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Benchmark library error
    #[error("Benchmark error: {0}")]
    Bench(#[from] latbench::BenchError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report generation error
    #[error("Report generation failed: {message}")]
    ReportGeneration {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a report generation error
    #[must_use]
    pub fn report_generation(message: impl Into<String>) -> Self {
        Self::ReportGeneration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("missing AWS_BEARER_TOKEN_BEDROCK");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("AWS_BEARER_TOKEN_BEDROCK"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("iterations must be at least 1");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_report_generation_error() {
        let err = CliError::report_generation("disk full");
        assert!(err.to_string().contains("Report"));
    }

    #[test]
    fn test_bench_error_from() {
        let err: CliError = latbench::BenchError::configuration("no backends").into();
        assert!(err.to_string().contains("no backends"));
        assert!(matches!(err, CliError::Bench(_)));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
