//! Error types for hostbench
//!
//! Runner-internal failures are expressed as `BenchError` and folded into a
//! failed `RawMetric` at the runner boundary; they never abort a run.

use thiserror::Error;

/// Main error type for the benchmark harness
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration errors (unreadable or malformed config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scratch resource could not be acquired
    #[error("Cannot open scratch file {path}: {reason}")]
    Resource { path: String, reason: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Generic errors with context
    #[error("Benchmark error: {0}")]
    Generic(String),
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Convert anyhow errors to BenchError
impl From<anyhow::Error> for BenchError {
    fn from(err: anyhow::Error) -> Self {
        BenchError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BenchError::Config("rows must be a number".to_string());
        assert_eq!(err.to_string(), "Configuration error: rows must be a number");
    }

    #[test]
    fn test_resource_error_names_path() {
        let err = BenchError::Resource {
            path: "/nope/benchmark.tmp".to_string(),
            reason: "Permission denied".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nope/benchmark.tmp"));
        assert!(msg.contains("Permission denied"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BenchError = io.into();
        assert!(matches!(err, BenchError::Io(_)));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: BenchError = anyhow::anyhow!("boom").into();
        assert!(err.to_string().contains("boom"));
    }
}
