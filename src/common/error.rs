//! Error types for field_localization

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the localization stack
#[derive(Debug, Error)]
pub enum LocalizationError {
    /// Likelihood-field asset could not be opened or read
    #[error("Field load error: {}: {source}", .path.display())]
    FieldLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Likelihood-field data does not match the expected grid size
    #[error("Field size error: expected {expected} cells, got {actual}")]
    FieldSize { expected: usize, actual: usize },
    /// Motion-noise configuration could not be parsed or written
    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for localization operations
pub type LocalizationResult<T> = Result<T, LocalizationError>;
