//! Error handling for incidence and prevalence analyses.

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for analysis runs
#[derive(Debug, thiserror::Error)]
pub enum IncPrevError {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error building or serialising Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error decoding a JSON configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid analysis configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required columns are not present in the dataset
    #[error("Columns not found in the dataset: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A configured date could not be parsed
    #[error("Date parsing error: '{value}' does not match format '{format}'")]
    DateParse {
        /// The offending text
        value: String,
        /// The format it was parsed with
        format: String,
    },

    /// No row of the input had usable follow-up dates
    #[error(
        "None of the {skipped} input rows has a readable follow-up start and end date; check the date format and column types"
    )]
    NoUsableRows {
        /// Number of rows that were skipped
        skipped: usize,
    },

    /// Input or destination path failed a pre-load check
    #[error("Invalid input {}: {message}", .path.display())]
    InvalidInput {
        /// Path that was checked
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },
}

impl IncPrevError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an input check error for a path
    pub fn invalid_input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised by configuration or structural
    /// validation before any computation started
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::MissingColumns(_) | Self::DateParse { .. }
        )
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, IncPrevError>;
