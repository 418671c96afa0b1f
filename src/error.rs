//! Error types for dataset loading and filter validation.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// A filter selection that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Start of the date range lies after its end.
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
}

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Dataset file not found.
    #[error("dataset file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read the dataset file.
    #[error("failed to read dataset {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content.
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Required column not found in the header row.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// A cell could not be converted to its column type.
    #[error("invalid {column} value '{value}' at row {row}")]
    InvalidValue {
        column: String,
        value: String,
        row: usize,
    },
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;
