//! Error Handling Module
//!
//! Defines the error type for the report pipeline.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for report operations
#[derive(Error, Debug)]
pub enum ReportError {
    /// A training log could not be parsed as a table
    #[error("Failed to parse table at '{0}': {1}")]
    TableParse(PathBuf, String),

    /// Malformed table content (ragged rows, bad headers)
    #[error("Table error: {0}")]
    Table(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialization(err.to_string())
    }
}

/// Convenience Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportError::Table("ragged row".to_string());
        assert_eq!(format!("{}", err), "Table error: ragged row");
    }

    #[test]
    fn test_table_parse_error_mentions_path() {
        let path = PathBuf::from("/runs/FixMatch_4_labels_per_class/training_logs.csv");
        let err = ReportError::TableParse(path, "bad record".to_string());
        assert!(format!("{}", err).contains("training_logs.csv"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReportError = io_err.into();
        assert!(matches!(err, ReportError::Io(_)));
    }
}
