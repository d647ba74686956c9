use std::path::PathBuf;
use thiserror::Error;

use crate::models::ColumnType;

/// All errors produced by the KPI engine and its loader.
#[derive(Error, Debug)]
pub enum KpiError {
    /// Required columns are absent from a dataset.
    ///
    /// Carries both lists so the caller can show what was expected next to
    /// what the dataset actually offers.
    #[error("Missing required columns [{}]; available columns: [{}]", .missing.join(", "), .available.join(", "))]
    Schema {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// A single column looked up by an aggregator does not exist.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A numeric reduction was requested over a text column.
    #[error("Column {0} is not numeric")]
    NonNumericColumn(String),

    /// A top-N count outside `1..=available`.
    #[error("Invalid top-N count {requested}: must be between 1 and {available}")]
    InvalidRange { requested: usize, available: usize },

    /// Two columns share the same name.
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A row does not carry exactly one value per column.
    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A value does not match the declared column type.
    #[error("Row {row}: value in column {column} is not {expected}")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: ColumnType,
    },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV file could not be parsed.
    #[error("Failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// The data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A JSON document could not be parsed or written.
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KpiError {
    /// Whether this error stems from columns the input lacks.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::MissingColumn(_))
    }
}

/// Convenience alias used throughout the KPI crates.
pub type Result<T> = std::result::Result<T, KpiError>;
