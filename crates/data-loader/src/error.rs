//! Error types for the data-loader crate.
//!
//! Two families live here:
//! - `DataLoadError`: anything that goes wrong while reading or validating an
//!   artifact. These are fatal at startup.
//! - `LookupError`: failures when querying an already-loaded catalog. These
//!   are recoverable and surface to the user as "not found".

use thiserror::Error;

/// Errors that can occur while loading the catalog or similarity artifacts
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Artifact is not valid JSON, or a value has the wrong JSON type
    #[error("Malformed JSON in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required catalog column is absent
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// Catalog columns disagree on the number of rows
    #[error("Column '{column}' in {file} has {found} entries, expected {expected}")]
    ColumnLengthMismatch {
        file: String,
        column: String,
        expected: usize,
        found: usize,
    },

    /// Index-map columns disagree on which rows they contain
    #[error("Column '{column}' in {file} is indexed differently from '{reference}'")]
    ColumnIndexMismatch {
        file: String,
        column: String,
        reference: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Binary artifact header is wrong or unsupported
    #[error("Bad header in {file}: {reason}")]
    BadHeader { file: String, reason: String },

    /// Binary artifact ends before all declared scores were read
    #[error("Truncated artifact {file}: expected {expected} bytes, found {found}")]
    Truncated {
        file: String,
        expected: usize,
        found: usize,
    },

    /// A similarity row has the wrong number of columns
    #[error("Similarity matrix is not square: row {row} has {found} columns, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Catalog and similarity matrix are not aligned
    #[error("Catalog has {catalog} movies but similarity matrix is {matrix}x{matrix}")]
    DimensionMismatch { catalog: usize, matrix: usize },

    /// NaN or infinite score in the similarity matrix
    #[error("Non-finite similarity score at ({row}, {column})")]
    NonFiniteScore { row: usize, column: usize },
}

/// Errors returned when querying loaded artifacts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No catalog record carries this exact title
    #[error("Movie not found: {title}")]
    NotFound { title: String },

    /// Index is outside the catalog
    #[error("Movie index {index} out of range (catalog has {len} movies)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
