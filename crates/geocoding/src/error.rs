//! Error types for geocoding inference and output.
//!
//! Only collaborator faults are errors. A product that follows no known
//! convention, a degenerate axis or a malformed vendor header all produce
//! `None` from the builders instead.

use thiserror::Error;

/// Failures reported by a metadata source while reading field data.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The requested variable does not exist.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// The variable holds fewer samples than requested.
    #[error("variable '{variable}' has {available} samples, {requested} requested")]
    ShortRead {
        variable: String,
        requested: usize,
        available: usize,
    },

    /// Backend-specific read failure.
    #[error("metadata backend error: {0}")]
    Backend(String),
}

/// Failures reported by a storage writer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Write addressed to a field that was never declared.
    #[error("field not declared: {0}")]
    UnknownField(String),

    /// Row index outside the declared field shape.
    #[error("row {row} out of range for field '{field}' with {rows} rows")]
    RowOutOfRange {
        field: String,
        row: usize,
        rows: usize,
    },

    /// Data length does not match the declared row length.
    #[error("field '{field}' expects {expected} values per row, got {actual}")]
    ShapeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A field with the same name has already been declared.
    #[error("field already declared: {0}")]
    DuplicateField(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific write failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors surfaced to callers of the geocoding API.
#[derive(Error, Debug)]
pub enum GeocodingError {
    /// A storage fault during declaration or row output, wrapped with its cause.
    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: StorageError,
    },

    /// The product already carries a geocoding.
    #[error("product already has a geocoding attached")]
    GeocodingAlreadyAttached,

    /// Raster extent disagrees with the geocoding being written.
    #[error("raster dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// A raster row index outside the raster.
    #[error("row {row} outside raster of height {height}")]
    RowOutOfRange { row: usize, height: usize },

    /// Configuration error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}

impl GeocodingError {
    /// Wrap a storage fault raised while writing coordinate rows.
    pub fn out_of_range(source: StorageError) -> Self {
        Self::Storage {
            message: "Data not in the expected range".to_string(),
            source,
        }
    }

    /// Wrap a storage fault raised while declaring output fields.
    pub fn declaration_failed(source: StorageError) -> Self {
        Self::Storage {
            message: "Failed to declare coordinate fields".to_string(),
            source,
        }
    }
}

/// Result type for geocoding operations.
pub type Result<T> = std::result::Result<T, GeocodingError>;
