//! Error types for NetCDF and CDL operations.

use geocoding::{MetadataError, StorageError};
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Command execution error (for ncdump)
    #[error("Command execution failed: {0}")]
    CommandError(String),
}

impl From<NetCdfError> for MetadataError {
    fn from(e: NetCdfError) -> Self {
        match e {
            NetCdfError::MissingData(name) => MetadataError::UnknownVariable(name),
            other => MetadataError::Backend(other.to_string()),
        }
    }
}

impl From<NetCdfError> for StorageError {
    fn from(e: NetCdfError) -> Self {
        match e {
            NetCdfError::IoError(io) => StorageError::Io(io),
            other => StorageError::Backend(other.to_string()),
        }
    }
}
