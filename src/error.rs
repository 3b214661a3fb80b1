use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for a sync run.
///
/// `Config` and `DataIntegrity` are the two classes meant for alerting; the
/// rest are plumbing failures that still abort the run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing credentials or an invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The local dataset has missing blocks.
    #[error(
        "Missing blocks detected in existing data: height {after} is followed by {next} (largest gap {largest_gap})"
    )]
    DataIntegrity { after: u64, next: u64, largest_gap: u64 },

    #[error("Local dataset at {0} contains no records")]
    EmptyDataset(PathBuf),

    #[error("Invalid timestamp at height {height}: {reason}")]
    InvalidTimestamp { height: u64, reason: String },

    /// A columnar file does not carry the columns the sync needs.
    #[error("Schema error in {path}: {reason}")]
    Schema { path: PathBuf, reason: String },

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Failures of the columnar store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::Storage(StorageError::Io(e))
    }
}

impl From<parquet::errors::ParquetError> for SyncError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        SyncError::Storage(StorageError::Parquet(e))
    }
}

impl From<arrow::error::ArrowError> for SyncError {
    fn from(e: arrow::error::ArrowError) -> Self {
        SyncError::Storage(StorageError::Arrow(e))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Storage(StorageError::Json(e))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
