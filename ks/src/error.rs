//! KeyStore error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store at {0} is locked by another process")]
    Locked(PathBuf),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),
}

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
