//! Error types for storage operations

use std::error::Error;
use std::fmt;

/// Error type for storage operations
#[derive(Debug)]
pub enum StorageError {
    /// Backend could not be opened
    Connection(String),

    /// Data not found
    NotFound(String),

    /// Backend-specific error
    Backend(String),

    /// Serialization/deserialization error
    Serialization(String),

    /// A stored record does not match the key it was read from
    Corrupted(String),

    /// Backend not compiled into this build
    UnsupportedStorageType(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Connection(msg) => write!(f, "Connection error: {}", msg),
            StorageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StorageError::Backend(msg) => write!(f, "Backend error: {}", msg),
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Corrupted(msg) => write!(f, "Corrupted data: {}", msg),
            StorageError::UnsupportedStorageType(name) => {
                write!(f, "Unsupported storage type: {}", name)
            }
        }
    }
}

impl Error for StorageError {}

/// Convert a JSON error to a storage error
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Convert a standard IO error to a storage error
impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Connection(err.to_string())
    }
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for StorageError {
    fn from(err: rocksdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}
