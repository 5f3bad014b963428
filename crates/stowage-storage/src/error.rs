//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unsupported storage type: {0}")]
    UnsupportedBackendType(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

impl StorageError {
    /// Map an `object_store` error for `key`, folding missing objects into `NotFound`
    pub(crate) fn from_object_store(key: &str, err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
            object_store::Error::InvalidPath { source } => {
                StorageError::InvalidKey(format!("{}: {}", key, source))
            }
            other => StorageError::ObjectStore(other),
        }
    }

    /// Map an `std::io::Error` for `key`, folding missing files into `NotFound`
    pub(crate) fn from_io(key: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::Io(err)
        }
    }
}
