//! Storage backend trait

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;

use crate::error::StorageError;

/// Type alias for a boxed stream of bytes
///
/// A stream is single-pass: it is consumed by value and cannot be restarted.
/// Dropping it releases whatever the backend holds open for it (file handle,
/// HTTP response body), so callers that stop reading early should drop it
/// rather than keep it around.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage backend trait
///
/// Every provider adapter implements this contract. Implementations must be
/// safe to call concurrently from many tasks without external locking, and
/// report failures as a `StorageError` which callers receive unchanged.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `key`, replacing any existing object
    async fn save(&self, key: &str, data: Bytes) -> Result<(), StorageError>;

    /// Read an object fully into memory
    async fn load_once(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Stream an object chunk by chunk
    async fn load_stream(&self, key: &str) -> Result<ByteStream, StorageError>;

    /// Copy an object to a path on the local filesystem
    async fn download(&self, key: &str, target: &Path) -> Result<(), StorageError>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Validate an object key and return its normalized segments
///
/// Keys are `/`-separated relative paths. Empty keys, absolute keys, empty
/// segments and `.`/`..` segments are rejected.
pub fn validate_key(key: &str) -> Result<Vec<&str>, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("empty key".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    let segments: Vec<&str> = key.split('/').collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_nested_paths() {
        assert_eq!(validate_key("a").unwrap(), vec!["a"]);
        assert_eq!(
            validate_key("upload_files/tenant/img.png").unwrap(),
            vec!["upload_files", "tenant", "img.png"]
        );
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        for key in ["", "/etc/passwd", "a/../b", "./a", "a//b", "a/", "a\\b"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
