//! Storage backend over any `object_store` implementation
//!
//! Cloud providers only differ in how their `ObjectStore` is built; reads,
//! writes and error mapping are shared here.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::backend::{ByteStream, StorageBackend, validate_key};
use crate::error::StorageError;

/// Storage backend delegating to an `ObjectStore`
///
/// Objects live at `<prefix>/<key>` inside the store.
#[derive(Debug)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ObjectStoreBackend {
    /// Wrap an existing store, optionally rooting every key under `prefix`
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<String>) -> Self {
        let prefix = prefix
            .map(|p| p.trim_matches('/').to_string())
            .unwrap_or_default();
        Self { store, prefix }
    }

    /// A process-local store that keeps everything in memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), None)
    }

    /// Key prefix applied to every object
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the object path for a key
    fn object_path(&self, key: &str) -> Result<ObjectPath, StorageError> {
        validate_key(key)?;

        let path = if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.prefix, key)
        };

        ObjectPath::parse(&path).map_err(|e| StorageError::InvalidKey(format!("{}: {}", key, e)))
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn save(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        debug!("Writing {} bytes to {}", data.len(), path);

        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map_err(|e| StorageError::from_object_store(key, e))?;

        Ok(())
    }

    async fn load_once(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.object_path(key)?;
        debug!("Reading object {}", path);

        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| StorageError::from_object_store(key, e))?;

        result
            .bytes()
            .await
            .map_err(|e| StorageError::from_object_store(key, e))
    }

    async fn load_stream(&self, key: &str) -> Result<ByteStream, StorageError> {
        let path = self.object_path(key)?;
        debug!("Streaming object {}", path);

        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| StorageError::from_object_store(key, e))?;

        let key = key.to_string();
        let stream = result
            .into_stream()
            .map_err(move |e| StorageError::from_object_store(&key, e));

        Ok(Box::pin(stream))
    }

    async fn download(&self, key: &str, target: &Path) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        debug!("Downloading object {} to {:?}", path, target);

        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| StorageError::from_object_store(key, e))?;

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = File::create(target).await?;
        let mut stream = result.into_stream();

        let copied: Result<(), StorageError> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| StorageError::from_object_store(key, e))?;
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if copied.is_err() {
            drop(file);
            if let Err(e) = fs::remove_file(target).await {
                warn!("Failed to remove partial download {:?}: {}", target, e);
            }
        }

        copied
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::from_object_store(key, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        debug!("Deleting object {}", path);

        match self.store.delete(&path).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::from_object_store(key, e)),
        }
    }
}
