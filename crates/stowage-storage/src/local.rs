//! Local disk storage backend

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::backend::{ByteStream, StorageBackend, validate_key};
use crate::error::StorageError;

/// Chunk size for streamed reads
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Local disk storage backend
///
/// Stores each object at `<base_path>/<key>`, creating intermediate
/// directories on write.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).await?;

        info!("Initialized local storage at {:?}", base_path);

        Ok(Self { base_path })
    }

    /// Get the file path for a key
    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let segments = validate_key(key)?;
        Ok(segments
            .into_iter()
            .fold(self.base_path.clone(), |path, segment| path.join(segment)))
    }

    /// Temp file next to `path`, so the final rename stays on one filesystem
    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        debug!("Writing {} bytes to {:?}", data.len(), path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically using a temp file
        let temp_path = Self::temp_path(&path);
        if let Err(e) = fs::write(&temp_path, &data).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!("Failed to remove temp file {:?}: {}", temp_path, cleanup);
            }
            return Err(StorageError::Io(e));
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!("Failed to remove temp file {:?}: {}", temp_path, cleanup);
            }
            return Err(StorageError::Io(e));
        }

        Ok(())
    }

    async fn load_once(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.object_path(key)?;
        debug!("Reading object from {:?}", path);

        let data = fs::read(&path)
            .await
            .map_err(|e| StorageError::from_io(key, e))?;

        Ok(Bytes::from(data))
    }

    async fn load_stream(&self, key: &str) -> Result<ByteStream, StorageError> {
        let path = self.object_path(key)?;
        debug!("Streaming object from {:?}", path);

        let file = File::open(&path)
            .await
            .map_err(|e| StorageError::from_io(key, e))?;

        let stream = tokio_util::io::ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE);

        Ok(Box::pin(stream.map(|result| result.map_err(StorageError::Io))))
    }

    async fn download(&self, key: &str, target: &Path) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        debug!("Copying object {:?} to {:?}", path, target);

        let mut source = File::open(&path)
            .await
            .map_err(|e| StorageError::from_io(key, e))?;

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut dest = File::create(target).await?;
        let copied: Result<(), StorageError> = async {
            tokio::io::copy(&mut source, &mut dest).await?;
            dest.flush().await?;
            Ok(())
        }
        .await;

        if copied.is_err() {
            drop(dest);
            if let Err(e) = fs::remove_file(target).await {
                warn!("Failed to remove partial download {:?}: {}", target, e);
            }
        }

        copied
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        debug!("Deleting object at {:?}", path);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
