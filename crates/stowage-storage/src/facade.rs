//! Storage facade
//!
//! `Storage` is the one object application code talks to. It owns the
//! configured backend for the life of the process, records request metrics
//! for every call and logs failures. Errors are returned to the caller
//! exactly as the backend produced them.

use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::backend::{ByteStream, StorageBackend};
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::factory;
use crate::instrumented::InstrumentedBackend;
use crate::metrics::StorageMetrics;
use crate::provider::ProviderType;

/// Result of `Storage::load`
pub enum LoadedObject {
    /// The complete object content
    Buffered(Bytes),
    /// A single-pass chunk stream; drop it to release the backend's resources
    Streamed(ByteStream),
}

impl std::fmt::Debug for LoadedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadedObject::Buffered(data) => f.debug_tuple("Buffered").field(&data.len()).finish(),
            LoadedObject::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

/// Storage facade over the configured backend
pub struct Storage {
    provider: ProviderType,
    backend: InstrumentedBackend,
}

impl Storage {
    /// Build the backend selected by `config.backend`
    ///
    /// Fails with `UnsupportedBackendType` for an unknown identifier, or with
    /// the backend's own error if it cannot be constructed.
    pub async fn init(config: &StorageConfig) -> Result<Self, StorageError> {
        let (provider, constructor) = factory::resolve_str(&config.backend, config)?;
        let backend = constructor().await?;

        info!("Storage initialized with provider {}", provider);

        Ok(Self::with_backend(
            provider,
            backend,
            Arc::new(StorageMetrics::new(provider)),
        ))
    }

    /// Wrap an already constructed backend
    pub fn with_backend(
        provider: ProviderType,
        backend: Arc<dyn StorageBackend>,
        metrics: Arc<StorageMetrics>,
    ) -> Self {
        Self {
            provider,
            backend: InstrumentedBackend::new(backend, metrics),
        }
    }

    pub fn provider(&self) -> ProviderType {
        self.provider
    }

    pub fn metrics(&self) -> &Arc<StorageMetrics> {
        self.backend.metrics()
    }

    /// Store `data` under `key`
    pub async fn save(&self, key: &str, data: impl Into<Bytes>) -> Result<(), StorageError> {
        self.backend
            .save(key, data.into())
            .await
            .inspect_err(|e| error!(operation = "save", key, error = %e, "Failed to save file {}", key))
    }

    /// Load an object, buffered or as a stream
    ///
    /// Delegates to `load_once` or `load_stream`, which record the metrics.
    pub async fn load(&self, key: &str, stream: bool) -> Result<LoadedObject, StorageError> {
        if stream {
            self.load_stream(key).await.map(LoadedObject::Streamed)
        } else {
            self.load_once(key).await.map(LoadedObject::Buffered)
        }
    }

    /// Load an object fully into memory
    pub async fn load_once(&self, key: &str) -> Result<Bytes, StorageError> {
        self.backend.load_once(key).await.inspect_err(|e| {
            error!(operation = "load_once", key, error = %e, "Failed to load_once file {}", key)
        })
    }

    /// Open an object as a chunk stream
    ///
    /// The stream must be drained or dropped by the caller; a partially read
    /// stream keeps its file handle or connection open until then.
    pub async fn load_stream(&self, key: &str) -> Result<ByteStream, StorageError> {
        self.backend.load_stream(key).await.inspect_err(|e| {
            error!(operation = "load_stream", key, error = %e, "Failed to load_stream file {}", key)
        })
    }

    /// Copy an object to a local path
    pub async fn download(&self, key: &str, target: impl AsRef<Path>) -> Result<(), StorageError> {
        let target = target.as_ref();
        self.backend.download(key, target).await.inspect_err(|e| {
            error!(operation = "download", key, target = ?target, error = %e, "Failed to download file {}", key)
        })
    }

    /// Check whether an object exists
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.backend.exists(key).await.inspect_err(|e| {
            error!(operation = "exists", key, error = %e, "Failed to check file exists {}", key)
        })
    }

    /// Delete an object; deleting a missing object succeeds
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key).await.inspect_err(|e| {
            error!(operation = "delete", key, error = %e, "Failed to delete file {}", key)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Operation;
    use crate::object::ObjectStoreBackend;
    use async_trait::async_trait;
    use futures::{StreamExt, TryStreamExt};

    fn memory_storage() -> Storage {
        Storage::with_backend(
            ProviderType::OpenDal,
            Arc::new(ObjectStoreBackend::in_memory()),
            Arc::new(StorageMetrics::new(ProviderType::OpenDal)),
        )
    }

    /// Backend whose every call fails with a fixed error
    struct FailingBackend;

    fn denied() -> StorageError {
        StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "bucket policy denies access",
        ))
    }

    #[async_trait]
    impl StorageBackend for FailingBackend {
        async fn save(&self, _key: &str, _data: Bytes) -> Result<(), StorageError> {
            Err(denied())
        }
        async fn load_once(&self, _key: &str) -> Result<Bytes, StorageError> {
            Err(denied())
        }
        async fn load_stream(&self, _key: &str) -> Result<ByteStream, StorageError> {
            Err(denied())
        }
        async fn download(&self, _key: &str, _target: &Path) -> Result<(), StorageError> {
            Err(denied())
        }
        async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
            Err(denied())
        }
        async fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(denied())
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let storage = memory_storage();
        storage.save("greeting.txt", "hello world").await.unwrap();

        assert_eq!(&storage.load_once("greeting.txt").await.unwrap()[..], b"hello world");
        assert!(storage.exists("greeting.txt").await.unwrap());

        storage.delete("greeting.txt").await.unwrap();
        assert!(!storage.exists("greeting.txt").await.unwrap());
        storage.delete("greeting.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_stream_and_buffered_load_agree() {
        let storage = memory_storage();
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i * 7 % 256) as u8).collect();
        storage.save("blob", payload.clone()).await.unwrap();

        let buffered = match storage.load("blob", false).await.unwrap() {
            LoadedObject::Buffered(data) => data,
            other => panic!("expected buffered load, got {:?}", other),
        };
        let streamed = match storage.load("blob", true).await.unwrap() {
            LoadedObject::Streamed(stream) => {
                let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
                chunks.concat()
            }
            other => panic!("expected streamed load, got {:?}", other),
        };

        assert_eq!(&buffered[..], &payload[..]);
        assert_eq!(streamed, payload);
    }

    #[tokio::test]
    async fn test_load_counts_only_the_delegated_operation() {
        let storage = memory_storage();
        storage.save("k", "v").await.unwrap();

        storage.load("k", false).await.unwrap();
        let stream = storage.load("k", true).await.unwrap();
        drop(stream);

        let metrics = storage.metrics();
        assert_eq!(metrics.snapshot(Operation::LoadOnce).total, 1);
        assert_eq!(metrics.snapshot(Operation::LoadStream).total, 1);
    }

    #[tokio::test]
    async fn test_partial_stream_can_be_dropped() {
        let storage = memory_storage();
        storage.save("k", vec![1u8; 10_000]).await.unwrap();

        let mut stream = storage.load_stream("k").await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        drop(stream);

        assert_eq!(storage.load_once("k").await.unwrap().len(), 10_000);
    }

    #[tokio::test]
    async fn test_errors_pass_through_unchanged() {
        let storage = Storage::with_backend(
            ProviderType::S3,
            Arc::new(FailingBackend),
            Arc::new(StorageMetrics::new(ProviderType::S3)),
        );
        let dir = tempfile::tempdir().unwrap();
        let expected = denied().to_string();

        let errors = vec![
            storage.save("k", "v").await.unwrap_err(),
            storage.load_once("k").await.unwrap_err(),
            storage.load_stream("k").await.err().unwrap(),
            storage.download("k", dir.path().join("k")).await.unwrap_err(),
            storage.exists("k").await.unwrap_err(),
            storage.delete("k").await.unwrap_err(),
        ];

        for err in errors {
            assert_eq!(err.to_string(), expected);
            match err {
                StorageError::Io(io) => {
                    assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied)
                }
                other => panic!("error changed variant: {:?}", other),
            }
        }

        for op in Operation::ALL {
            let snap = storage.metrics().snapshot(op);
            assert_eq!((snap.total, snap.failed, snap.latency_count), (1, 1, 1), "{:?}", op);
        }
    }

    #[tokio::test]
    async fn test_success_does_not_count_failures() {
        let storage = memory_storage();
        storage.save("k", "v").await.unwrap();
        storage.exists("missing").await.unwrap();

        for op in [Operation::Save, Operation::Exists] {
            let snap = storage.metrics().snapshot(op);
            assert_eq!((snap.total, snap.failed, snap.latency_count), (1, 0, 1));
        }
    }

    #[tokio::test]
    async fn test_exported_series_carry_method_and_provider() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = ::metrics::set_default_local_recorder(&recorder);

        let storage = memory_storage();
        storage.save("k", "v").await.unwrap();
        assert!(matches!(
            storage.load_once("missing").await,
            Err(StorageError::NotFound(_))
        ));

        let rendered = handle.render();
        for line in [
            r#"storage_request_total{method="save",provider="opendal"} 1"#,
            r#"storage_request_total{method="load_once",provider="opendal"} 1"#,
            r#"storage_request_failed_total{method="load_once",provider="opendal"} 1"#,
            r#"storage_request_latency_seconds_count{method="save",provider="opendal"} 1"#,
            r#"storage_request_latency_seconds_count{method="load_once",provider="opendal"} 1"#,
        ] {
            assert!(rendered.contains(line), "missing `{}` in:\n{}", line, rendered);
        }
        assert!(!rendered.contains(r#"storage_request_failed_total{method="save""#));
    }

    #[tokio::test]
    async fn test_concurrent_callers_see_their_own_content() {
        let storage = Arc::new(memory_storage());
        let callers = 32;

        let handles: Vec<_> = (0..callers)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    let key = format!("tenant-{}/file.bin", i);
                    let body = format!("content for caller {}", i);
                    storage.save(&key, body.clone()).await.unwrap();
                    let loaded = storage.load_once(&key).await.unwrap();
                    assert_eq!(&loaded[..], body.as_bytes());
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let metrics = storage.metrics();
        let total: u64 = metrics.snapshot_all().iter().map(|s| s.total).sum();
        assert_eq!(total, 2 * callers as u64);
        assert_eq!(metrics.snapshot(Operation::Save).total, callers as u64);
        assert_eq!(metrics.snapshot(Operation::LoadOnce).failed, 0);
    }

    #[tokio::test]
    async fn test_init_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: "LOCAL".to_string(),
            local: crate::config::LocalStorageConfig {
                path: dir.path().to_string_lossy().to_string(),
            },
            ..Default::default()
        };

        let storage = Storage::init(&config).await.unwrap();
        assert_eq!(storage.provider(), ProviderType::Local);
        assert_eq!(storage.metrics().provider(), ProviderType::Local);

        storage.save("a/b", "c").await.unwrap();
        let target = dir.path().join("copy/b");
        storage.download("a/b", &target).await.unwrap();
        assert_eq!(std::fs::read(target).unwrap(), b"c");
    }

    #[tokio::test]
    async fn test_init_rejects_unknown_backend() {
        let config = StorageConfig {
            backend: "floppy-disk".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            Storage::init(&config).await,
            Err(StorageError::UnsupportedBackendType(id)) if id == "floppy-disk"
        ));
    }
}
