//! Metrics-recording storage backend wrapper

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;

use crate::backend::{ByteStream, StorageBackend};
use crate::error::StorageError;
use crate::metrics::{Operation, StorageMetrics};

/// Storage backend that records request metrics around an inner backend
///
/// Errors from the inner backend are returned as-is.
pub struct InstrumentedBackend {
    inner: Arc<dyn StorageBackend>,
    metrics: Arc<StorageMetrics>,
}

impl InstrumentedBackend {
    pub fn new(inner: Arc<dyn StorageBackend>, metrics: Arc<StorageMetrics>) -> Self {
        Self { inner, metrics }
    }

    pub fn metrics(&self) -> &Arc<StorageMetrics> {
        &self.metrics
    }
}

#[async_trait]
impl StorageBackend for InstrumentedBackend {
    async fn save(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.metrics
            .observe(Operation::Save, self.inner.save(key, data))
            .await
    }

    async fn load_once(&self, key: &str) -> Result<Bytes, StorageError> {
        self.metrics
            .observe(Operation::LoadOnce, self.inner.load_once(key))
            .await
    }

    /// Only opening the stream is timed; reading it is up to the caller
    async fn load_stream(&self, key: &str) -> Result<ByteStream, StorageError> {
        self.metrics
            .observe(Operation::LoadStream, self.inner.load_stream(key))
            .await
    }

    async fn download(&self, key: &str, target: &Path) -> Result<(), StorageError> {
        self.metrics
            .observe(Operation::Download, self.inner.download(key, target))
            .await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.metrics
            .observe(Operation::Exists, self.inner.exists(key))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.metrics
            .observe(Operation::Delete, self.inner.delete(key))
            .await
    }
}
