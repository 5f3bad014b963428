//! Google Cloud Storage backend

use object_store::gcp::GoogleCloudStorageBuilder;
use std::sync::Arc;
use tracing::info;

use crate::config::GoogleStorageConfig;
use crate::error::StorageError;
use crate::object::ObjectStoreBackend;

/// Build a Google Cloud Storage backend
pub fn build_google_storage(
    config: &GoogleStorageConfig,
) -> Result<ObjectStoreBackend, StorageError> {
    let bucket = config.bucket.as_deref().ok_or_else(|| {
        StorageError::Configuration("google-storage requires a bucket".to_string())
    })?;

    let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(bucket);
    if let Some(path) = &config.service_account_path {
        builder = builder.with_service_account_path(path);
    }

    let store = builder.build().map_err(|e| {
        StorageError::Configuration(format!("Failed to create google-storage client: {}", e))
    })?;

    info!(
        "Initialized google-storage: bucket={}, prefix={:?}",
        bucket, config.prefix
    );

    Ok(ObjectStoreBackend::new(Arc::new(store), config.prefix.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_bucket() {
        assert!(matches!(
            build_google_storage(&GoogleStorageConfig::default()),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_service_account_file() {
        let config = GoogleStorageConfig {
            bucket: Some("files".to_string()),
            service_account_path: Some("/nonexistent/service-account.json".to_string()),
            prefix: None,
        };
        assert!(matches!(
            build_google_storage(&config),
            Err(StorageError::Configuration(_))
        ));
    }
}
