//! Scheme-addressed storage backend
//!
//! Selects a store by scheme at startup: `fs` (a directory), `memory`, or any
//! URL scheme `object_store` understands (`s3`, `gs`, `az`, `http`, ...)
//! with `root` as the bucket and path and `options` as builder settings.

use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::config::OpenDalConfig;
use crate::error::StorageError;
use crate::object::ObjectStoreBackend;

/// Build a scheme-addressed storage backend
pub async fn build_opendal(config: &OpenDalConfig) -> Result<ObjectStoreBackend, StorageError> {
    let scheme = config.scheme.trim().to_ascii_lowercase();

    let backend = match scheme.as_str() {
        "fs" => {
            if config.root.is_empty() {
                return Err(StorageError::Configuration(
                    "opendal scheme fs requires a root".to_string(),
                ));
            }
            tokio::fs::create_dir_all(&config.root).await?;
            let store = LocalFileSystem::new_with_prefix(&config.root).map_err(|e| {
                StorageError::Configuration(format!("Invalid fs root {}: {}", config.root, e))
            })?;
            ObjectStoreBackend::new(Arc::new(store), None)
        }
        "memory" => ObjectStoreBackend::new(Arc::new(InMemory::new()), None),
        _ => {
            let raw = format!("{}://{}", scheme, config.root.trim_start_matches('/'));
            let url = Url::parse(&raw).map_err(|e| {
                StorageError::Configuration(format!("Invalid opendal location {}: {}", raw, e))
            })?;
            let (store, path) =
                object_store::parse_url_opts(&url, config.options.iter()).map_err(|e| {
                    StorageError::Configuration(format!(
                        "Unsupported opendal scheme {}: {}",
                        scheme, e
                    ))
                })?;
            ObjectStoreBackend::new(Arc::from(store), Some(path.to_string()))
        }
    };

    info!(
        "Initialized opendal storage: scheme={}, root={}",
        scheme, config.root
    );

    Ok(backend)
}
