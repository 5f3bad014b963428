//! Azure Blob Storage backend

use object_store::azure::MicrosoftAzureBuilder;
use std::sync::Arc;
use tracing::info;

use crate::config::AzureBlobConfig;
use crate::error::StorageError;
use crate::object::ObjectStoreBackend;

/// Build an Azure Blob Storage backend
///
/// Uses the account key when configured and falls back to managed identity.
pub fn build_azure_blob(config: &AzureBlobConfig) -> Result<ObjectStoreBackend, StorageError> {
    let account = config.account_name.as_deref().ok_or_else(|| {
        StorageError::Configuration("azure-blob requires an account_name".to_string())
    })?;
    let container = config.container.as_deref().ok_or_else(|| {
        StorageError::Configuration("azure-blob requires a container".to_string())
    })?;

    let mut builder = MicrosoftAzureBuilder::new()
        .with_account(account)
        .with_container_name(container)
        .with_allow_http(config.allow_http);

    if let Some(key) = &config.account_key {
        builder = builder.with_access_key(key);
    }
    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint.clone());
    }

    let store = builder.build().map_err(|e| {
        StorageError::Configuration(format!("Failed to create azure-blob client: {}", e))
    })?;

    info!(
        "Initialized azure-blob storage: account={}, container={}, prefix={:?}",
        account, container, config.prefix
    );

    Ok(ObjectStoreBackend::new(Arc::new(store), config.prefix.clone()))
}
