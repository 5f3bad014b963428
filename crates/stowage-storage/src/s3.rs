//! S3 and S3-compatible storage backends
//!
//! AWS S3, Aliyun OSS, Tencent COS, Huawei OBS, Baidu OBS, Volcengine TOS,
//! OCI Object Storage and Supabase all speak the S3 protocol, so they share
//! one builder and differ only in endpoint and addressing style.

use object_store::aws::AmazonS3Builder;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::config::{S3CompatibleConfig, SupabaseConfig};
use crate::error::StorageError;
use crate::object::ObjectStoreBackend;
use crate::provider::ProviderType;

const DEFAULT_REGION: &str = "us-east-1";

/// Build an S3 or S3-compatible storage backend
///
/// Every provider other than AWS S3 needs an explicit `endpoint`.
pub fn build_s3_compatible(
    provider: ProviderType,
    config: &S3CompatibleConfig,
) -> Result<ObjectStoreBackend, StorageError> {
    let bucket = config.bucket.as_deref().ok_or_else(|| {
        StorageError::Configuration(format!("{} requires a bucket", provider))
    })?;
    let region = config.region.as_deref().unwrap_or(DEFAULT_REGION);

    if provider != ProviderType::S3 && config.endpoint.is_none() {
        return Err(StorageError::Configuration(format!(
            "{} requires an endpoint",
            provider
        )));
    }

    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(bucket)
        .with_region(region)
        .with_virtual_hosted_style_request(config.virtual_hosted_style);

    // object_store expects virtual-hosted endpoints to already carry the bucket
    if let Some(endpoint) = &config.endpoint {
        let endpoint = if config.virtual_hosted_style {
            virtual_hosted_endpoint(endpoint, bucket)?
        } else {
            endpoint.clone()
        };
        builder = builder.with_endpoint(endpoint);
    }

    if let Some(access_key) = &config.access_key {
        builder = builder.with_access_key_id(access_key);
    }
    if let Some(secret_key) = &config.secret_key {
        builder = builder.with_secret_access_key(secret_key);
    }

    // Allow HTTP for local development (MinIO)
    if config.allow_http {
        builder = builder.with_allow_http(true);
    }

    let store = builder.build().map_err(|e| {
        StorageError::Configuration(format!("Failed to create {} client: {}", provider, e))
    })?;

    info!(
        "Initialized {} storage: bucket={}, region={}, endpoint={:?}, prefix={:?}",
        provider, bucket, region, config.endpoint, config.prefix
    );

    Ok(ObjectStoreBackend::new(
        Arc::new(store),
        config.prefix.clone(),
    ))
}

/// Build a Supabase storage backend through its S3-compatible endpoint
pub fn build_supabase(config: &SupabaseConfig) -> Result<ObjectStoreBackend, StorageError> {
    let url = config.url.as_deref().ok_or_else(|| {
        StorageError::Configuration("supabase requires a project url".to_string())
    })?;

    let s3_config = S3CompatibleConfig {
        bucket: config.bucket.clone(),
        region: config.region.clone(),
        endpoint: Some(format!("{}/storage/v1/s3", url.trim_end_matches('/'))),
        access_key: config.access_key.clone(),
        secret_key: config.secret_key.clone(),
        prefix: config.prefix.clone(),
        virtual_hosted_style: false,
        allow_http: url.starts_with("http://"),
    };

    build_s3_compatible(ProviderType::Supabase, &s3_config)
}

/// Prepend `bucket` to the endpoint host unless it is already there
fn virtual_hosted_endpoint(endpoint: &str, bucket: &str) -> Result<String, StorageError> {
    let mut url = Url::parse(endpoint).map_err(|e| {
        StorageError::Configuration(format!("Invalid endpoint {}: {}", endpoint, e))
    })?;

    let host = url
        .host_str()
        .ok_or_else(|| StorageError::Configuration(format!("Endpoint has no host: {}", endpoint)))?
        .to_string();

    if !host.starts_with(&format!("{}.", bucket)) {
        url.set_host(Some(&format!("{}.{}", bucket, host)))
            .map_err(|e| {
                StorageError::Configuration(format!("Invalid endpoint {}: {}", endpoint, e))
            })?;
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
