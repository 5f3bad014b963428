//! Storage backend factory
//!
//! Maps a provider to a constructor for its backend. Resolving only captures
//! the provider's configuration section; clients are built when the
//! constructor is called.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

use crate::azure::build_azure_blob;
use crate::backend::StorageBackend;
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::gcs::build_google_storage;
use crate::local::LocalStorage;
use crate::opendal::build_opendal;
use crate::provider::ProviderType;
use crate::s3::{build_s3_compatible, build_supabase};

/// Zero-argument constructor for a storage backend
pub type BackendConstructor = Box<
    dyn FnOnce() -> BoxFuture<'static, Result<Arc<dyn StorageBackend>, StorageError>> + Send,
>;

fn erase<B: StorageBackend + 'static>(backend: B) -> Arc<dyn StorageBackend> {
    Arc::new(backend)
}

/// Get the constructor for `provider`, configured from `config`
pub fn resolve(provider: ProviderType, config: &StorageConfig) -> BackendConstructor {
    match provider {
        ProviderType::Local => {
            let path = config.local.path.clone();
            Box::new(move || async move { LocalStorage::new(path).await.map(erase) }.boxed())
        }
        ProviderType::OpenDal => {
            let cfg = config.opendal.clone();
            Box::new(move || async move { build_opendal(&cfg).await.map(erase) }.boxed())
        }
        ProviderType::AzureBlob => {
            let cfg = config.azure_blob.clone();
            Box::new(move || async move { build_azure_blob(&cfg).map(erase) }.boxed())
        }
        ProviderType::GoogleStorage => {
            let cfg = config.google_storage.clone();
            Box::new(move || async move { build_google_storage(&cfg).map(erase) }.boxed())
        }
        ProviderType::Supabase => {
            let cfg = config.supabase.clone();
            Box::new(move || async move { build_supabase(&cfg).map(erase) }.boxed())
        }
        ProviderType::S3
        | ProviderType::AliyunOss
        | ProviderType::TencentCos
        | ProviderType::OciStorage
        | ProviderType::HuaweiObs
        | ProviderType::BaiduObs
        | ProviderType::VolcengineTos => {
            let cfg = match provider {
                ProviderType::AliyunOss => config.aliyun_oss.clone(),
                ProviderType::TencentCos => config.tencent_cos.clone(),
                ProviderType::OciStorage => config.oci.clone(),
                ProviderType::HuaweiObs => config.huawei_obs.clone(),
                ProviderType::BaiduObs => config.baidu_obs.clone(),
                ProviderType::VolcengineTos => config.volcengine_tos.clone(),
                _ => config.s3.clone(),
            };
            Box::new(move || {
                async move { build_s3_compatible(provider, &cfg).map(erase) }.boxed()
            })
        }
    }
}

/// Parse a provider identifier and get its constructor
///
/// Fails with `UnsupportedBackendType` for identifiers outside the fixed set.
pub fn resolve_str(
    identifier: &str,
    config: &StorageConfig,
) -> Result<(ProviderType, BackendConstructor), StorageError> {
    let provider: ProviderType = identifier.parse()?;
    Ok((provider, resolve(provider, config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AzureBlobConfig, GoogleStorageConfig, OpenDalConfig, S3CompatibleConfig, SupabaseConfig,
    };
    use bytes::Bytes;

    fn s3_section(endpoint: &str) -> S3CompatibleConfig {
        S3CompatibleConfig {
            bucket: Some("bucket".to_string()),
            region: Some("region-1".to_string()),
            endpoint: Some(endpoint.to_string()),
            access_key: Some("AKID".to_string()),
            secret_key: Some("SECRET".to_string()),
            prefix: None,
            virtual_hosted_style: false,
            allow_http: false,
        }
    }

    /// A configuration that lets every provider build without network access
    fn full_config(root: &std::path::Path) -> StorageConfig {
        StorageConfig {
            backend: "local".to_string(),
            local: crate::config::LocalStorageConfig {
                path: root.join("local").to_string_lossy().to_string(),
            },
            s3: s3_section("https://s3.example.com"),
            aliyun_oss: s3_section("https://oss-cn-hangzhou.aliyuncs.com"),
            tencent_cos: s3_section("https://cos.ap-guangzhou.myqcloud.com"),
            huawei_obs: s3_section("https://obs.cn-north-4.myhuaweicloud.com"),
            baidu_obs: s3_section("https://s3.bj.bcebos.com"),
            volcengine_tos: s3_section("https://tos-s3-cn-beijing.volces.com"),
            oci: s3_section("https://ns.compat.objectstorage.us-ashburn-1.oraclecloud.com"),
            supabase: SupabaseConfig {
                url: Some("https://abcd.supabase.co".to_string()),
                bucket: Some("files".to_string()),
                region: None,
                access_key: Some("AKID".to_string()),
                secret_key: Some("SECRET".to_string()),
                prefix: None,
            },
            azure_blob: AzureBlobConfig {
                account_name: Some("devstore".to_string()),
                account_key: Some("c2VjcmV0LWtleQ==".to_string()),
                container: Some("files".to_string()),
                endpoint: None,
                prefix: None,
                allow_http: false,
            },
            google_storage: GoogleStorageConfig {
                bucket: Some("files".to_string()),
                service_account_path: None,
                prefix: None,
            },
            opendal: OpenDalConfig {
                scheme: "memory".to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_every_provider_constructs() {
        let dir = tempfile::tempdir().unwrap();
        let config = full_config(dir.path());

        for provider in ProviderType::ALL {
            let constructor = resolve(provider, &config);
            let backend = constructor().await;
            assert!(backend.is_ok(), "{} failed: {:?}", provider, backend.err());
        }
    }

    #[tokio::test]
    async fn test_resolve_does_not_construct() {
        let dir = tempfile::tempdir().unwrap();
        let config = full_config(dir.path());
        let local_root = dir.path().join("local");

        let (provider, constructor) = resolve_str("local", &config).unwrap();
        assert_eq!(provider, ProviderType::Local);
        assert!(!local_root.exists());

        let backend = constructor().await.unwrap();
        assert!(local_root.exists());

        backend.save("k", Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(&backend.load_once("k").await.unwrap()[..], b"v");
    }

    #[test]
    fn test_resolve_unknown_identifier() {
        let config = StorageConfig::default();
        for id in ["ftp", "minio", "S3-compatible", ""] {
            assert!(matches!(
                resolve_str(id, &config),
                Err(StorageError::UnsupportedBackendType(got)) if got == id
            ));
        }
    }

    #[tokio::test]
    async fn test_constructor_surfaces_configuration_errors() {
        let config = StorageConfig::default();
        let result = resolve(ProviderType::AzureBlob, &config)().await;
        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }
}
