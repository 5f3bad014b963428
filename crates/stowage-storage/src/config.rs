//! Storage configuration
//!
//! One section per provider family. Only the section matching `backend` is
//! read when the backend is constructed; the rest keep their defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Provider identifier, e.g. "local", "s3", "azure-blob"
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub local: LocalStorageConfig,
    #[serde(default)]
    pub s3: S3CompatibleConfig,
    #[serde(default)]
    pub aliyun_oss: S3CompatibleConfig,
    #[serde(default)]
    pub tencent_cos: S3CompatibleConfig,
    #[serde(default)]
    pub huawei_obs: S3CompatibleConfig,
    #[serde(default)]
    pub baidu_obs: S3CompatibleConfig,
    #[serde(default)]
    pub volcengine_tos: S3CompatibleConfig,
    #[serde(default)]
    pub oci: S3CompatibleConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub azure_blob: AzureBlobConfig,
    #[serde(default)]
    pub google_storage: GoogleStorageConfig,
    #[serde(default)]
    pub opendal: OpenDalConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local: LocalStorageConfig::default(),
            s3: S3CompatibleConfig::default(),
            aliyun_oss: S3CompatibleConfig::default(),
            tencent_cos: S3CompatibleConfig::default(),
            huawei_obs: S3CompatibleConfig::default(),
            baidu_obs: S3CompatibleConfig::default(),
            volcengine_tos: S3CompatibleConfig::default(),
            oci: S3CompatibleConfig::default(),
            supabase: SupabaseConfig::default(),
            azure_blob: AzureBlobConfig::default(),
            google_storage: GoogleStorageConfig::default(),
            opendal: OpenDalConfig::default(),
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    #[serde(default = "default_local_path")]
    pub path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            path: default_local_path(),
        }
    }
}

/// Configuration shared by S3 and the S3-compatible providers
/// (Aliyun OSS, Tencent COS, Huawei OBS, Baidu OBS, Volcengine TOS, OCI)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct S3CompatibleConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Service endpoint URL; required by every S3-compatible provider except AWS
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Prefix for all objects
    pub prefix: Option<String>,
    /// Address buckets as `<bucket>.<endpoint>` instead of `<endpoint>/<bucket>`
    #[serde(default)]
    pub virtual_hosted_style: bool,
    #[serde(default)]
    pub allow_http: bool,
}

/// Supabase storage configuration
///
/// Supabase exposes an S3-compatible endpoint at `<url>/storage/v1/s3`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub prefix: Option<String>,
}

/// Azure Blob Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AzureBlobConfig {
    pub account_name: Option<String>,
    /// Base64 account key; managed identity is used when absent
    pub account_key: Option<String>,
    pub container: Option<String>,
    /// Custom endpoint, e.g. for sovereign clouds or Azurite
    pub endpoint: Option<String>,
    pub prefix: Option<String>,
    #[serde(default)]
    pub allow_http: bool,
}

/// Google Cloud Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoogleStorageConfig {
    pub bucket: Option<String>,
    /// Path to a service account JSON key; application default credentials otherwise
    pub service_account_path: Option<String>,
    pub prefix: Option<String>,
}

/// Generic scheme-addressed storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDalConfig {
    /// `fs`, `memory`, or a URL scheme such as `s3`, `gs`, `az`, `http`
    #[serde(default = "default_opendal_scheme")]
    pub scheme: String,
    /// Root directory for `fs`, bucket/container (and optional path) otherwise
    #[serde(default)]
    pub root: String,
    /// Free-form options passed to the underlying store builder
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl Default for OpenDalConfig {
    fn default() -> Self {
        Self {
            scheme: default_opendal_scheme(),
            root: String::new(),
            options: HashMap::new(),
        }
    }
}

fn default_backend() -> String {
    "local".to_string()
}

fn default_local_path() -> String {
    "./data/storage".to_string()
}

fn default_opendal_scheme() -> String {
    "fs".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_local() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, "local");
        assert_eq!(config.local.path, "./data/storage");
        assert_eq!(config.opendal.scheme, "fs");
    }
}
