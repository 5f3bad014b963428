//! Storage provider identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StorageError;

/// The fixed set of storage providers a process can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderType {
    S3,
    AzureBlob,
    Local,
    GoogleStorage,
    AliyunOss,
    TencentCos,
    OciStorage,
    HuaweiObs,
    BaiduObs,
    VolcengineTos,
    Supabase,
    /// Generic scheme-addressed store (filesystem, memory, or any URL scheme)
    OpenDal,
}

impl ProviderType {
    pub const ALL: [ProviderType; 12] = [
        ProviderType::S3,
        ProviderType::AzureBlob,
        ProviderType::Local,
        ProviderType::GoogleStorage,
        ProviderType::AliyunOss,
        ProviderType::TencentCos,
        ProviderType::OciStorage,
        ProviderType::HuaweiObs,
        ProviderType::BaiduObs,
        ProviderType::VolcengineTos,
        ProviderType::Supabase,
        ProviderType::OpenDal,
    ];

    /// Identifier used in configuration and as the `provider` metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::S3 => "s3",
            ProviderType::AzureBlob => "azure-blob",
            ProviderType::Local => "local",
            ProviderType::GoogleStorage => "google-storage",
            ProviderType::AliyunOss => "aliyun-oss",
            ProviderType::TencentCos => "tencent-cos",
            ProviderType::OciStorage => "oci-storage",
            ProviderType::HuaweiObs => "huawei-obs",
            ProviderType::BaiduObs => "baidu-obs",
            ProviderType::VolcengineTos => "volcengine-tos",
            ProviderType::Supabase => "supabase",
            ProviderType::OpenDal => "opendal",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ProviderType::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| StorageError::UnsupportedBackendType(s.to_string()))
    }
}

impl TryFrom<String> for ProviderType {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProviderType> for String {
    fn from(value: ProviderType) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_identifier() {
        for provider in ProviderType::ALL {
            assert_eq!(provider.as_str().parse::<ProviderType>().unwrap(), provider);
        }
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_underscores() {
        assert_eq!("AZURE_BLOB".parse::<ProviderType>().unwrap(), ProviderType::AzureBlob);
        assert_eq!(" Oci-Storage ".parse::<ProviderType>().unwrap(), ProviderType::OciStorage);
    }

    #[test]
    fn test_parse_unknown_identifier() {
        for id in ["", "ftp", "s4", "azure"] {
            match id.parse::<ProviderType>() {
                Err(StorageError::UnsupportedBackendType(got)) => assert_eq!(got, id),
                other => panic!("expected UnsupportedBackendType for {:?}, got {:?}", id, other),
            }
        }
    }

    #[test]
    fn test_identifiers_are_unique() {
        let mut ids: Vec<&str> = ProviderType::ALL.iter().map(|p| p.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ProviderType::ALL.len());
    }
}
