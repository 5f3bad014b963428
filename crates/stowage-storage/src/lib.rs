//! Stowage Storage Layer
//!
//! This crate provides a single storage facade over interchangeable
//! providers: local disk, AWS S3 and S3-compatible clouds, Azure Blob,
//! Google Cloud Storage and scheme-addressed stores. Every call through the
//! facade is counted and timed per operation and provider.

pub mod azure;
pub mod backend;
pub mod config;
pub mod error;
pub mod facade;
pub mod factory;
pub mod gcs;
pub mod instrumented;
pub mod local;
pub mod metrics;
pub mod object;
pub mod opendal;
pub mod provider;
pub mod s3;

pub use backend::{ByteStream, StorageBackend};
pub use config::StorageConfig;
pub use error::StorageError;
pub use facade::{LoadedObject, Storage};
pub use factory::{BackendConstructor, resolve, resolve_str};
pub use instrumented::InstrumentedBackend;
pub use local::LocalStorage;
pub use metrics::{Operation, OperationSnapshot, StorageMetrics};
pub use object::ObjectStoreBackend;
pub use provider::ProviderType;
