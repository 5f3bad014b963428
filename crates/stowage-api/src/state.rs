//! Application state

use std::sync::Arc;
use stowage_storage::Storage;

/// Prometheus render handle
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Deployment information reported in responses
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub version: String,
    pub env: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub info: Arc<AppInfo>,
}

impl AppState {
    pub fn new(storage: Arc<Storage>, info: AppInfo) -> Self {
        Self {
            storage,
            info: Arc::new(info),
        }
    }
}
