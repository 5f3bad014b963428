//! Storage request metrics
//!
//! Every storage operation records:
//! - `storage_request_total` (counter)
//! - `storage_request_failed_total` (counter)
//! - `storage_request_latency_seconds` (histogram)
//!
//! each labeled by `method` and `provider`. Values go to the global `metrics`
//! recorder and to the in-process `StorageMetrics` collector, which can be
//! read back without an exporter.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::StorageError;
use crate::provider::ProviderType;

pub const REQUEST_TOTAL: &str = "storage_request_total";
pub const REQUEST_FAILED: &str = "storage_request_failed_total";
pub const REQUEST_LATENCY: &str = "storage_request_latency_seconds";

/// Storage operations, used as the `method` label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Save,
    LoadOnce,
    LoadStream,
    Download,
    Exists,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Save,
        Operation::LoadOnce,
        Operation::LoadStream,
        Operation::Download,
        Operation::Exists,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Save => "save",
            Operation::LoadOnce => "load_once",
            Operation::LoadStream => "load_stream",
            Operation::Download => "download",
            Operation::Exists => "exists",
            Operation::Delete => "delete",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Register descriptions for the storage metrics with the installed recorder
pub fn describe_metrics() {
    describe_counter!(REQUEST_TOTAL, "The total count of storage requests");
    describe_counter!(REQUEST_FAILED, "The failed count of storage requests");
    describe_histogram!(
        REQUEST_LATENCY,
        Unit::Seconds,
        "The latency of storage requests"
    );
}

#[derive(Debug, Default)]
struct OperationStats {
    total: AtomicU64,
    failed: AtomicU64,
    latency_count: AtomicU64,
    latency_sum_us: AtomicU64,
}

/// Point-in-time view of one operation's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationSnapshot {
    pub operation: Operation,
    pub total: u64,
    pub failed: u64,
    pub latency_count: u64,
    pub latency_sum_us: u64,
}

impl OperationSnapshot {
    pub fn latency_sum(&self) -> Duration {
        Duration::from_micros(self.latency_sum_us)
    }
}

/// Metrics collector for one storage provider
#[derive(Debug)]
pub struct StorageMetrics {
    provider: ProviderType,
    stats: [OperationStats; 6],
}

impl StorageMetrics {
    pub fn new(provider: ProviderType) -> Self {
        Self {
            provider,
            stats: Default::default(),
        }
    }

    pub fn provider(&self) -> ProviderType {
        self.provider
    }

    /// Count a request and start its latency timer
    ///
    /// The latency is recorded when the returned guard is dropped.
    pub fn start(&self, operation: Operation) -> RequestTimer<'_> {
        self.stats[operation.index()]
            .total
            .fetch_add(1, Ordering::Relaxed);
        counter!(
            REQUEST_TOTAL,
            "method" => operation.as_str(),
            "provider" => self.provider.as_str()
        )
        .increment(1);

        RequestTimer {
            metrics: self,
            operation,
            started: Instant::now(),
        }
    }

    /// Count a failed request
    pub fn record_failure(&self, operation: Operation) {
        self.stats[operation.index()]
            .failed
            .fetch_add(1, Ordering::Relaxed);
        counter!(
            REQUEST_FAILED,
            "method" => operation.as_str(),
            "provider" => self.provider.as_str()
        )
        .increment(1);
    }

    fn record_latency(&self, operation: Operation, elapsed: Duration) {
        let stats = &self.stats[operation.index()];
        stats.latency_count.fetch_add(1, Ordering::Relaxed);
        stats
            .latency_sum_us
            .fetch_add(
                u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                Ordering::Relaxed,
            );
        histogram!(
            REQUEST_LATENCY,
            "method" => operation.as_str(),
            "provider" => self.provider.as_str()
        )
        .record(elapsed.as_secs_f64());
    }

    /// Run `fut` as one instrumented request
    pub async fn observe<T, F>(&self, operation: Operation, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        let _timer = self.start(operation);
        let result = fut.await;
        if result.is_err() {
            self.record_failure(operation);
        }
        result
    }

    pub fn snapshot(&self, operation: Operation) -> OperationSnapshot {
        let stats = &self.stats[operation.index()];
        OperationSnapshot {
            operation,
            total: stats.total.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
            latency_count: stats.latency_count.load(Ordering::Relaxed),
            latency_sum_us: stats.latency_sum_us.load(Ordering::Relaxed),
        }
    }

    pub fn snapshot_all(&self) -> Vec<OperationSnapshot> {
        Operation::ALL.iter().map(|op| self.snapshot(*op)).collect()
    }
}

/// Latency guard returned by `StorageMetrics::start`
///
/// Records exactly one latency observation when dropped, whether the request
/// succeeded, failed or was cancelled.
#[must_use = "latency is recorded when the timer is dropped"]
pub struct RequestTimer<'a> {
    metrics: &'a StorageMetrics,
    operation: Operation,
    started: Instant,
}

impl Drop for RequestTimer<'_> {
    fn drop(&mut self) {
        self.metrics
            .record_latency(self.operation, self.started.elapsed());
    }
}
