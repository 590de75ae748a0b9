use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Record store API usage metrics
#[derive(Debug, Default)]
pub struct StoreApiMetrics {
    pub total_requests: AtomicU64,
    pub rate_limit_waits: AtomicU64,
    pub errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
}

impl StoreApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit_wait(&self) {
        self.rate_limit_waits.fetch_add(1, Ordering::Relaxed);
        warn!("Client-side rate limit reached, waiting for quota");
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> StoreApiStats {
        StoreApiStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rate_limit_waits: self.rate_limit_waits.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            requests = stats.total_requests,
            rate_limit_waits = stats.rate_limit_waits,
            errors = stats.errors,
            cache_hits = stats.cache_hits,
            cache_misses = stats.cache_misses,
            "Record store API metrics"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreApiStats {
    pub total_requests: u64,
    pub rate_limit_waits: u64,
    pub errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// Global metrics instance
static STORE_METRICS: std::sync::LazyLock<StoreApiMetrics> =
    std::sync::LazyLock::new(StoreApiMetrics::new);

pub fn store_metrics() -> &'static StoreApiMetrics {
    &STORE_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
