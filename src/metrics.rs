//! Translation metrics and observability.
//!
//! Fire-and-forget work (cache persistence, discarded stale batches) has no
//! caller to report to, so its outcomes land here and in the log instead.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Counters for both translation paths.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// UI string served from the in-memory translated map
    ui_cache_hits: AtomicUsize,

    /// UI string that had to be queued for a batch
    ui_cache_misses: AtomicUsize,

    /// Batches submitted to the translation engine
    batches_sent: AtomicUsize,

    /// Batches that failed at the engine
    batch_failures: AtomicUsize,

    /// Batches discarded because the locale changed while they were in flight
    stale_batches_discarded: AtomicUsize,

    /// Keys merged into the translated map
    keys_translated: AtomicUsize,

    /// Document translations served from the remote cache store
    doc_cache_hits: AtomicUsize,

    /// Document translations that had to call the engine
    doc_cache_misses: AtomicUsize,

    /// Failed fire-and-forget writes to the remote cache store
    store_write_failures: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    /// A fresh, zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide metrics instance.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(TranslationMetrics::new)
    }

    pub fn record_ui_cache_hit(&self) {
        self.ui_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_cache_miss(&self) {
        self.ui_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_sent(&self) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_failure(&self) {
        self.batch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_batch_discarded(&self) {
        self.stale_batches_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_keys_translated(&self, count: usize) {
        self.keys_translated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_doc_cache_hit(&self) {
        self.doc_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_doc_cache_miss(&self) {
        self.doc_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_write_failure(&self) {
        self.store_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters into a serializable report.
    pub fn report(&self) -> MetricsReport {
        let ui_hits = self.ui_cache_hits.load(Ordering::Relaxed);
        let ui_misses = self.ui_cache_misses.load(Ordering::Relaxed);
        let doc_hits = self.doc_cache_hits.load(Ordering::Relaxed);
        let doc_misses = self.doc_cache_misses.load(Ordering::Relaxed);
        let batches = self.batches_sent.load(Ordering::Relaxed);
        let batch_failures = self.batch_failures.load(Ordering::Relaxed);

        MetricsReport {
            ui_cache_hits: ui_hits,
            ui_cache_misses: ui_misses,
            ui_cache_hit_rate: rate(ui_hits, ui_hits + ui_misses),
            batches_sent: batches,
            batch_failures,
            batch_success_rate: rate(batches.saturating_sub(batch_failures), batches),
            stale_batches_discarded: self.stale_batches_discarded.load(Ordering::Relaxed),
            keys_translated: self.keys_translated.load(Ordering::Relaxed),
            doc_cache_hits: doc_hits,
            doc_cache_misses: doc_misses,
            doc_cache_hit_rate: rate(doc_hits, doc_hits + doc_misses),
            store_write_failures: self.store_write_failures.load(Ordering::Relaxed),
        }
    }
}

fn rate(part: usize, total: usize) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Point-in-time translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub ui_cache_hits: usize,
    pub ui_cache_misses: usize,
    /// Percentage of UI lookups served without queueing (0-100)
    pub ui_cache_hit_rate: f64,
    pub batches_sent: usize,
    pub batch_failures: usize,
    /// Percentage of batches that merged successfully (0-100)
    pub batch_success_rate: f64,
    pub stale_batches_discarded: usize,
    pub keys_translated: usize,
    pub doc_cache_hits: usize,
    pub doc_cache_misses: usize,
    /// Percentage of document requests served from cache (0-100)
    pub doc_cache_hit_rate: f64,
    pub store_write_failures: usize,
}
