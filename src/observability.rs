//! Observability stubs (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording lifecycle counters
#[derive(Debug, Default)]
pub struct Metrics {
    downloads_started: AtomicU64,
    downloads_completed: AtomicU64,
    downloads_failed: AtomicU64,
    downloads_cancelled: AtomicU64,
    downloads_paused: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn download_started(&self) {
        self.downloads_started.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_started", "Metric incremented");
    }

    pub fn download_completed(&self) {
        self.downloads_completed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_completed", "Metric incremented");
    }

    pub fn download_failed(&self) {
        self.downloads_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_failed", "Metric incremented");
    }

    pub fn download_cancelled(&self) {
        self.downloads_cancelled.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_cancelled", "Metric incremented");
    }

    pub fn download_paused(&self) {
        self.downloads_paused.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_paused", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            downloads_started: self.downloads_started.load(Ordering::Relaxed),
            downloads_completed: self.downloads_completed.load(Ordering::Relaxed),
            downloads_failed: self.downloads_failed.load(Ordering::Relaxed),
            downloads_cancelled: self.downloads_cancelled.load(Ordering::Relaxed),
            downloads_paused: self.downloads_paused.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub downloads_started: u64,
    pub downloads_completed: u64,
    pub downloads_failed: u64,
    pub downloads_cancelled: u64,
    pub downloads_paused: u64,
}
