//! Cache hit/miss accounting

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Immutable snapshot of cache counters and sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Total number of lookups answered from the cache
    pub hits: u64,
    /// Total number of lookups that found nothing (or hit an invalid cache)
    pub misses: u64,
    /// Number of times the whole cache was invalidated
    pub invalidations: u64,
    /// Records currently cached
    pub entry_count: usize,
    /// Ids currently in the enabled set
    pub enabled_count: usize,
    /// Whether the cache was populated at snapshot time
    pub valid: bool,
}

impl CacheStats {
    /// Fraction of lookups that hit (0.0 to 1.0, 0.0 before any lookup)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// One-line summary for logs and the command line
    pub fn summary(&self) -> String {
        format!(
            "hits={} misses={} hit_rate={:.2}% invalidations={} entries={} enabled={} valid={}",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.invalidations,
            self.entry_count,
            self.enabled_count,
            self.valid
        )
    }
}

/// Thread-safe monotonically increasing counters
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup outcome, passing the hit flag through
    pub fn record(&self, hit: bool) -> bool {
        if hit {
            self.record_hit();
        } else {
            self.record_miss();
        }
        hit
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }
}

/// Operation timing helper
#[derive(Debug)]
pub struct OperationTimer {
    start_time: Instant,
}

impl OperationTimer {
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}
