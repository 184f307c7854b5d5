//! In-memory record cache
//!
//! Serves the per-frame lookup path. Backed by concurrent maps and atomic
//! counters so render-thread reads never wait on an edit in progress.

pub mod metrics;
pub mod record_cache;

pub use metrics::{CacheMetrics, CacheStats, OperationTimer};
pub use record_cache::{CacheEntry, RecordCache};
