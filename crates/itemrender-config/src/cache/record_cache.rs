//! Concurrent in-memory record cache

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use super::metrics::{CacheMetrics, CacheStats};
use crate::types::ConfigRecord;

/// A cached record; presence means "loaded", not "valid"
#[derive(Debug, Clone)]
pub struct CacheEntry {
    record: ConfigRecord,
}

impl CacheEntry {
    pub fn new(record: ConfigRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }
}

/// Id to record map plus the enabled-id set
///
/// Reads and writes may come from different threads at any time. Validity
/// is tracked for the whole cache: after [`invalidate`](Self::invalidate)
/// every lookup is a miss until the owner repopulates and calls
/// [`mark_valid`](Self::mark_valid).
///
/// Each invalidation also bumps an epoch. Readers compare epochs around a
/// read to detect an invalidation that ran underneath them, and lookup-path
/// fills carry the epoch their load started in so a load that straddles an
/// invalidation is dropped.
#[derive(Debug)]
pub struct RecordCache {
    records: DashMap<String, CacheEntry>,
    enabled: DashSet<String>,
    valid: AtomicBool,
    epoch: AtomicU64,
    metrics: CacheMetrics,
}

impl RecordCache {
    /// Create an empty, valid cache
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            enabled: DashSet::new(),
            valid: AtomicBool::new(true),
            epoch: AtomicU64::new(0),
            metrics: CacheMetrics::new(),
        }
    }

    /// Look up a record, counting a hit or a miss
    pub fn get(&self, id: &str) -> Option<ConfigRecord> {
        if !self.is_valid() {
            self.metrics.record_miss();
            return None;
        }

        let record = self.records.get(id).map(|entry| entry.record().clone());
        self.metrics.record(record.is_some());
        record
    }

    /// Cached record without touching the counters; `None` while invalid
    pub fn peek(&self, id: &str) -> Option<ConfigRecord> {
        if !self.is_valid() {
            return None;
        }
        self.records.get(id).map(|entry| entry.record().clone())
    }

    /// Whether an id is in the enabled set, counting a hit or a miss
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled_state(id).unwrap_or(false)
    }

    /// Enabled-set answer, `None` while invalid or when an invalidation
    /// ran during the read
    pub fn enabled_state(&self, id: &str) -> Option<bool> {
        let epoch = self.epoch();
        if !self.is_valid() {
            self.metrics.record_miss();
            return None;
        }

        let enabled = self.enabled.contains(id);
        if self.epoch() != epoch {
            self.metrics.record_miss();
            return None;
        }
        self.metrics.record(enabled);
        Some(enabled)
    }

    /// Copy of the enabled set, empty while invalid
    pub fn enabled_ids(&self) -> HashSet<String> {
        self.enabled_snapshot().unwrap_or_default()
    }

    /// Copy of the enabled set, `None` while invalid or when an
    /// invalidation ran during the copy
    pub fn enabled_snapshot(&self) -> Option<HashSet<String>> {
        let epoch = self.epoch();
        if !self.is_valid() {
            return None;
        }

        let ids = self.enabled.iter().map(|id| id.key().clone()).collect();
        (self.epoch() == epoch).then_some(ids)
    }

    /// Insert or replace a record regardless of validity
    pub fn put(&self, id: &str, record: ConfigRecord) {
        self.records.insert(id.to_string(), CacheEntry::new(record));
    }

    /// Insert a record loaded during `epoch` unless one is already cached
    ///
    /// Returns the cached record, or `record` itself when it was dropped
    /// because an invalidation happened since `epoch`. A slow load can
    /// therefore neither overwrite a record a concurrent save has put nor
    /// survive into the next reload.
    pub fn put_if_absent(&self, id: &str, record: ConfigRecord, epoch: u64) -> ConfigRecord {
        match self.records.entry(id.to_string()) {
            Entry::Occupied(entry) => entry.get().record().clone(),
            // The shard lock is held here, so a concurrent clear cannot
            // slip in between the epoch check and the insert
            Entry::Vacant(entry) if self.epoch() == epoch => {
                entry.insert(CacheEntry::new(record)).record().clone()
            }
            Entry::Vacant(_) => record,
        }
    }

    /// Add or remove an id from the enabled set regardless of validity
    pub fn put_enabled(&self, id: &str, enabled: bool) {
        if enabled {
            self.enabled.insert(id.to_string());
        } else {
            self.enabled.remove(id);
        }
    }

    /// Drop an id from both the record map and the enabled set
    pub fn remove(&self, id: &str) {
        self.records.remove(id);
        self.enabled.remove(id);
    }

    /// Clear everything and force misses until marked valid again
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.records.clear();
        self.enabled.clear();
        self.metrics.record_invalidation();
    }

    /// Declare the cache populated again
    pub fn mark_valid(&self) {
        self.valid.store(true, Ordering::SeqCst);
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    /// Number of invalidations so far; pass to [`put_if_absent`](Self::put_if_absent)
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Whether a record is held, without touching the counters
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.metrics.hits(),
            misses: self.metrics.misses(),
            invalidations: self.metrics.invalidations(),
            entry_count: self.records.len(),
            enabled_count: self.enabled.len(),
            valid: self.is_valid(),
        }
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new()
    }
}
