//! Configuration manager
//!
//! Composes the store, validator and cache behind the API every other
//! part of the program uses. Two kinds of callers share one manager:
//!
//! - the render path, which calls [`ConfigManager::get_record`],
//!   [`ConfigManager::is_enabled`] and [`ConfigManager::enabled_ids`] every
//!   frame. These never fail; problems are logged and replaced by factory
//!   defaults.
//! - the edit path (editor, commands), which calls the mutating operations.
//!   These return errors so the caller can report them.
//!
//! Writes update the cache before returning, so a lookup issued after a
//! save always observes the saved value.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, OperationTimer, RecordCache};
use crate::error::{ConfigError, ConfigResult};
use crate::factory::Factory;
use crate::paths::PathResolver;
use crate::restriction::AllowList;
use crate::store::ConfigStore;
use crate::types::{AggregateConfig, ConfigRecord, LogCategory, LogConfig, Settings};
use crate::validation::Validator;

/// Construction options for a [`ConfigManager`]
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Configuration root directory
    pub root: PathBuf,
    /// Warm the record cache for every enabled id on (re)load
    pub preload_enabled_records: bool,
}

impl ManagerOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            preload_enabled_records: true,
        }
    }

    /// Options rooted at the resolved default configuration directory
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self::new(PathResolver::resolve_root()?))
    }

    pub fn preload_enabled_records(mut self, preload: bool) -> Self {
        self.preload_enabled_records = preload;
        self
    }
}

/// Process-wide configuration manager
pub struct ConfigManager {
    store: ConfigStore,
    validator: Validator,
    cache: RecordCache,
    aggregate: RwLock<AggregateConfig>,
    allow_list: RwLock<AllowList>,
    /// Serialises the edit path; never taken by lookups
    edit_lock: Mutex<()>,
    preload: bool,
}

impl ConfigManager {
    /// Create a manager and eagerly load the aggregate and allow-list
    ///
    /// Load problems are logged and leave defaults in place; the manager is
    /// always usable afterwards.
    pub fn new(options: ManagerOptions) -> Self {
        let manager = Self {
            store: ConfigStore::new(options.root),
            validator: Validator::new(),
            cache: RecordCache::new(),
            aggregate: RwLock::new(Factory::default_aggregate()),
            allow_list: RwLock::new(Factory::default_allow_list()),
            edit_lock: Mutex::new(()),
            preload: options.preload_enabled_records,
        };

        if let Err(e) = manager.invalidate_and_reload() {
            error!(
                root = %manager.store.root().display(),
                error = %e,
                "Initial configuration load failed; continuing with defaults"
            );
        }

        manager
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    // ===== Lookup path =====

    /// Record for an id; never fails
    ///
    /// Cache hit returns immediately. On a miss the record is loaded
    /// (default-and-persist when absent), validated and cached. Invalid or
    /// unreadable records are replaced by the factory default.
    pub fn get_record(&self, id: &str) -> ConfigRecord {
        if id.trim().is_empty() {
            warn!("Lookup with empty id; returning default record");
            return Factory::default_record(id);
        }

        if let Some(record) = self.cache.get(id) {
            return record;
        }

        let epoch = self.cache.epoch();
        let record = match self.load_validated(id) {
            Ok(record) => record,
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to load record; using default");
                Factory::default_record(id)
            }
        };

        self.cache.put_if_absent(id, record, epoch)
    }

    /// Whether an id is in the enabled set; never fails
    ///
    /// Falls back to the aggregate snapshot while a reload is repopulating
    /// the cache.
    pub fn is_enabled(&self, id: &str) -> bool {
        match self.cache.enabled_state(id) {
            Some(enabled) => enabled,
            None => self.aggregate.read().is_enabled(id),
        }
    }

    /// Copy of the enabled-id set
    pub fn enabled_ids(&self) -> HashSet<String> {
        match self.cache.enabled_snapshot() {
            Some(ids) => ids,
            None => self.aggregate.read().enabled_items.iter().cloned().collect(),
        }
    }

    /// Whether the allow-list permits an id
    pub fn is_allowed(&self, id: &str) -> bool {
        self.allow_list.read().is_allowed(id)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn aggregate(&self) -> AggregateConfig {
        self.aggregate.read().clone()
    }

    pub fn log_config(&self) -> LogConfig {
        self.aggregate.read().log_config
    }

    pub fn allow_list(&self) -> AllowList {
        self.allow_list.read().clone()
    }

    pub fn list_available(&self) -> HashSet<String> {
        self.store.list_available()
    }

    pub fn is_writable(&self) -> bool {
        self.store.is_writable()
    }

    /// Whether `path` still holds what this manager last wrote there
    pub fn is_own_write(&self, path: &Path) -> bool {
        self.store.is_own_write(path)
    }

    // ===== Edit path =====

    /// Load a record for editing, propagating load failures
    pub fn load_record_for_edit(&self, id: &str) -> ConfigResult<ConfigRecord> {
        self.store.load_record(id)
    }

    /// Validate, persist and cache a record
    pub fn save_record(&self, id: &str, record: ConfigRecord) -> ConfigResult<()> {
        let _guard = self.edit_lock.lock();
        self.persist_record(id, record)
    }

    /// Apply an update to the current record and save it
    pub fn mutate<F>(&self, id: &str, updater: F) -> ConfigResult<ConfigRecord>
    where
        F: FnOnce(&mut ConfigRecord),
    {
        let _guard = self.edit_lock.lock();

        let mut record = match self.cache.peek(id) {
            Some(record) => record,
            None => self.store.load_record(id)?,
        };
        record.id = id.to_string();
        updater(&mut record);

        self.persist_record(id, record.clone())?;
        Ok(record)
    }

    /// Enable or disable an id, keeping record and aggregate in step
    pub fn set_enabled(&self, id: &str, enabled: bool) -> ConfigResult<ConfigRecord> {
        self.mutate(id, |record| record.enabled = enabled)
    }

    /// Delete a record file and forget it
    pub fn delete_record(&self, id: &str) -> ConfigResult<()> {
        let _guard = self.edit_lock.lock();

        self.store.delete_record(id)?;
        self.cache.remove(id);

        let mut aggregate = self.aggregate();
        if aggregate.set_enabled(id, false) {
            self.store.save_aggregate(&aggregate)?;
            *self.aggregate.write() = aggregate;
        }

        Ok(())
    }

    /// Update global settings; bad values are corrected before saving
    pub fn update_settings<F>(&self, updater: F) -> ConfigResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let _guard = self.edit_lock.lock();

        let mut aggregate = self.aggregate();
        updater(&mut aggregate.settings);
        self.validator.validate_aggregate(&mut aggregate);

        self.store.save_aggregate(&aggregate)?;
        let settings = aggregate.settings.clone();
        *self.aggregate.write() = aggregate;
        Ok(settings)
    }

    /// Replace the log toggles
    pub fn set_log_config(&self, log_config: LogConfig) -> ConfigResult<()> {
        let _guard = self.edit_lock.lock();

        let mut aggregate = self.aggregate();
        aggregate.log_config = log_config;
        self.store.save_aggregate(&aggregate)?;
        *self.aggregate.write() = aggregate;
        Ok(())
    }

    /// Persist and apply a new allow-list
    pub fn save_allow_list(&self, list: AllowList) -> ConfigResult<()> {
        let _guard = self.edit_lock.lock();

        self.store.save_allow_list(&list)?;
        *self.allow_list.write() = list;
        Ok(())
    }

    /// Drop the cache and repopulate it from disk in one pass
    ///
    /// Used after bulk external changes. The enabled set (and, with
    /// preloading, the enabled records) is filled before the cache is
    /// marked valid, so the render path never stampedes the disk with
    /// per-id loads. On failure the previous aggregate is kept.
    ///
    /// Runs under the edit lock: a save either completes before the reload
    /// reads the disk or starts after the cache is valid again.
    pub fn invalidate_and_reload(&self) -> ConfigResult<()> {
        let _guard = self.edit_lock.lock();
        let timer = OperationTimer::start();

        self.cache.invalidate();
        let result = self.reload_aggregate();
        self.reload_allow_list();

        let enabled = self.aggregate.read().enabled_items.clone();
        for id in &enabled {
            self.cache.put_enabled(id, true);
        }
        if self.preload {
            let epoch = self.cache.epoch();
            for id in &enabled {
                match self.load_validated(id) {
                    Ok(record) => {
                        self.cache.put_if_absent(id, record, epoch);
                    }
                    Err(e) => warn!(id = %id, error = %e, "Failed to preload record"),
                }
            }
        }
        self.cache.mark_valid();

        if self.log_enabled(LogCategory::Performance) {
            info!(
                enabled = enabled.len(),
                preloaded = self.preload,
                elapsed_ms = timer.elapsed_ms(),
                "Configuration reloaded"
            );
        }

        result
    }

    fn reload_aggregate(&self) -> ConfigResult<()> {
        match self.store.load_aggregate() {
            Ok(mut aggregate) => {
                self.validator.validate_aggregate(&mut aggregate);
                *self.aggregate.write() = aggregate;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to load aggregate configuration; keeping previous");
                Err(e)
            }
        }
    }

    fn reload_allow_list(&self) {
        match self.store.load_allow_list() {
            Ok(list) => *self.allow_list.write() = list,
            Err(e) => warn!(error = %e, "Failed to load allow-list; keeping previous"),
        }
    }

    /// Load a record and replace it with the default if it fails validation
    fn load_validated(&self, id: &str) -> ConfigResult<ConfigRecord> {
        let mut record = self.store.load_record(id)?;

        if record.id != id {
            warn!(id = %id, file_id = %record.id, "Record file id differs from requested id");
            record.id = id.to_string();
        }

        let result = self.validator.validate_record(&record);
        if !result.is_valid() {
            warn!(id = %id, errors = ?result.errors, "Record failed validation; using default");
            return Ok(Factory::default_record(id));
        }

        if self.log_enabled(LogCategory::Config) {
            debug!(id = %id, warnings = ?result.warnings, "Loaded record");
        }
        Ok(record)
    }

    /// Validate, save and cache a record; caller holds the edit lock
    fn persist_record(&self, id: &str, record: ConfigRecord) -> ConfigResult<()> {
        if id.trim().is_empty() {
            return Err(ConfigError::save_rejected("record id must not be empty"));
        }
        if record.id != id {
            return Err(ConfigError::validation(
                id,
                vec![format!("record id '{}' does not match '{}'", record.id, id)],
            ));
        }

        let warnings = self.validator.validate_record(&record).into_result(id)?;
        if self.log_enabled(LogCategory::Config) && !warnings.is_empty() {
            debug!(id = %id, warnings = ?warnings, "Saving record with warnings");
        }

        // Ids enabled before the allow-list changed stay editable
        if record.enabled && !self.aggregate.read().is_enabled(id) && !self.is_allowed(id) {
            return Err(ConfigError::validation(
                id,
                vec!["id is not in the allow-list".to_string()],
            ));
        }

        self.store.save_record(id, &record)?;
        let enabled = record.enabled;
        self.cache.put(id, record);

        let mut aggregate = self.aggregate();
        if aggregate.set_enabled(id, enabled) {
            self.store.save_aggregate(&aggregate)?;
            *self.aggregate.write() = aggregate;
        }
        self.cache.put_enabled(id, enabled);

        if self.log_enabled(LogCategory::Config) {
            info!(id = %id, enabled, "Saved record");
        }
        Ok(())
    }

    fn log_enabled(&self, category: LogCategory) -> bool {
        self.aggregate.read().log_config.is_enabled(category)
    }
}

/// Holder that constructs the manager once, on first use
///
/// Create one context at startup and hand it (or the manager it yields)
/// to every component that needs configuration access.
pub struct ConfigContext {
    options: ManagerOptions,
    manager: OnceCell<Arc<ConfigManager>>,
}

impl ConfigContext {
    pub fn new(options: ManagerOptions) -> Self {
        Self {
            options,
            manager: OnceCell::new(),
        }
    }

    /// Context rooted at the resolved default configuration directory
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self::new(ManagerOptions::from_env()?))
    }

    /// The manager, constructing it on the first call
    ///
    /// Concurrent first calls block until one construction finishes; all
    /// callers receive the same instance.
    pub fn manager(&self) -> Arc<ConfigManager> {
        self.manager
            .get_or_init(|| Arc::new(ConfigManager::new(self.options.clone())))
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.manager.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RenderTarget, View};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::new(ManagerOptions::new(temp_dir.path()));
        (temp_dir, manager)
    }

    fn block_record(id: &str) -> ConfigRecord {
        ConfigRecord {
            target: RenderTarget::AsBlock(id.to_string()),
            ..Factory::default_record(id)
        }
    }

    #[test]
    fn test_construction_creates_files() {
        let (dir, _manager) = manager();
        assert!(dir.path().join("config.json").is_file());
        assert!(dir.path().join("restrictions.json").is_file());
    }

    #[test]
    fn test_get_record_missing_creates_default() {
        let (_dir, manager) = manager();

        let record = manager.get_record("minecraft:torch");

        assert_eq!(record, Factory::default_record("minecraft:torch"));
        assert!(manager.store().exists("minecraft:torch"));
        assert_eq!(manager.stats().misses, 1);

        manager.get_record("minecraft:torch");
        assert_eq!(manager.stats().hits, 1);
    }

    #[test]
    fn test_get_record_empty_id() {
        let (_dir, manager) = manager();
        assert_eq!(manager.get_record(""), Factory::default_record(""));
        assert!(manager.list_available().is_empty());
    }

    #[test]
    fn test_get_record_invalid_file_falls_back() {
        let (_dir, manager) = manager();
        let store = manager.store();
        std::fs::create_dir_all(store.items_dir()).unwrap();
        std::fs::write(
            store.record_path("a:b"),
            r#"{"id":"a:b","renderAsBlock":true,"blockId":"","firstPerson":{},"thirdPerson":{}}"#,
        )
        .unwrap();

        assert_eq!(manager.get_record("a:b"), Factory::default_record("a:b"));
    }

    #[test]
    fn test_get_record_malformed_file_falls_back() {
        let (_dir, manager) = manager();
        let store = manager.store();
        std::fs::create_dir_all(store.items_dir()).unwrap();
        std::fs::write(store.record_path("a:b"), "not json").unwrap();

        assert_eq!(manager.get_record("a:b"), Factory::default_record("a:b"));
        // The broken file is left for the user to fix
        assert_eq!(
            std::fs::read_to_string(store.record_path("a:b")).unwrap(),
            "not json"
        );
    }

    #[test]
    fn test_save_record_updates_cache_and_aggregate() {
        let (_dir, manager) = manager();
        let mut record = block_record("minecraft:torch");
        record.enabled = true;

        manager.save_record("minecraft:torch", record.clone()).unwrap();

        assert_eq!(manager.get_record("minecraft:torch"), record);
        assert!(manager.is_enabled("minecraft:torch"));
        assert!(manager.aggregate().is_enabled("minecraft:torch"));
        assert!(manager
            .store()
            .load_aggregate()
            .unwrap()
            .is_enabled("minecraft:torch"));
    }

    #[test]
    fn test_save_record_rejects_invalid() {
        let (_dir, manager) = manager();
        let record = ConfigRecord {
            target: RenderTarget::AsBlock(String::new()),
            ..Factory::default_record("a:b")
        };

        let err = manager.save_record("a:b", record).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(!manager.store().exists("a:b"));
    }

    #[test]
    fn test_save_record_rejects_mismatched_id() {
        let (_dir, manager) = manager();
        let err = manager
            .save_record("a:b", block_record("c:d"))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn test_mutate_is_visible_immediately() {
        let (_dir, manager) = manager();
        manager.save_record("x", block_record("x")).unwrap();
        assert_eq!(manager.get_record("x").settings(View::FirstPerson).scale, 1.0);

        manager
            .mutate("x", |record| record.settings_mut(View::FirstPerson).scale = 2.0)
            .unwrap();

        assert_eq!(manager.get_record("x").settings(View::FirstPerson).scale, 2.0);
        assert!(manager.stats().valid);
    }

    #[test]
    fn test_set_enabled_round_trip() {
        let (_dir, manager) = manager();

        manager.set_enabled("a:b", true).unwrap();
        assert!(manager.is_enabled("a:b"));
        assert!(manager.get_record("a:b").enabled);
        assert!(manager.enabled_ids().contains("a:b"));

        manager.set_enabled("a:b", false).unwrap();
        assert!(!manager.is_enabled("a:b"));
        assert!(manager.enabled_ids().is_empty());
    }

    #[test]
    fn test_set_enabled_respects_allow_list() {
        let (_dir, manager) = manager();
        manager
            .save_allow_list(AllowList {
                enabled: true,
                allowed_items: vec!["a:b".to_string()],
            })
            .unwrap();

        assert!(manager.set_enabled("a:b", true).is_ok());
        assert!(manager.set_enabled("c:d", true).is_err());
        assert!(manager.set_enabled("c:d", false).is_ok());
    }

    #[test]
    fn test_allow_list_applies_to_every_save() {
        let (_dir, manager) = manager();
        manager.set_enabled("a:b", true).unwrap();
        manager
            .save_allow_list(AllowList {
                enabled: true,
                allowed_items: Vec::new(),
            })
            .unwrap();

        let mut record = block_record("c:d");
        record.enabled = true;
        let err = manager.save_record("c:d", record).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        let err = manager
            .mutate("c:d", |record| record.enabled = true)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);

        assert!(!manager.is_enabled("c:d"));
        assert!(!manager.aggregate().is_enabled("c:d"));
        assert!(!manager.store().load_record("c:d").unwrap().enabled);

        // Enabled before the restriction, so other edits still go through
        manager
            .mutate("a:b", |record| record.settings_mut(View::FirstPerson).scale = 2.0)
            .unwrap();
        assert!(manager.is_enabled("a:b"));
    }

    #[test]
    fn test_edits_leave_lookup_stats_alone() {
        let (_dir, manager) = manager();
        manager.save_record("x", block_record("x")).unwrap();
        let before = manager.stats();

        manager
            .mutate("x", |record| record.settings_mut(View::FirstPerson).scale = 2.0)
            .unwrap();
        manager.set_enabled("x", true).unwrap();

        let after = manager.stats();
        assert_eq!(after.hits, before.hits);
        assert_eq!(after.misses, before.misses);
        assert_eq!(manager.get_record("x").settings(View::FirstPerson).scale, 2.0);
    }

    #[test]
    fn test_delete_record() {
        let (_dir, manager) = manager();
        manager.set_enabled("a:b", true).unwrap();

        manager.delete_record("a:b").unwrap();

        assert!(!manager.store().exists("a:b"));
        assert!(!manager.is_enabled("a:b"));
        assert!(!manager.aggregate().is_enabled("a:b"));
    }

    #[test]
    fn test_invalidate_and_reload_picks_up_external_changes() {
        let (_dir, manager) = manager();
        manager.get_record("a:b");

        let mut aggregate = manager.aggregate();
        aggregate.enabled_items.push("a:b".to_string());
        manager.store().save_aggregate(&aggregate).unwrap();
        assert!(!manager.is_enabled("a:b"));

        manager.invalidate_and_reload().unwrap();

        assert!(manager.is_enabled("a:b"));
        let stats = manager.stats();
        assert!(stats.valid);
        assert_eq!(stats.invalidations, 2);
        // preload warmed the enabled record
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_saves_stay_visible_while_reloading() {
        let temp_dir = TempDir::new().unwrap();
        let manager = Arc::new(ConfigManager::new(ManagerOptions::new(temp_dir.path())));
        manager.save_record("a:b", block_record("a:b")).unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let reloads = Arc::new(AtomicUsize::new(0));
        let reloader = {
            let manager = manager.clone();
            let stop = stop.clone();
            let reloads = reloads.clone();
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    manager.invalidate_and_reload().unwrap();
                    reloads.fetch_add(1, Ordering::Relaxed);
                }
            })
        };
        while reloads.load(Ordering::Relaxed) == 0 {
            std::thread::yield_now();
        }

        for i in 0..300 {
            let enabled = i % 2 == 0;
            let scale = (i % 8 + 1) as f32 * 0.25;
            let mut record = block_record("a:b");
            record.enabled = enabled;
            record.settings_mut(View::FirstPerson).scale = scale;
            manager.save_record("a:b", record).unwrap();

            let seen = manager.get_record("a:b");
            assert_eq!(seen.enabled, enabled, "record after save {}", i);
            assert_eq!(seen.settings(View::FirstPerson).scale, scale);
            assert_eq!(manager.is_enabled("a:b"), enabled, "enabled set after save {}", i);
            assert_eq!(manager.aggregate().is_enabled("a:b"), enabled);
        }

        stop.store(true, Ordering::Relaxed);
        reloader.join().unwrap();

        // Last save disabled the id; no reload wrote back an older aggregate
        assert!(!manager.store().load_aggregate().unwrap().is_enabled("a:b"));
        assert!(!manager.is_enabled("a:b"));
    }

    #[test]
    fn test_reload_keeps_previous_aggregate_on_failure() {
        let (_dir, manager) = manager();
        manager.set_enabled("a:b", true).unwrap();

        std::fs::write(manager.store().aggregate_path(), "{ broken").unwrap();
        let err = manager.invalidate_and_reload().unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedData);
        assert!(manager.stats().valid);
        assert!(manager.is_enabled("a:b"));
    }

    #[test]
    fn test_update_settings_corrects_values() {
        let (_dir, manager) = manager();

        let settings = manager
            .update_settings(|settings| {
                settings.cache_size = -1;
                settings.auto_save_interval = 30;
            })
            .unwrap();

        assert_eq!(settings.cache_size, crate::types::DEFAULT_CACHE_SIZE);
        assert_eq!(settings.auto_save_interval, 30);
        assert_eq!(
            manager.store().load_aggregate().unwrap().settings,
            settings
        );
    }

    #[test]
    fn test_set_log_config() {
        let (_dir, manager) = manager();
        let log_config = LogConfig {
            enable_performance_logs: true,
            ..LogConfig::default()
        };
        manager.set_log_config(log_config).unwrap();
        assert_eq!(manager.log_config(), log_config);
    }

    #[test]
    fn test_context_constructs_once() {
        let temp_dir = TempDir::new().unwrap();
        let context = Arc::new(ConfigContext::new(ManagerOptions::new(temp_dir.path())));
        assert!(!context.is_initialized());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let context = context.clone();
                std::thread::spawn(move || context.manager())
            })
            .collect();
        let managers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(context.is_initialized());
        for manager in &managers {
            assert!(Arc::ptr_eq(manager, &managers[0]));
        }
    }
}
