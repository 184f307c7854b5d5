//! Durable storage for configuration files
//!
//! Layout under the configuration root:
//! - `config.json` - aggregate (enabled ids, settings, log toggles)
//! - `items/<flattened id>.json` - one record per id
//! - `restrictions.json` - allow-list
//!
//! An absent file is never an error: the factory default is returned and
//! written so later runs find a concrete file.
//!
//! The store fingerprints every file it writes or removes so a directory
//! watcher can tell the process's own writes from external edits.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::factory::Factory;
use crate::json_store::{create_json, load_json, remove_json, save_json};
use crate::paths::{
    id_from_file_name, record_file_name, AGGREGATE_FILE, ALLOW_LIST_FILE, ITEMS_DIR,
};
use crate::restriction::AllowList;
use crate::types::{AggregateConfig, ConfigRecord};

/// Name of the throwaway file used by [`ConfigStore::is_writable`]
const WRITE_PROBE_FILE: &str = ".write-probe";

/// File-backed configuration store
#[derive(Debug)]
pub struct ConfigStore {
    root: PathBuf,
    /// Root-relative path -> hash of the content last written, `None` after a removal
    own_writes: DashMap<PathBuf, Option<u64>>,
}

impl ConfigStore {
    /// Create a store rooted at `root`; nothing is touched on disk yet
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            own_writes: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` is still exactly as this store last left it
    ///
    /// True when the file holds the content the store last wrote there, or
    /// is still absent after the store removed it. Accepts paths under the
    /// root as given or under its canonical form.
    pub fn is_own_write(&self, path: &Path) -> bool {
        let Some(key) = self.relative_key(path) else {
            return false;
        };
        let Some(expected) = self.own_writes.get(&key).map(|entry| *entry.value()) else {
            return false;
        };
        expected == fingerprint(path)
    }

    fn note_write(&self, path: &Path) {
        if let Some(key) = self.relative_key(path) {
            self.own_writes.insert(key, fingerprint(path));
        }
    }

    fn relative_key(&self, path: &Path) -> Option<PathBuf> {
        if let Ok(relative) = path.strip_prefix(&self.root) {
            return Some(relative.to_path_buf());
        }
        let canonical = fs::canonicalize(&self.root).ok()?;
        path.strip_prefix(canonical)
            .ok()
            .map(Path::to_path_buf)
    }

    pub fn items_dir(&self) -> PathBuf {
        self.root.join(ITEMS_DIR)
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.root.join(AGGREGATE_FILE)
    }

    pub fn allow_list_path(&self) -> PathBuf {
        self.root.join(ALLOW_LIST_FILE)
    }

    /// Path of the record file for an id
    pub fn record_path(&self, id: &str) -> PathBuf {
        self.items_dir().join(record_file_name(id))
    }

    /// Load the aggregate, creating the default file when absent
    pub fn load_aggregate(&self) -> ConfigResult<AggregateConfig> {
        self.load_or_create(&self.aggregate_path(), Factory::default_aggregate)
    }

    pub fn save_aggregate(&self, config: &AggregateConfig) -> ConfigResult<()> {
        let path = self.aggregate_path();
        save_json(&path, config)?;
        self.note_write(&path);
        debug!(path = %path.display(), "Saved aggregate configuration");
        Ok(())
    }

    /// Load the record for an id, creating the default file when absent
    pub fn load_record(&self, id: &str) -> ConfigResult<ConfigRecord> {
        if id.trim().is_empty() {
            return Err(ConfigError::load_rejected("record id must not be empty"));
        }
        self.load_or_create(&self.record_path(id), || Factory::default_record(id))
    }

    pub fn save_record(&self, id: &str, record: &ConfigRecord) -> ConfigResult<()> {
        if id.trim().is_empty() {
            return Err(ConfigError::save_rejected("record id must not be empty"));
        }
        let path = self.record_path(id);
        save_json(&path, record)?;
        self.note_write(&path);
        debug!(id = %id, path = %path.display(), "Saved record");
        Ok(())
    }

    /// Delete the record file for an id; a missing file only logs a warning
    pub fn delete_record(&self, id: &str) -> ConfigResult<()> {
        if id.trim().is_empty() {
            return Err(ConfigError::save_rejected("record id must not be empty"));
        }
        let path = self.record_path(id);
        if remove_json(&path)? {
            self.note_write(&path);
            info!(id = %id, "Deleted record");
        } else {
            warn!(id = %id, path = %path.display(), "Record file to delete does not exist");
        }
        Ok(())
    }

    pub fn exists(&self, id: &str) -> bool {
        !id.trim().is_empty() && self.record_path(id).is_file()
    }

    /// Ids reconstructed from the files in the items directory
    ///
    /// IO failures are logged and yield an empty set.
    pub fn list_available(&self) -> HashSet<String> {
        let items_dir = self.items_dir();
        let entries = match fs::read_dir(&items_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return HashSet::new(),
            Err(e) => {
                warn!(path = %items_dir.display(), error = %e, "Failed to list record files");
                return HashSet::new();
            }
        };

        let mut ids = HashSet::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %items_dir.display(), error = %e, "Failed to read directory entry");
                    return HashSet::new();
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(id) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(id_from_file_name)
            {
                ids.insert(id);
            }
        }

        ids
    }

    /// Probe whether the root exists (or can be created) and accepts writes
    pub fn is_writable(&self) -> bool {
        if let Err(e) = fs::create_dir_all(&self.root) {
            debug!(path = %self.root.display(), error = %e, "Config root cannot be created");
            return false;
        }

        let probe = self.root.join(WRITE_PROBE_FILE);
        match fs::write(&probe, b"") {
            Ok(()) => {
                let _ = fs::remove_file(&probe);
                true
            }
            Err(e) => {
                debug!(path = %self.root.display(), error = %e, "Config root is not writable");
                false
            }
        }
    }

    /// Load the allow-list, creating the default file when absent
    pub fn load_allow_list(&self) -> ConfigResult<AllowList> {
        self.load_or_create(&self.allow_list_path(), Factory::default_allow_list)
    }

    pub fn save_allow_list(&self, list: &AllowList) -> ConfigResult<()> {
        let path = self.allow_list_path();
        save_json(&path, list)?;
        self.note_write(&path);
        Ok(())
    }

    fn load_or_create<T, F>(&self, path: &Path, default: F) -> ConfigResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(value) = load_json(path)? {
            return Ok(value);
        }

        let value = default();
        match create_json(path, &value) {
            Ok(true) => {
                self.note_write(path);
                info!(path = %path.display(), "Created default configuration file");
            }
            // Another writer got there first; theirs wins once it is readable
            Ok(false) => match load_json(path) {
                Ok(Some(existing)) => return Ok(existing),
                Ok(None) => {}
                Err(e) => debug!(
                    path = %path.display(),
                    error = %e,
                    "Concurrently created file not readable yet; using default"
                ),
            },
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Failed to persist default configuration; using it in memory"
            ),
        }
        Ok(value)
    }
}

/// Content hash of a file, `None` when it cannot be read
fn fingerprint(path: &Path) -> Option<u64> {
    let content = fs::read(path).ok()?;
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    Some(hasher.finish())
}
