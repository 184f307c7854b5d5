//! JSON persistence helpers shared by the store
//!
//! Writes are plain write-then-close; a crash mid-write can leave a torn
//! file, which the next load reports as malformed data.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Load JSON from a file, `Ok(None)` when the file does not exist
pub fn load_json<T, P>(path: P) -> ConfigResult<Option<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::load_io(path.to_path_buf(), e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::malformed(path.to_path_buf(), e))
}

/// Save a value as pretty JSON, creating parent directories
pub fn save_json<T, P>(path: P, value: &T) -> ConfigResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = prepare(path, value)?;
    std::fs::write(path, content).map_err(|e| ConfigError::save_io(path.to_path_buf(), e))
}

/// Write a value only if the file does not exist yet
///
/// Returns `Ok(false)` when another writer created the file first.
pub fn create_json<T, P>(path: P, value: &T) -> ConfigResult<bool>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = prepare(path, value)?;

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(ConfigError::save_io(path.to_path_buf(), e)),
    };
    file.write_all(content.as_bytes())
        .map_err(|e| ConfigError::save_io(path.to_path_buf(), e))?;
    Ok(true)
}

/// Create parent directories and serialize
fn prepare<T: Serialize>(path: &Path, value: &T) -> ConfigResult<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::save_io(parent.to_path_buf(), e))?;
    }

    serde_json::to_string_pretty(value)
        .map_err(|e| ConfigError::save_serialize(path.to_path_buf(), e))
}

/// Remove a file, returning whether it existed
pub fn remove_json<P: AsRef<Path>>(path: P) -> ConfigResult<bool> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ConfigError::save_io(path.to_path_buf(), e)),
    }
}
