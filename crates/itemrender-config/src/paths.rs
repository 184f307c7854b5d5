//! Configuration root resolution and on-disk layout

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable overriding the configuration root
pub const HOME_ENV_VAR: &str = "ITEMRENDER_HOME";

/// Directory name used under the platform config dir
const APP_DIR: &str = "itemrender";

/// Aggregate file name
pub const AGGREGATE_FILE: &str = "config.json";

/// Allow-list file name
pub const ALLOW_LIST_FILE: &str = "restrictions.json";

/// Per-id record directory name
pub const ITEMS_DIR: &str = "items";

/// Record file extension
const RECORD_EXTENSION: &str = "json";

/// Path resolver for the configuration root
pub struct PathResolver;

impl PathResolver {
    /// Resolve the configuration root
    ///
    /// Priority:
    /// 1. `ITEMRENDER_HOME` environment variable
    /// 2. `<config dir>/itemrender/`
    /// 3. `~/.itemrender/`
    pub fn resolve_root() -> ConfigResult<PathBuf> {
        if let Ok(home_override) = std::env::var(HOME_ENV_VAR) {
            if !home_override.trim().is_empty() {
                return Ok(PathBuf::from(home_override));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            return Ok(config_dir.join(APP_DIR));
        }

        if let Some(home_dir) = dirs::home_dir() {
            return Ok(home_dir.join(format!(".{}", APP_DIR)));
        }

        Err(ConfigError::load_rejected(
            "could not determine a configuration directory",
        ))
    }
}

/// Flatten an id into a record file name
///
/// Every `:` becomes `_`. Path separators are flattened too so an id can
/// never name a file outside the items directory. The mapping is lossy:
/// `a:b_c` and `a_b:c` share a file.
pub fn record_file_name(id: &str) -> String {
    let flattened: String = id
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    format!("{}.{}", flattened, RECORD_EXTENSION)
}

/// Reverse [`record_file_name`] as far as possible
///
/// Only the first `_` is turned back into the namespace separator, so
/// `minecraft_oak_log.json` becomes `minecraft:oak_log`.
pub fn id_from_file_name(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name)
        .extension()
        .filter(|ext| *ext == RECORD_EXTENSION)
        .and_then(|_| Path::new(file_name).file_stem())?
        .to_str()?;

    if stem.is_empty() {
        return None;
    }

    Some(stem.replacen('_', ":", 1))
}
