//! Shared fixtures for the workspace integration tests

use itemrender_config::{ConfigManager, ConfigRecord, Factory, ManagerOptions, RenderTarget};
use tempfile::TempDir;

/// A manager over a fresh temporary root; keep the `TempDir` alive
pub fn temp_manager() -> (TempDir, ConfigManager) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let manager = reopen(&dir);
    (dir, manager)
}

/// A new manager over an existing root, as a restarted process would see it
pub fn reopen(dir: &TempDir) -> ConfigManager {
    ConfigManager::new(ManagerOptions::new(dir.path()))
}

/// Record drawn as the given block
pub fn block_record(id: &str, block_id: &str) -> ConfigRecord {
    ConfigRecord {
        target: RenderTarget::AsBlock(block_id.to_string()),
        ..Factory::default_record(id)
    }
}

/// Parse a JSON file under the root
pub fn read_json(dir: &TempDir, relative: &str) -> serde_json::Value {
    let content =
        std::fs::read_to_string(dir.path().join(relative)).expect("Failed to read config file");
    serde_json::from_str(&content).expect("Config file is not JSON")
}
