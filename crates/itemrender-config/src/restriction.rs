//! Allow-list restriction file
//!
//! When enabled, only listed ids may be configured for custom rendering.
//! Shares the store's load/default/save discipline and is reloaded with
//! the rest of the configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowList {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_items: Vec<String>,
}

impl AllowList {
    /// Whether an id passes the restriction (always true while disabled)
    pub fn is_allowed(&self, id: &str) -> bool {
        !self.enabled || self.allowed_items.iter().any(|item| item == id)
    }

    /// Add an id, ignoring duplicates
    pub fn allow(&mut self, id: &str) {
        if !self.allowed_items.iter().any(|item| item == id) {
            self.allowed_items.push(id.to_string());
        }
    }

    pub fn revoke(&mut self, id: &str) {
        self.allowed_items.retain(|item| item != id);
    }
}
