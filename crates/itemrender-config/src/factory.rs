//! Default configuration values
//!
//! Produces structurally valid records when nothing exists on disk yet.

use crate::restriction::AllowList;
use crate::types::{AggregateConfig, ConfigRecord, RenderSettings, RenderTarget};

/// Factory for default configuration objects
pub struct Factory;

impl Factory {
    /// Default record for an id: disabled, stock rendering, identity transforms
    pub fn default_record(id: &str) -> ConfigRecord {
        ConfigRecord {
            id: id.to_string(),
            enabled: false,
            target: RenderTarget::Neither,
            first_person: Some(RenderSettings::default()),
            third_person: Some(RenderSettings::default()),
        }
    }

    /// Default aggregate: nothing enabled, default settings and log toggles
    pub fn default_aggregate() -> AggregateConfig {
        AggregateConfig::default()
    }

    /// Default allow-list: restriction off, nothing listed
    pub fn default_allow_list() -> AllowList {
        AllowList::default()
    }
}
