//! Configuration data model
//!
//! In-memory shapes are typed (a [`RenderTarget`] enum, [`Vec3`] groups);
//! the on-disk JSON keeps the flat camelCase layout external tools edit:
//!
//! ```json
//! {
//!   "id": "minecraft:torch",
//!   "enabled": true,
//!   "renderAsBlock": true,
//!   "blockId": "minecraft:torch",
//!   "renderAsEntity": false,
//!   "entityType": "",
//!   "firstPerson": { "scale": 1.0, "rotationX": 0.0, ... },
//!   "thirdPerson": { "scale": 1.0, "rotationX": 0.0, ... }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default auto-save interval in seconds
pub const DEFAULT_AUTO_SAVE_INTERVAL: i64 = 300;

/// Default number of cached records
pub const DEFAULT_CACHE_SIZE: i64 = 256;

/// Default number of concurrent load workers
pub const DEFAULT_MAX_CONCURRENCY: i64 = 4;

/// Three-component vector (degrees for rotation, blocks for translation)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Which camera view a [`RenderSettings`] applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    FirstPerson,
    ThirdPerson,
}

impl View {
    /// JSON key of this view inside a record file
    pub fn key(&self) -> &'static str {
        match self {
            View::FirstPerson => "firstPerson",
            View::ThirdPerson => "thirdPerson",
        }
    }
}

/// Transform applied when an item is drawn in one view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SettingsDocument", into = "SettingsDocument")]
pub struct RenderSettings {
    pub scale: f32,
    pub rotation: Vec3,
    pub translate: Vec3,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: Vec3::ZERO,
            translate: Vec3::ZERO,
        }
    }
}

impl RenderSettings {
    /// Whether every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.rotation.is_finite() && self.translate.is_finite()
    }
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDocument {
    #[serde(default = "default_scale")]
    scale: f32,
    #[serde(default)]
    rotation_x: f32,
    #[serde(default)]
    rotation_y: f32,
    #[serde(default)]
    rotation_z: f32,
    #[serde(default)]
    translate_x: f32,
    #[serde(default)]
    translate_y: f32,
    #[serde(default)]
    translate_z: f32,
}

impl From<SettingsDocument> for RenderSettings {
    fn from(doc: SettingsDocument) -> Self {
        Self {
            scale: doc.scale,
            rotation: Vec3::new(doc.rotation_x, doc.rotation_y, doc.rotation_z),
            translate: Vec3::new(doc.translate_x, doc.translate_y, doc.translate_z),
        }
    }
}

impl From<RenderSettings> for SettingsDocument {
    fn from(settings: RenderSettings) -> Self {
        Self {
            scale: settings.scale,
            rotation_x: settings.rotation.x,
            rotation_y: settings.rotation.y,
            rotation_z: settings.rotation.z,
            translate_x: settings.translate.x,
            translate_y: settings.translate.y,
            translate_z: settings.translate.z,
        }
    }
}

/// What an item is drawn as
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderTarget {
    /// Draw the referenced block model
    AsBlock(String),
    /// Draw an entity of the given type
    AsEntity(String),
    /// Keep the stock item rendering
    #[default]
    Neither,
}

/// Per-item render configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordDocument", into = "RecordDocument")]
pub struct ConfigRecord {
    pub id: String,
    pub enabled: bool,
    pub target: RenderTarget,
    /// `None` only when a file omitted (or nulled) the sub-record
    pub first_person: Option<RenderSettings>,
    pub third_person: Option<RenderSettings>,
}

impl ConfigRecord {
    /// Settings for a view, falling back to identity when the sub-record is missing
    pub fn settings(&self, view: View) -> RenderSettings {
        match view {
            View::FirstPerson => self.first_person,
            View::ThirdPerson => self.third_person,
        }
        .unwrap_or_default()
    }

    /// Mutable settings for a view, inserting identity settings if missing
    pub fn settings_mut(&mut self, view: View) -> &mut RenderSettings {
        match view {
            View::FirstPerson => self.first_person.get_or_insert_with(RenderSettings::default),
            View::ThirdPerson => self.third_person.get_or_insert_with(RenderSettings::default),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordDocument {
    #[serde(default)]
    id: String,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    render_as_block: bool,
    #[serde(default)]
    block_id: String,
    #[serde(default)]
    render_as_entity: bool,
    #[serde(default)]
    entity_type: String,
    #[serde(default)]
    first_person: Option<RenderSettings>,
    #[serde(default)]
    third_person: Option<RenderSettings>,
}

impl From<RecordDocument> for ConfigRecord {
    fn from(doc: RecordDocument) -> Self {
        // Block wins when a hand-edited file sets both flags
        let target = if doc.render_as_block {
            RenderTarget::AsBlock(doc.block_id)
        } else if doc.render_as_entity {
            RenderTarget::AsEntity(doc.entity_type)
        } else {
            RenderTarget::Neither
        };

        Self {
            id: doc.id,
            enabled: doc.enabled,
            target,
            first_person: doc.first_person,
            third_person: doc.third_person,
        }
    }
}

impl From<ConfigRecord> for RecordDocument {
    fn from(record: ConfigRecord) -> Self {
        let (render_as_block, block_id, render_as_entity, entity_type) = match record.target {
            RenderTarget::AsBlock(block) => (true, block, false, String::new()),
            RenderTarget::AsEntity(entity) => (false, String::new(), true, entity),
            RenderTarget::Neither => (false, String::new(), false, String::new()),
        };

        Self {
            id: record.id,
            enabled: record.enabled,
            render_as_block,
            block_id,
            render_as_entity,
            entity_type,
            first_person: record.first_person,
            third_person: record.third_person,
        }
    }
}

fn default_auto_save_interval() -> i64 {
    DEFAULT_AUTO_SAVE_INTERVAL
}

fn default_cache_size() -> i64 {
    DEFAULT_CACHE_SIZE
}

fn default_max_concurrency() -> i64 {
    DEFAULT_MAX_CONCURRENCY
}

/// Global options; unknown keys are kept in `extra` and written back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: i64,
    #[serde(default = "default_cache_size")]
    pub cache_size: i64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_save_interval: DEFAULT_AUTO_SAVE_INTERVAL,
            cache_size: DEFAULT_CACHE_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            extra: Map::new(),
        }
    }
}

/// Log categories that can be toggled from the aggregate file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Render,
    Config,
    Gui,
    Mixin,
    Performance,
}

/// Named log toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogConfig {
    pub enable_render_logs: bool,
    pub enable_config_logs: bool,
    pub enable_gui_logs: bool,
    pub enable_mixin_logs: bool,
    pub enable_performance_logs: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable_render_logs: false,
            enable_config_logs: true,
            enable_gui_logs: false,
            enable_mixin_logs: false,
            enable_performance_logs: false,
        }
    }
}

impl LogConfig {
    pub fn is_enabled(&self, category: LogCategory) -> bool {
        match category {
            LogCategory::Render => self.enable_render_logs,
            LogCategory::Config => self.enable_config_logs,
            LogCategory::Gui => self.enable_gui_logs,
            LogCategory::Mixin => self.enable_mixin_logs,
            LogCategory::Performance => self.enable_performance_logs,
        }
    }
}

/// Top-level configuration: enabled ids plus global options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateConfig {
    #[serde(default)]
    pub enabled_items: Vec<String>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub log_config: LogConfig,
}

impl AggregateConfig {
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled_items.iter().any(|item| item == id)
    }

    /// Add or remove an id, returning whether the list changed
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        let present = self.is_enabled(id);
        if enabled && !present {
            self.enabled_items.push(id.to_string());
            true
        } else if !enabled && present {
            self.enabled_items.retain(|item| item != id);
            true
        } else {
            false
        }
    }
}
