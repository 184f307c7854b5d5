//! # ItemRender Config
//!
//! Per-item render configuration for a game client: which items are drawn
//! as a block or an entity instead of their stock model, and with what
//! first- and third-person transforms.
//!
//! ## Features
//!
//! - **Lock-free lookups**: per-frame reads are served from a concurrent cache
//! - **Validation**: blocking errors and non-blocking warnings, with
//!   auto-correction of bad global settings
//! - **Durable storage**: one JSON file per item plus an aggregate file,
//!   defaults created on first access
//! - **Bulk reload**: invalidate and repopulate in one pass, optionally
//!   triggered by a directory watcher
//!
//! ## Example
//!
//! ```no_run
//! use itemrender_config::{ConfigContext, DisplayContext, RenderOverrideSource};
//!
//! # fn main() -> itemrender_config::ConfigResult<()> {
//! let context = ConfigContext::from_env()?;
//! let manager = context.manager();
//!
//! manager.set_enabled("minecraft:torch", true)?;
//! let draw = manager.render_override("minecraft:torch", DisplayContext::FirstPersonRightHand);
//! # let _ = draw;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod factory;
pub mod json_store;
pub mod manager;
pub mod paths;
pub mod render;
pub mod restriction;
pub mod store;
pub mod types;
pub mod validation;
pub mod watcher;

pub use cache::{CacheStats, RecordCache};
pub use error::{ConfigError, ConfigResult, ErrorKind, FailureCause};
pub use factory::Factory;
pub use manager::{ConfigContext, ConfigManager, ManagerOptions};
pub use paths::PathResolver;
pub use render::{DisplayContext, DrawInstruction, RenderOverride, RenderOverrideSource, Transform};
pub use restriction::AllowList;
pub use store::ConfigStore;
pub use types::{
    AggregateConfig, ConfigRecord, LogCategory, LogConfig, RenderSettings, RenderTarget, Settings,
    Vec3, View,
};
pub use validation::{ValidationResult, Validator};
pub use watcher::ConfigWatcher;
