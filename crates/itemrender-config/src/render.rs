//! Render override interface
//!
//! The renderer asks, per item and display context, whether it should
//! replace the stock item model. Everything here is answered from the
//! manager's lookup path, so it never fails and never blocks on an edit.

use crate::manager::ConfigManager;
use crate::types::{RenderSettings, RenderTarget, Vec3, View};

/// Where an item is being drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayContext {
    FirstPersonLeftHand,
    FirstPersonRightHand,
    ThirdPersonLeftHand,
    ThirdPersonRightHand,
    Gui,
    Ground,
    Fixed,
    Head,
}

impl DisplayContext {
    /// Camera view for hand contexts; `None` for everything else
    pub fn view(&self) -> Option<View> {
        match self {
            DisplayContext::FirstPersonLeftHand | DisplayContext::FirstPersonRightHand => {
                Some(View::FirstPerson)
            }
            DisplayContext::ThirdPersonLeftHand | DisplayContext::ThirdPersonRightHand => {
                Some(View::ThirdPerson)
            }
            _ => None,
        }
    }
}

/// Transform applied before drawing a replacement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f32,
    /// Degrees around each axis
    pub rotation: Vec3,
    pub translation: Vec3,
}

impl From<RenderSettings> for Transform {
    fn from(settings: RenderSettings) -> Self {
        Self {
            scale: settings.scale,
            rotation: settings.rotation,
            translation: settings.translate,
        }
    }
}

/// What to draw in place of the item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawInstruction {
    Block(String),
    Entity(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOverride {
    pub transform: Transform,
    pub draw: DrawInstruction,
}

/// Source of render overrides
pub trait RenderOverrideSource: Send + Sync {
    /// Override for an item in a display context, or `None` to keep stock rendering
    fn render_override(&self, id: &str, context: DisplayContext) -> Option<RenderOverride>;
}

impl RenderOverrideSource for ConfigManager {
    fn render_override(&self, id: &str, context: DisplayContext) -> Option<RenderOverride> {
        let view = context.view()?;
        if !self.is_enabled(id) || !self.is_allowed(id) {
            return None;
        }

        let record = self.get_record(id);
        let transform = Transform::from(record.settings(view));
        let draw = match record.target {
            RenderTarget::AsBlock(block_id) => DrawInstruction::Block(block_id),
            RenderTarget::AsEntity(entity_type) => DrawInstruction::Entity(entity_type),
            RenderTarget::Neither => return None,
        };

        Some(RenderOverride { transform, draw })
    }
}
