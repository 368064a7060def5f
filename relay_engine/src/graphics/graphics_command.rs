/// Commands understood by the graphics subsystem.

use glam::{Vec3, Vec4};
use crate::dispatch::{
    Command, ensure, ensure_color, ensure_finite3, ensure_name, ensure_positive, ensure_targets,
};
use crate::error::Result;
use super::graphics_state::{Light, RenderEntityKey};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCommand {
    /// Bind a registered texture to an entity
    SetTexture { target: RenderEntityKey, texture: String },
    SetPosition { target: RenderEntityKey, position: Vec3 },
    /// Per-axis scale, every component strictly positive
    SetScale { target: RenderEntityKey, scale: Vec3 },
    /// RGBA tint, components in [0, 1]
    SetTint { target: RenderEntityKey, tint: Vec4 },
    /// Show or hide several entities at once
    SetVisible { targets: Vec<RenderEntityKey>, visible: bool },
    DestroyEntity { target: RenderEntityKey },
    /// Add a named light, replacing any light with the same name
    AddLight { name: String, light: Light },
    RemoveLight { name: String },
    SetClearColor { color: Vec4 },
    SetCamera { eye: Vec3, target: Vec3 },
}

impl Command for GraphicsCommand {
    fn label(&self) -> &'static str {
        match self {
            GraphicsCommand::SetTexture { .. } => "SetTexture",
            GraphicsCommand::SetPosition { .. } => "SetPosition",
            GraphicsCommand::SetScale { .. } => "SetScale",
            GraphicsCommand::SetTint { .. } => "SetTint",
            GraphicsCommand::SetVisible { .. } => "SetVisible",
            GraphicsCommand::DestroyEntity { .. } => "DestroyEntity",
            GraphicsCommand::AddLight { .. } => "AddLight",
            GraphicsCommand::RemoveLight { .. } => "RemoveLight",
            GraphicsCommand::SetClearColor { .. } => "SetClearColor",
            GraphicsCommand::SetCamera { .. } => "SetCamera",
        }
    }

    fn validate(&self) -> Result<()> {
        let label = self.label();
        match self {
            GraphicsCommand::SetTexture { texture, .. } => ensure_name(label, "texture", texture),
            GraphicsCommand::SetPosition { position, .. } => {
                ensure_finite3(label, "position", *position)
            }
            GraphicsCommand::SetScale { scale, .. } => {
                ensure_positive(label, "scale.x", scale.x)?;
                ensure_positive(label, "scale.y", scale.y)?;
                ensure_positive(label, "scale.z", scale.z)
            }
            GraphicsCommand::SetTint { tint, .. } => ensure_color(label, *tint),
            GraphicsCommand::SetVisible { targets, .. } => ensure_targets(label, targets),
            GraphicsCommand::DestroyEntity { .. } => Ok(()),
            GraphicsCommand::AddLight { name, light } => {
                ensure_name(label, "name", name)?;
                ensure_finite3(label, "position", light.position)?;
                ensure_color(label, light.color.extend(1.0))?;
                ensure(light.intensity.is_finite() && light.intensity >= 0.0, label, || {
                    format!("intensity {} must be finite and non-negative", light.intensity)
                })
            }
            GraphicsCommand::RemoveLight { name } => ensure_name(label, "name", name),
            GraphicsCommand::SetClearColor { color } => ensure_color(label, *color),
            GraphicsCommand::SetCamera { eye, target } => {
                ensure_finite3(label, "eye", *eye)?;
                ensure_finite3(label, "target", *target)?;
                ensure(eye != target, label, || "eye and target coincide".to_string())
            }
        }
    }
}
