/// Commands understood by the physics subsystem.

use glam::Vec3;
use crate::dispatch::{Command, ensure_finite3, ensure_positive, ensure_targets};
use crate::error::Result;
use super::physics_world::BodyKey;

#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsCommand {
    SetVelocity { target: BodyKey, velocity: Vec3 },
    /// Change velocity by `impulse / mass`
    ApplyImpulse { target: BodyKey, impulse: Vec3 },
    /// Move a body without affecting its velocity
    Teleport { target: BodyKey, position: Vec3 },
    SetMass { target: BodyKey, mass: f32 },
    /// Frozen bodies are skipped by the integrator
    SetFrozen { targets: Vec<BodyKey>, frozen: bool },
    SetGravity { gravity: Vec3 },
    RemoveBody { target: BodyKey },
}

impl Command for PhysicsCommand {
    fn label(&self) -> &'static str {
        match self {
            PhysicsCommand::SetVelocity { .. } => "SetVelocity",
            PhysicsCommand::ApplyImpulse { .. } => "ApplyImpulse",
            PhysicsCommand::Teleport { .. } => "Teleport",
            PhysicsCommand::SetMass { .. } => "SetMass",
            PhysicsCommand::SetFrozen { .. } => "SetFrozen",
            PhysicsCommand::SetGravity { .. } => "SetGravity",
            PhysicsCommand::RemoveBody { .. } => "RemoveBody",
        }
    }

    fn validate(&self) -> Result<()> {
        let label = self.label();
        match self {
            PhysicsCommand::SetVelocity { velocity, .. } => ensure_finite3(label, "velocity", *velocity),
            PhysicsCommand::ApplyImpulse { impulse, .. } => ensure_finite3(label, "impulse", *impulse),
            PhysicsCommand::Teleport { position, .. } => ensure_finite3(label, "position", *position),
            PhysicsCommand::SetMass { mass, .. } => ensure_positive(label, "mass", *mass),
            PhysicsCommand::SetFrozen { targets, .. } => ensure_targets(label, targets),
            PhysicsCommand::SetGravity { gravity } => ensure_finite3(label, "gravity", *gravity),
            PhysicsCommand::RemoveBody { .. } => Ok(()),
        }
    }
}
