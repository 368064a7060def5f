/// Physics subsystem state, owned by the physics/logic thread.
///
/// Rigid bodies without shapes: the world integrates velocity and gravity
/// with a semi-implicit Euler step and does no collision handling.

use glam::Vec3;
use slotmap::{new_key_type, SlotMap};
use crate::dispatch::{ApplyOutcome, Subsystem, Timestamp};
use crate::error::Result;
use super::physics_command::PhysicsCommand;

new_key_type! {
    /// Stable key for a rigid body
    pub struct BodyKey;
}

/// Creation parameters for a rigid body
#[derive(Debug, Clone, Copy)]
pub struct RigidBodyDesc {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    /// Affected by world gravity
    pub gravity_scale: f32,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass: 1.0,
            gravity_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RigidBody {
    position: Vec3,
    velocity: Vec3,
    mass: f32,
    gravity_scale: f32,
    frozen: bool,
}

impl RigidBody {
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

pub struct PhysicsWorld {
    bodies: SlotMap<BodyKey, RigidBody>,
    gravity: Vec3,
}

impl PhysicsWorld {
    /// Create an empty world with standard downward gravity
    pub fn new() -> Self {
        Self::with_gravity(Vec3::new(0.0, -9.81, 0.0))
    }

    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            gravity,
        }
    }

    pub fn add_body(&mut self, desc: RigidBodyDesc) -> BodyKey {
        debug_assert!(desc.mass > 0.0, "rigid body mass must be positive");
        self.bodies.insert(RigidBody {
            position: desc.position,
            velocity: desc.velocity,
            mass: desc.mass,
            gravity_scale: desc.gravity_scale,
            frozen: false,
        })
    }

    pub fn body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.bodies.get(key)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &RigidBody)> {
        self.bodies.iter()
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Advance every non-frozen body by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut().filter(|b| !b.frozen) {
            body.velocity += gravity * body.gravity_scale * dt;
            body.position += body.velocity * dt;
        }
    }

    fn update_body(&mut self, key: BodyKey, update: impl FnOnce(&mut RigidBody)) -> ApplyOutcome {
        match self.bodies.get_mut(key) {
            Some(body) => {
                update(body);
                ApplyOutcome::Applied
            }
            None => ApplyOutcome::Stale,
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for PhysicsWorld {
    type Command = PhysicsCommand;
    const NAME: &'static str = "relay::PhysicsManager";

    fn apply(&mut self, command: PhysicsCommand, _now: Timestamp) -> Result<ApplyOutcome> {
        let outcome = match command {
            PhysicsCommand::SetVelocity { target, velocity } => {
                self.update_body(target, |b| b.velocity = velocity)
            }
            PhysicsCommand::ApplyImpulse { target, impulse } => {
                self.update_body(target, |b| b.velocity += impulse / b.mass)
            }
            PhysicsCommand::Teleport { target, position } => {
                self.update_body(target, |b| b.position = position)
            }
            PhysicsCommand::SetMass { target, mass } => {
                self.update_body(target, |b| b.mass = mass)
            }
            PhysicsCommand::SetFrozen { targets, frozen } => {
                let mut touched = 0;
                for target in targets {
                    if self.update_body(target, |b| b.frozen = frozen) == ApplyOutcome::Applied {
                        touched += 1;
                    }
                }
                if touched > 0 { ApplyOutcome::Applied } else { ApplyOutcome::Stale }
            }
            PhysicsCommand::SetGravity { gravity } => {
                self.gravity = gravity;
                ApplyOutcome::Applied
            }
            PhysicsCommand::RemoveBody { target } => match self.bodies.remove(target) {
                Some(_) => ApplyOutcome::Applied,
                None => ApplyOutcome::Stale,
            },
        };
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "physics_world_tests.rs"]
mod tests;
