//! Physics subsystem
//!
//! Rigid bodies and gravity, mutated on the physics thread by draining
//! PhysicsCommand.

mod physics_command;
mod physics_world;

pub use physics_command::PhysicsCommand;
pub use physics_world::{PhysicsWorld, RigidBody, RigidBodyDesc, BodyKey};

/// Manager owning the physics world
pub type PhysicsManager = crate::dispatch::SubsystemManager<PhysicsWorld>;
