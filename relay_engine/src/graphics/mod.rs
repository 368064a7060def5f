//! Graphics subsystem
//!
//! Render entities, lights, camera and clear color, mutated on the render
//! thread by draining GraphicsCommand.

mod graphics_command;
mod graphics_state;

pub use graphics_command::GraphicsCommand;
pub use graphics_state::{
    GraphicsState, RenderEntity, RenderEntityDesc, RenderEntityKey,
    EntityFlags, Light, CameraState,
};

/// Manager owning the graphics state (lives on the render thread)
pub type GraphicsManager = crate::dispatch::SubsystemManager<GraphicsState>;
