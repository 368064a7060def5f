/*!
# Relay Engine

Cross-thread command dispatch for a real-time game engine.

Game logic, input and scripting threads never touch subsystem state
directly. They enqueue typed commands into a per-subsystem queue; the thread
that owns the subsystem (render, audio, physics) drains and applies them once
per tick.

## Architecture

- **CommandSender**: cloneable producer handle, usable from any thread
- **CommandQueue**: mutex-guarded FIFO plus a buffer of delayed commands
- **SubsystemManager**: owns a subsystem's state and drains its queue
- **Subsystem**: state + closed command enum (Graphics, Physics, Audio)
- **Engine**: composition root handing out senders and managers
*/

// Internal modules
mod error;
mod config;
mod engine;
pub mod log;
pub mod dispatch;
pub mod graphics;
pub mod physics;
pub mod audio;

// Main relay namespace module
pub mod relay {
    // Error types
    pub use crate::error::{Error, Result};

    // Composition root
    pub use crate::engine::{Engine, CommandSenders, TickReport};

    // Configuration
    pub use crate::config::{EngineConfig, QueueConfig};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Dispatch core
    pub mod dispatch {
        pub use crate::dispatch::*;
    }

    pub mod graphics {
        pub use crate::graphics::*;
    }

    pub mod physics {
        pub use crate::physics::*;
    }

    pub mod audio {
        pub use crate::audio::*;
    }
}

// Re-export math library at crate root
pub use glam;
