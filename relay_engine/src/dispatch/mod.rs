//! Command dispatch core
//!
//! Producers on any thread enqueue typed commands through a `CommandSender`;
//! the thread owning a subsystem drains and applies them once per tick
//! through its `SubsystemManager`.

mod clock;
mod command;
mod queue;
mod sender;
mod manager;

pub use clock::{Clock, Timestamp, MonotonicClock, ManualClock};
pub use command::{Command, CommandTicket, Envelope};
pub(crate) use command::{
    ensure, ensure_unit, ensure_positive, ensure_finite3, ensure_color,
    ensure_name, ensure_targets,
};
pub use queue::{CommandQueue, DrainedBatch};
pub use sender::CommandSender;
pub use manager::{Subsystem, SubsystemManager, ApplyOutcome, DrainReport, ManagerStats};
