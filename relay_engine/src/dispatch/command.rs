/// Command objects and the envelope the queue wraps them in.
///
/// A command is plain data describing one requested state change. Each
/// subsystem defines its own closed enum of commands; the enum variant is the
/// command kind and its fields are the payload. Target fields are slotmap
/// keys, which never own the target and may stop resolving before the
/// command is applied.

use glam::{Vec3, Vec4};
use crate::error::{Error, Result};
use super::clock::Timestamp;

/// A command consumed by one subsystem.
pub trait Command: Send + 'static {
    /// Name of the command kind, used in logs and reports
    fn label(&self) -> &'static str;

    /// Check the preconditions the enum shape cannot express
    /// (finite vectors, ranges, non-empty names and target lists).
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Identifies one enqueued command within its queue.
///
/// Returned by every enqueue call and accepted by `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandTicket {
    /// Identity of the issuing queue
    pub(crate) queue: u64,
    pub(crate) seq: u64,
    pub(crate) scheduled: Option<Timestamp>,
}

impl CommandTicket {
    /// Enqueue order within the queue (strictly increasing)
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    /// Identity of the queue that issued the ticket (unique per process)
    pub fn queue_id(&self) -> u64 {
        self.queue
    }

    /// Delivery time requested at enqueue, if any
    pub fn scheduled(&self) -> Option<Timestamp> {
        self.scheduled
    }
}

/// A command together with its queue bookkeeping
#[derive(Debug)]
pub struct Envelope<C> {
    pub ticket: CommandTicket,
    pub command: C,
}

impl<C> Envelope<C> {
    pub fn into_command(self) -> C {
        self.command
    }

    pub fn scheduled(&self) -> Option<Timestamp> {
        self.ticket.scheduled
    }
}

// ===== VALIDATION HELPERS =====

pub(crate) fn ensure(condition: bool, label: &str, detail: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::MalformedCommand(format!("{}: {}", label, detail())))
    }
}

pub(crate) fn ensure_unit(label: &str, field: &str, value: f32) -> Result<()> {
    ensure((0.0..=1.0).contains(&value), label, || {
        format!("{} {} outside [0, 1]", field, value)
    })
}

pub(crate) fn ensure_positive(label: &str, field: &str, value: f32) -> Result<()> {
    ensure(value.is_finite() && value > 0.0, label, || {
        format!("{} must be finite and positive, got {}", field, value)
    })
}

pub(crate) fn ensure_finite3(label: &str, field: &str, value: Vec3) -> Result<()> {
    ensure(value.is_finite(), label, || format!("{} {:?} is not finite", field, value))
}

pub(crate) fn ensure_color(label: &str, value: Vec4) -> Result<()> {
    ensure(
        value.is_finite() && value.cmpge(Vec4::ZERO).all() && value.cmple(Vec4::ONE).all(),
        label,
        || format!("color {:?} outside [0, 1]", value),
    )
}

pub(crate) fn ensure_name(label: &str, field: &str, value: &str) -> Result<()> {
    ensure(!value.trim().is_empty(), label, || format!("{} is empty", field))
}

pub(crate) fn ensure_targets<T>(label: &str, targets: &[T]) -> Result<()> {
    ensure(!targets.is_empty(), label, || "target list is empty".to_string())
}
