/// Subsystem manager: owns one subsystem's live state and the consumer side
/// of its command queue.
///
/// `drain_and_apply` takes `&mut self`, so one manager can never be drained
/// from two threads at once. Move the manager to the thread that owns the
/// subsystem's resources and call `drain_and_apply` once per tick there.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use crate::config::QueueConfig;
use crate::error::{Error, Result};
use super::clock::{Clock, Timestamp};
use super::command::{Command, CommandTicket, Envelope};
use super::queue::CommandQueue;
use super::sender::CommandSender;

/// Result of applying one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The command changed subsystem state
    Applied,
    /// None of the command's targets resolved; state left unchanged
    Stale,
}

/// State owned by a subsystem thread, mutated only by applying commands
pub trait Subsystem: Send {
    /// Closed set of commands this subsystem understands
    type Command: Command;

    /// Log source for this subsystem (e.g. "relay::GraphicsManager")
    const NAME: &'static str;

    /// Apply one command against the subsystem state
    ///
    /// Return `Ok(ApplyOutcome::Stale)` when the command's targets no longer
    /// exist. Errors are logged by the manager and do not stop the batch.
    fn apply(&mut self, command: Self::Command, now: Timestamp) -> Result<ApplyOutcome>;
}

/// Counts for one `drain_and_apply` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Commands taken from the queue
    pub drained: usize,
    /// How many of those came from the delay buffer
    pub promoted: usize,
    /// Commands that changed state
    pub applied: usize,
    /// Commands whose targets were gone
    pub stale: usize,
    /// Commands that returned an error or panicked
    pub failed: usize,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.drained == 0
    }
}

/// Cumulative manager statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Number of drain_and_apply calls
    pub drains: u64,
    pub applied: u64,
    pub stale: u64,
    pub failed: u64,
    /// Largest batch seen in a single drain
    pub largest_batch: usize,
}

pub struct SubsystemManager<S: Subsystem> {
    queue: Arc<CommandQueue<S::Command>>,
    state: S,
    /// Drain buffer handed back to the queue every tick
    batch: Vec<Envelope<S::Command>>,
    catch_panics: bool,
    stats: ManagerStats,
}

impl<S: Subsystem> SubsystemManager<S> {
    /// Create a manager and its queue
    ///
    /// # Arguments
    ///
    /// * `state` - Subsystem state, owned exclusively by the manager
    /// * `config` - Queue configuration
    /// * `clock` - Clock the queue uses to classify scheduled commands
    pub fn new(state: S, config: QueueConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_queue(state, Arc::new(CommandQueue::new(S::NAME, config, clock)))
    }

    /// Create a manager consuming an existing queue
    pub fn with_queue(state: S, queue: Arc<CommandQueue<S::Command>>) -> Self {
        Self {
            queue,
            state,
            batch: Vec::new(),
            catch_panics: true,
            stats: ManagerStats::default(),
        }
    }

    /// Producer handle for this manager's queue
    pub fn sender(&self) -> CommandSender<S::Command> {
        CommandSender::new(self.queue.clone())
    }

    /// Enqueue from the owning thread (same as going through a sender)
    pub fn enqueue(&self, command: S::Command) -> Result<CommandTicket> {
        self.queue.enqueue(command, None)
    }

    /// Choose whether panics inside `Subsystem::apply` are caught
    pub fn set_catch_panics(&mut self, catch_panics: bool) {
        self.catch_panics = catch_panics;
    }

    /// Drain every command due at `now` and apply them in order
    ///
    /// The queue lock is released before the first command is applied.
    /// A failing command is logged and counted; the rest of the batch still
    /// runs.
    pub fn drain_and_apply(&mut self, now: Timestamp) -> DrainReport {
        let mut batch = std::mem::take(&mut self.batch);
        let promoted = self.queue.drain_due_into(now, &mut batch);

        let mut report = DrainReport {
            drained: batch.len(),
            promoted,
            ..DrainReport::default()
        };

        for envelope in batch.drain(..) {
            let label = envelope.command.label();
            let seq = envelope.ticket.sequence();

            match self.apply_one(envelope.command, now) {
                Ok(ApplyOutcome::Applied) => {
                    report.applied += 1;
                    crate::engine_trace!(S::NAME, "{} (#{}) applied", label, seq);
                }
                Ok(ApplyOutcome::Stale) => {
                    report.stale += 1;
                    crate::engine_debug!(S::NAME,
                        "{} (#{}) targets nothing live, skipped", label, seq);
                }
                Err(error) => {
                    report.failed += 1;
                    crate::engine_error!(S::NAME, "{} (#{}) failed: {}", label, seq, error);
                }
            }
        }
        self.batch = batch;

        self.stats.drains += 1;
        self.stats.applied += report.applied as u64;
        self.stats.stale += report.stale as u64;
        self.stats.failed += report.failed as u64;
        self.stats.largest_batch = self.stats.largest_batch.max(report.drained);

        if report.failed > 0 {
            crate::engine_warn!(S::NAME,
                "Drain applied {}/{} commands ({} failed)", report.applied, report.drained, report.failed);
        }

        report
    }

    fn apply_one(&mut self, command: S::Command, now: Timestamp) -> Result<ApplyOutcome> {
        if !self.catch_panics {
            return self.state.apply(command, now);
        }

        let state = &mut self.state;
        match panic::catch_unwind(AssertUnwindSafe(|| state.apply(command, now))) {
            Ok(result) => result,
            Err(payload) => Err(Error::BackendError(
                format!("panicked while applying: {}", panic_message(payload.as_ref()))
            )),
        }
    }

    /// Subsystem state (owning thread only)
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable subsystem state (owning thread only)
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Consume the manager and return its state
    pub fn into_state(self) -> S {
        self.state
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    /// Commands waiting in the queue (pending and delayed)
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Earliest scheduled time still in the delay buffer
    pub fn next_due(&self) -> Option<Timestamp> {
        self.queue.next_due()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
