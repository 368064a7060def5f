/// Per-subsystem command queue.
///
/// Producers on any thread append under a single mutex; the owning thread
/// drains everything that is due in one locked swap, then applies the batch
/// with the lock released. The lock is never held while a command is applied.
///
/// Commands scheduled for the future wait in a delay buffer ordered by
/// `(scheduled time, enqueue sequence)` and are promoted on the first drain
/// whose `now` reaches their time. A command whose time had already passed
/// on the producer's clock goes straight to the pending list, unless a drain
/// runs with an earlier `now`; that drain moves it back to the delay buffer.
///
/// Batch order: promoted delayed commands first (by scheduled time, then
/// enqueue order), followed by the immediate commands in enqueue order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::config::QueueConfig;
use crate::error::{Error, Result};
use super::clock::{Clock, Timestamp};
use super::command::{Command, CommandTicket, Envelope};

/// Source of queue identities carried by tickets
static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// State shared between producers and the consumer, guarded by the queue lock
struct QueueState<C> {
    /// Commands ready for the next drain, in enqueue order
    pending: Vec<Envelope<C>>,
    /// Commands waiting for their scheduled time
    delayed: BTreeMap<(Timestamp, u64), Envelope<C>>,
    /// Sequence number handed to the next enqueued command
    next_seq: u64,
    /// Set once the backlog warning fired, cleared by the next drain
    backlog_warned: bool,
    /// Latest scheduled time among pending commands. Such a command was due
    /// on the producer's clock but may not be due for the drain's `now`.
    latest_pending_schedule: Option<Timestamp>,
}

/// Commands drained by one `drain_due` call
#[derive(Debug)]
pub struct DrainedBatch<C> {
    envelopes: Vec<Envelope<C>>,
    promoted: usize,
}

impl<C> DrainedBatch<C> {
    /// Number of commands in the batch
    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// How many of the leading commands came from the delay buffer
    pub fn promoted(&self) -> usize {
        self.promoted
    }

    pub fn envelopes(&self) -> &[Envelope<C>] {
        &self.envelopes
    }

    /// Commands in application order, without their envelopes
    pub fn into_commands(self) -> Vec<C> {
        self.envelopes.into_iter().map(Envelope::into_command).collect()
    }
}

impl<C> IntoIterator for DrainedBatch<C> {
    type Item = Envelope<C>;
    type IntoIter = std::vec::IntoIter<Envelope<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.envelopes.into_iter()
    }
}

/// Thread-safe FIFO plus delay buffer for one subsystem
pub struct CommandQueue<C: Command> {
    id: u64,
    name: &'static str,
    config: QueueConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState<C>>,
}

impl<C: Command> CommandQueue<C> {
    /// Create an empty queue
    ///
    /// # Arguments
    ///
    /// * `name` - Log source for this queue (e.g. "relay::GraphicsQueue")
    /// * `config` - Validation and backlog settings
    /// * `clock` - Time source deciding whether a scheduled command is already due
    pub fn new(name: &'static str, config: QueueConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            config,
            clock,
            state: Mutex::new(QueueState {
                pending: Vec::new(),
                delayed: BTreeMap::new(),
                next_seq: 0,
                backlog_warned: false,
                latest_pending_schedule: None,
            }),
        }
    }

    /// Process-unique identity, also carried by every ticket this queue issues
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // Nothing panics while holding the lock, so a poisoned lock still
    // guards consistent lists.
    fn lock(&self) -> MutexGuard<'_, QueueState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a command
    ///
    /// Goes to the pending list when `scheduled` is `None` or not after the
    /// clock's current time, otherwise to the delay buffer. The lock is held
    /// only for the append.
    ///
    /// # Errors
    ///
    /// - `Error::MalformedCommand` if `Command::validate` fails and the queue
    ///   is not in strict mode (strict mode panics instead)
    /// - `Error::OutOfMemory` if the pending list cannot grow. Growth of the
    ///   delay buffer is not checked: `BTreeMap` has no fallible insert, so
    ///   allocation failure there aborts like any other std allocation.
    pub fn enqueue(&self, command: C, scheduled: Option<Timestamp>) -> Result<CommandTicket> {
        if let Err(error) = command.validate() {
            if self.config.strict_validation {
                panic!("{}: malformed {} command: {}", self.name, command.label(), error);
            }
            crate::engine_error!(self.name, "Rejected {} command: {}", command.label(), error);
            return Err(error);
        }

        let delay_until = scheduled.filter(|time| *time > self.clock.now());

        let mut state = self.lock();
        let ticket = CommandTicket { queue: self.id, seq: state.next_seq, scheduled };

        match delay_until {
            None => {
                if state.pending.try_reserve(1).is_err() {
                    drop(state);
                    crate::engine_error!(self.name,
                        "Cannot grow pending list for {} command", command.label());
                    return Err(Error::OutOfMemory);
                }
                if let Some(time) = scheduled {
                    state.latest_pending_schedule = state.latest_pending_schedule.max(Some(time));
                }
                state.pending.push(Envelope { ticket, command });
            }
            Some(time) => {
                state.delayed.insert((time, ticket.seq), Envelope { ticket, command });
            }
        }
        state.next_seq += 1;

        let backlog = state.pending.len();
        let warn = backlog > self.config.backlog_warning && !state.backlog_warned;
        if warn {
            state.backlog_warned = true;
        }
        drop(state);

        if warn {
            crate::engine_warn!(self.name,
                "{} commands pending, is the owning thread draining?", backlog);
        }

        Ok(ticket)
    }

    /// Take every command due at `now`
    ///
    /// Promotes due delayed commands, swaps the pending list out, releases
    /// the lock and returns the batch. An empty batch is not an error.
    pub fn drain_due(&self, now: Timestamp) -> DrainedBatch<C> {
        let mut envelopes = Vec::new();
        let promoted = self.drain_due_into(now, &mut envelopes);
        DrainedBatch { envelopes, promoted }
    }

    /// Like `drain_due`, but fills a caller-owned buffer
    ///
    /// When nothing is promoted and `out` is empty, the pending list and `out`
    /// are swapped, so a consumer that hands back its emptied buffer every
    /// tick never reallocates. Returns the number of promoted commands, which
    /// lead the batch.
    pub fn drain_due_into(&self, now: Timestamp, out: &mut Vec<Envelope<C>>) -> usize {
        let mut state = self.lock();

        // A producer may have classified a command as due against a clock
        // reading taken after this drain's `now`; send it back to wait.
        if state.latest_pending_schedule.is_some_and(|time| time > now) {
            let pending = std::mem::take(&mut state.pending);
            for envelope in pending {
                match envelope.ticket.scheduled {
                    Some(time) if time > now => {
                        state.delayed.insert((time, envelope.ticket.seq), envelope);
                    }
                    _ => state.pending.push(envelope),
                }
            }
        }
        state.latest_pending_schedule = None;

        let mut promoted = 0;
        while let Some(entry) = state.delayed.first_entry() {
            if entry.key().0 > now {
                break;
            }
            out.push(entry.remove());
            promoted += 1;
        }

        if out.is_empty() {
            std::mem::swap(&mut state.pending, out);
        } else {
            out.append(&mut state.pending);
        }
        state.backlog_warned = false;
        drop(state);

        if promoted > 0 {
            crate::engine_debug!(self.name, "Promoted {} delayed commands at {:?}", promoted, now);
        }

        promoted
    }

    /// Remove a command that has not been drained yet
    ///
    /// Returns false if the command was already drained, cancelled, or never
    /// belonged to this queue.
    pub fn cancel(&self, ticket: CommandTicket) -> bool {
        if ticket.queue != self.id {
            return false;
        }
        let mut state = self.lock();

        if let Some(time) = ticket.scheduled {
            if state.delayed.remove(&(time, ticket.seq)).is_some() {
                return true;
            }
        }

        match state.pending.iter().position(|e| e.ticket.seq == ticket.seq) {
            Some(index) => {
                state.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Total commands not yet drained
    pub fn len(&self) -> usize {
        let state = self.lock();
        state.pending.len() + state.delayed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn delayed_len(&self) -> usize {
        self.lock().delayed.len()
    }

    /// Earliest scheduled time in the delay buffer
    ///
    /// Lets an owning thread with nothing pending sleep until the next
    /// delayed command becomes due.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.lock().delayed.first_key_value().map(|(key, _)| key.0)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
