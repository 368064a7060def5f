/// Producer handle to a subsystem queue.
///
/// This is the only way code outside a subsystem's owning thread affects
/// that subsystem. Clones share the same queue and may be sent to any
/// thread.

use std::sync::Arc;
use std::time::Duration;
use crate::error::Result;
use super::clock::Timestamp;
use super::command::{Command, CommandTicket};
use super::queue::CommandQueue;

pub struct CommandSender<C: Command> {
    queue: Arc<CommandQueue<C>>,
}

impl<C: Command> Clone for CommandSender<C> {
    fn clone(&self) -> Self {
        Self { queue: self.queue.clone() }
    }
}

impl<C: Command> CommandSender<C> {
    pub(crate) fn new(queue: Arc<CommandQueue<C>>) -> Self {
        Self { queue }
    }

    /// Enqueue a command for the next drain
    pub fn enqueue(&self, command: C) -> Result<CommandTicket> {
        self.queue.enqueue(command, None)
    }

    /// Enqueue a command that must not be applied before `at`
    pub fn enqueue_at(&self, command: C, at: Timestamp) -> Result<CommandTicket> {
        self.queue.enqueue(command, Some(at))
    }

    /// Enqueue a command that must not be applied before `delay` from now
    /// (as measured by the queue's clock)
    pub fn enqueue_after(&self, command: C, delay: Duration) -> Result<CommandTicket> {
        let at = self.queue.clock().now() + delay;
        self.queue.enqueue(command, Some(at))
    }

    /// Withdraw a command that has not been drained yet
    pub fn cancel(&self, ticket: CommandTicket) -> bool {
        self.queue.cancel(ticket)
    }

    /// Commands waiting in the queue (pending and delayed)
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_name(&self) -> &'static str {
        self.queue.name()
    }

    /// Current time on the queue's clock
    pub fn now(&self) -> Timestamp {
        self.queue.clock().now()
    }

    /// Whether both senders feed the same queue
    pub fn same_queue(&self, other: &CommandSender<C>) -> bool {
        Arc::ptr_eq(&self.queue, &other.queue)
    }
}
