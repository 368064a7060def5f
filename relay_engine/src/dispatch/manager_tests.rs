/// Tests for SubsystemManager
///
/// Uses a small ledger subsystem whose commands can succeed, fail, panic,
/// target removable slots, or forward work to another queue.

use super::*;
use crate::dispatch::clock::ManualClock;
use slotmap::{new_key_type, SlotMap};
use std::time::Duration;

// ============================================================================
// Test subsystem
// ============================================================================

new_key_type! {
    struct CounterKey;
}

enum LedgerCommand {
    Record(u32),
    Bump(CounterKey),
    Fail,
    Panic,
    Forward(u32),
}

impl Command for LedgerCommand {
    fn label(&self) -> &'static str {
        match self {
            LedgerCommand::Record(_) => "Record",
            LedgerCommand::Bump(_) => "Bump",
            LedgerCommand::Fail => "Fail",
            LedgerCommand::Panic => "Panic",
            LedgerCommand::Forward(_) => "Forward",
        }
    }
}

#[derive(Default)]
struct Ledger {
    applied: Vec<u32>,
    counters: SlotMap<CounterKey, u32>,
    forward_to: Option<CommandSender<LedgerCommand>>,
}

impl Subsystem for Ledger {
    type Command = LedgerCommand;
    const NAME: &'static str = "relay::TestLedger";

    fn apply(&mut self, command: LedgerCommand, _now: Timestamp) -> Result<ApplyOutcome> {
        match command {
            LedgerCommand::Record(value) => {
                self.applied.push(value);
                Ok(ApplyOutcome::Applied)
            }
            LedgerCommand::Bump(key) => match self.counters.get_mut(key) {
                Some(counter) => {
                    *counter += 1;
                    Ok(ApplyOutcome::Applied)
                }
                None => Ok(ApplyOutcome::Stale),
            },
            LedgerCommand::Fail => Err(Error::BackendError("ledger refused".to_string())),
            LedgerCommand::Panic => panic!("ledger exploded"),
            LedgerCommand::Forward(value) => {
                if let Some(sender) = &self.forward_to {
                    sender.enqueue(LedgerCommand::Record(value))?;
                }
                Ok(ApplyOutcome::Applied)
            }
        }
    }
}

fn create_manager() -> (SubsystemManager<Ledger>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let manager = SubsystemManager::new(Ledger::default(), QueueConfig::lenient(), clock.clone());
    (manager, clock)
}

// ============================================================================
// Tests: Apply order and counts
// ============================================================================

#[test]
fn test_drain_with_nothing_queued() {
    let (mut manager, clock) = create_manager();
    let report = manager.drain_and_apply(clock.now());

    assert!(report.is_empty());
    assert_eq!(report, DrainReport::default());
    assert_eq!(manager.stats().drains, 1);
}

#[test]
fn test_commands_applied_in_enqueue_order() {
    let (mut manager, clock) = create_manager();
    let sender = manager.sender();
    for value in [5, 1, 4, 2, 3] {
        sender.enqueue(LedgerCommand::Record(value)).unwrap();
    }

    let report = manager.drain_and_apply(clock.now());
    assert_eq!(report.applied, 5);
    assert_eq!(manager.state().applied, vec![5, 1, 4, 2, 3]);
}

#[test]
fn test_each_command_applied_exactly_once() {
    let (mut manager, clock) = create_manager();
    manager.enqueue(LedgerCommand::Record(1)).unwrap();
    manager.enqueue(LedgerCommand::Record(2)).unwrap();

    manager.drain_and_apply(clock.now());
    manager.drain_and_apply(clock.now());
    clock.advance(Duration::from_secs(60));
    manager.drain_and_apply(clock.now());

    assert_eq!(manager.state().applied, vec![1, 2]);
    assert_eq!(manager.stats().applied, 2);
    assert_eq!(manager.stats().drains, 3);
}

#[test]
fn test_commands_accumulate_between_drains() {
    let (mut manager, clock) = create_manager();
    manager.enqueue(LedgerCommand::Record(1)).unwrap();
    manager.enqueue(LedgerCommand::Record(2)).unwrap();
    assert_eq!(manager.queued(), 2);

    let report = manager.drain_and_apply(clock.now());
    assert_eq!(report.drained, 2);
    assert_eq!(manager.queued(), 0);
    assert_eq!(manager.stats().largest_batch, 2);
}

// ============================================================================
// Tests: Delayed commands
// ============================================================================

#[test]
fn test_delayed_command_waits_for_its_time() {
    let (mut manager, clock) = create_manager();
    let sender = manager.sender();
    sender.enqueue(LedgerCommand::Record(1)).unwrap();
    sender.enqueue_after(LedgerCommand::Record(2), Duration::from_millis(500)).unwrap();

    manager.drain_and_apply(clock.now());
    assert_eq!(manager.state().applied, vec![1]);
    assert_eq!(manager.next_due(), Some(Timestamp::from_millis(500)));

    clock.advance(Duration::from_millis(499));
    manager.drain_and_apply(clock.now());
    assert_eq!(manager.state().applied, vec![1]);

    clock.advance(Duration::from_millis(1));
    let report = manager.drain_and_apply(clock.now());
    assert_eq!(report.promoted, 1);
    assert_eq!(manager.state().applied, vec![1, 2]);
}

#[test]
fn test_due_delayed_applied_before_same_tick_immediate() {
    let (mut manager, clock) = create_manager();
    let sender = manager.sender();
    sender.enqueue_at(LedgerCommand::Record(10), Timestamp::from_millis(100)).unwrap();
    clock.advance(Duration::from_millis(150));
    sender.enqueue(LedgerCommand::Record(20)).unwrap();

    manager.drain_and_apply(clock.now());
    assert_eq!(manager.state().applied, vec![10, 20]);
}

#[test]
fn test_cancelled_command_never_applied() {
    let (mut manager, clock) = create_manager();
    let sender = manager.sender();
    let ticket = sender.enqueue_after(LedgerCommand::Record(1), Duration::from_millis(10)).unwrap();
    sender.enqueue(LedgerCommand::Record(2)).unwrap();

    assert!(sender.cancel(ticket));
    clock.advance(Duration::from_millis(20));
    manager.drain_and_apply(clock.now());

    assert_eq!(manager.state().applied, vec![2]);
}

// ============================================================================
// Tests: Stale targets
// ============================================================================

#[test]
fn test_stale_target_is_noop() {
    let (mut manager, clock) = create_manager();
    let live = manager.state_mut().counters.insert(0);
    let doomed = manager.state_mut().counters.insert(0);
    manager.state_mut().counters.remove(doomed);

    manager.enqueue(LedgerCommand::Bump(doomed)).unwrap();
    manager.enqueue(LedgerCommand::Bump(live)).unwrap();
    let report = manager.drain_and_apply(clock.now());

    assert_eq!(report.stale, 1);
    assert_eq!(report.applied, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(manager.state().counters[live], 1);
    assert_eq!(manager.state().counters.len(), 1);
}

#[test]
fn test_reused_slot_does_not_resolve_old_key() {
    let (mut manager, clock) = create_manager();
    let old = manager.state_mut().counters.insert(0);
    manager.state_mut().counters.remove(old);
    let new = manager.state_mut().counters.insert(0);

    manager.enqueue(LedgerCommand::Bump(old)).unwrap();
    let report = manager.drain_and_apply(clock.now());

    assert_eq!(report.stale, 1);
    assert_eq!(manager.state().counters[new], 0);
}

// ============================================================================
// Tests: Failure isolation
// ============================================================================

#[test]
fn test_failing_command_does_not_abort_batch() {
    let (mut manager, clock) = create_manager();
    manager.enqueue(LedgerCommand::Record(1)).unwrap();
    manager.enqueue(LedgerCommand::Record(2)).unwrap();
    manager.enqueue(LedgerCommand::Fail).unwrap();
    manager.enqueue(LedgerCommand::Record(4)).unwrap();
    manager.enqueue(LedgerCommand::Record(5)).unwrap();

    let report = manager.drain_and_apply(clock.now());

    assert_eq!(report.drained, 5);
    assert_eq!(report.applied, 4);
    assert_eq!(report.failed, 1);
    assert_eq!(manager.state().applied, vec![1, 2, 4, 5]);
}

#[test]
fn test_panicking_command_does_not_abort_batch() {
    let (mut manager, clock) = create_manager();
    manager.enqueue(LedgerCommand::Record(1)).unwrap();
    manager.enqueue(LedgerCommand::Record(2)).unwrap();
    manager.enqueue(LedgerCommand::Panic).unwrap();
    manager.enqueue(LedgerCommand::Record(4)).unwrap();
    manager.enqueue(LedgerCommand::Record(5)).unwrap();

    let report = manager.drain_and_apply(clock.now());

    assert_eq!(report.failed, 1);
    assert_eq!(manager.state().applied, vec![1, 2, 4, 5]);
    assert_eq!(manager.stats().failed, 1);
}

#[test]
#[should_panic(expected = "ledger exploded")]
fn test_panics_propagate_when_not_caught() {
    let (mut manager, clock) = create_manager();
    manager.set_catch_panics(false);
    manager.enqueue(LedgerCommand::Panic).unwrap();
    manager.drain_and_apply(clock.now());
}

#[test]
fn test_manager_usable_after_failures() {
    let (mut manager, clock) = create_manager();
    manager.enqueue(LedgerCommand::Panic).unwrap();
    manager.drain_and_apply(clock.now());

    manager.enqueue(LedgerCommand::Record(7)).unwrap();
    let report = manager.drain_and_apply(clock.now());
    assert_eq!(report.applied, 1);
    assert_eq!(manager.state().applied, vec![7]);
}

// ============================================================================
// Tests: Forwarding
// ============================================================================

#[test]
fn test_apply_can_enqueue_into_another_manager() {
    let (mut downstream, clock) = create_manager();
    let mut upstream = SubsystemManager::new(
        Ledger { forward_to: Some(downstream.sender()), ..Ledger::default() },
        QueueConfig::lenient(),
        clock.clone(),
    );

    upstream.enqueue(LedgerCommand::Forward(42)).unwrap();
    upstream.drain_and_apply(clock.now());
    assert_eq!(downstream.queued(), 1);

    downstream.drain_and_apply(clock.now());
    assert_eq!(downstream.state().applied, vec![42]);
}

#[test]
fn test_apply_can_enqueue_into_own_queue_for_next_tick() {
    let (mut manager, clock) = create_manager();
    let own = manager.sender();
    manager.state_mut().forward_to = Some(own);

    manager.enqueue(LedgerCommand::Forward(3)).unwrap();
    manager.drain_and_apply(clock.now());
    assert!(manager.state().applied.is_empty());

    manager.drain_and_apply(clock.now());
    assert_eq!(manager.state().applied, vec![3]);
}

#[test]
fn test_into_state_returns_owned_state() {
    let (mut manager, clock) = create_manager();
    manager.enqueue(LedgerCommand::Record(9)).unwrap();
    manager.drain_and_apply(clock.now());

    let ledger = manager.into_state();
    assert_eq!(ledger.applied, vec![9]);
}

#[test]
fn test_manager_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<SubsystemManager<Ledger>>();
    assert_send::<CommandSender<LedgerCommand>>();
}
