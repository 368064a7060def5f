use super::*;

// ============================================================================
// Timestamp
// ============================================================================

#[test]
fn test_timestamp_ordering() {
    assert!(Timestamp::from_millis(10) < Timestamp::from_millis(11));
    assert_eq!(Timestamp::ZERO, Timestamp::default());
}

#[test]
fn test_timestamp_add_duration() {
    let t = Timestamp::from_millis(250) + Duration::from_millis(500);
    assert_eq!(t, Timestamp::from_millis(750));
    assert_eq!(t.as_millis(), 750);
}

#[test]
fn test_timestamp_saturating_duration_since() {
    let early = Timestamp::from_millis(100);
    let late = Timestamp::from_millis(160);
    assert_eq!(late.saturating_duration_since(early), Duration::from_millis(60));
    assert_eq!(early.saturating_duration_since(late), Duration::ZERO);
}

#[test]
fn test_timestamp_from_secs_f64() {
    assert_eq!(Timestamp::from_secs_f64(1.5), Timestamp::from_millis(1500));
}

#[test]
fn test_timestamp_from_secs_f64_clamps_out_of_range() {
    assert_eq!(Timestamp::from_secs_f64(-2.0), Timestamp::ZERO);
    assert_eq!(Timestamp::from_secs_f64(f64::NAN), Timestamp::ZERO);
    assert_eq!(Timestamp::from_secs_f64(f64::INFINITY).as_duration(), Duration::MAX);
    assert_eq!(Timestamp::from_secs_f64(1e300).as_duration(), Duration::MAX);
}

// ============================================================================
// ManualClock
// ============================================================================

#[test]
fn test_manual_clock_starts_at_zero() {
    let clock = ManualClock::new();
    assert_eq!(clock.now(), Timestamp::ZERO);
}

#[test]
fn test_manual_clock_advance() {
    let clock = ManualClock::new();
    let t = clock.advance(Duration::from_millis(16));
    assert_eq!(t, Timestamp::from_millis(16));
    clock.advance(Duration::from_millis(16));
    assert_eq!(clock.now(), Timestamp::from_millis(32));
}

#[test]
fn test_manual_clock_set_never_goes_back() {
    let clock = ManualClock::starting_at(Timestamp::from_millis(1000));
    clock.set(Timestamp::from_millis(500));
    assert_eq!(clock.now(), Timestamp::from_millis(1000));
    clock.set(Timestamp::from_millis(1500));
    assert_eq!(clock.now(), Timestamp::from_millis(1500));
}

// ============================================================================
// MonotonicClock
// ============================================================================

#[test]
fn test_monotonic_clock_is_monotonic() {
    let clock = MonotonicClock::new();
    let a = clock.now();
    std::thread::sleep(Duration::from_millis(2));
    let b = clock.now();
    assert!(b > a);
}
