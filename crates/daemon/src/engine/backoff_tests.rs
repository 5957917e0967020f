// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use sp_core::FakeClock;

use super::BackoffTable;

#[test]
fn delays_double_from_base_and_cap_at_two_minutes() {
    let clock = FakeClock::new();
    let mut backoff = BackoffTable::new(clock);

    let expected = [5u64, 10, 20, 40, 80, 120, 120];
    for secs in expected {
        assert_eq!(backoff.record_failure("demo"), Duration::from_secs(secs));
    }
}

#[test]
fn backoff_window_expires_with_time() {
    let clock = FakeClock::new();
    let mut backoff = BackoffTable::new(clock.clone());

    backoff.record_failure("demo");
    assert!(backoff.in_backoff("demo"));

    clock.advance(Duration::from_secs(4));
    assert!(backoff.in_backoff("demo"));

    clock.advance(Duration::from_secs(2));
    assert!(!backoff.in_backoff("demo"));

    // The window expired, but the failure count did not reset: the next
    // failure is the second in the sequence.
    assert_eq!(backoff.record_failure("demo"), Duration::from_secs(10));
}

#[test]
fn success_resets_the_sequence() {
    let clock = FakeClock::new();
    let mut backoff = BackoffTable::new(clock);

    backoff.record_failure("demo");
    backoff.record_failure("demo");
    backoff.clear("demo");
    assert!(!backoff.in_backoff("demo"));
    assert_eq!(backoff.record_failure("demo"), Duration::from_secs(5));
}

#[test]
fn sprites_back_off_independently() {
    let clock = FakeClock::new();
    let mut backoff = BackoffTable::new(clock);

    backoff.record_failure("a");
    backoff.record_failure("a");
    assert_eq!(backoff.record_failure("b"), Duration::from_secs(5));
    assert!(backoff.in_backoff("a"));
    assert!(backoff.in_backoff("b"));
}

#[test]
fn network_up_clears_every_sprite() {
    let clock = FakeClock::new();
    let mut backoff = BackoffTable::new(clock);

    backoff.record_failure("a");
    backoff.record_failure("b");
    backoff.clear_all();
    assert!(!backoff.in_backoff("a"));
    assert!(!backoff.in_backoff("b"));
}
