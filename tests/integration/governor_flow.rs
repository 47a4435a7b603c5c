//! Economic governor lifecycle tests.
//!
//! These tests walk the circuit breaker through CLOSED -> OPEN ->
//! HALF_OPEN -> CLOSED using a manual clock.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use waveplan::governor::{Admission, CircuitState, WINDOW};
use waveplan::Error;

use crate::fixtures::{strict_config, GovernorHarness};

const SONNET: &str = "claude-sonnet-4-20250514";
const OPUS: &str = "claude-3-opus-20240229";

/// Test: Request budget exhaustion
/// Given a limit of 10 calls per hour
/// When 10 calls have been recorded
/// Then the next admission trips the circuit for the cooldown
#[test]
fn test_rate_limit_lifecycle() {
    let harness = GovernorHarness::strict();
    let governor = &harness.governor;

    for i in 0..10 {
        let admission = governor.admit().unwrap();
        assert_eq!(admission.is_warning(), i >= 8, "call {} admission {:?}", i, admission);
        governor.record(SONNET, 1_000, 0);
    }

    let err = governor.admit().unwrap_err();
    match &err {
        Error::RateLimitExceeded { count, limit, .. } => {
            assert_eq!(*count, 10);
            assert_eq!(*limit, 10);
        }
        other => panic!("expected RateLimitExceeded, got {:?}", other),
    }
    assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
    assert_eq!(governor.state(), CircuitState::Open);

    // Still cooling down
    harness.clock.advance(Duration::from_secs(30));
    match governor.admit() {
        Err(Error::CircuitOpen { retry_after }) => assert_eq!(retry_after, Duration::from_secs(30)),
        other => panic!("expected CircuitOpen, got {:?}", other),
    }

    // Cooldown over, but the window is still full: stays half-open
    harness.clock.advance(Duration::from_secs(31));
    assert_eq!(governor.state(), CircuitState::HalfOpen);
    assert!(matches!(governor.admit(), Err(Error::RateLimitExceeded { .. })));
    assert_eq!(governor.state(), CircuitState::Open);

    // The hour rolls over and the cooldown ends: usage is gone, circuit closes
    harness.clock.advance(WINDOW + Duration::from_secs(1));
    assert_eq!(governor.state(), CircuitState::Closed);
    assert_eq!(governor.admit().unwrap(), Admission::Allowed);
    assert_eq!(governor.current_usage().request_count, 0);
}

/// Test: Probation in the warning band
/// Given a circuit that tripped with a 90 minute cooldown
/// When the cooldown ends with 8 of 10 calls in the window
/// Then calls are admitted with a warning and the circuit stays half-open
#[test]
fn test_half_open_warning_band() {
    let mut config = strict_config();
    config.cooldown_minutes = 90;
    let harness = GovernorHarness::new(config);
    let governor = &harness.governor;

    for _ in 0..10 {
        governor.record(SONNET, 1_000, 0);
    }
    assert!(matches!(governor.admit(), Err(Error::RateLimitExceeded { .. })));

    // The tripping calls age out while the circuit is still open; calls
    // already in flight keep being recorded.
    harness.clock.advance(Duration::from_secs(85 * 60));
    assert_eq!(governor.state(), CircuitState::Open);
    for _ in 0..8 {
        governor.record(SONNET, 1_000, 0);
    }

    harness.clock.advance(Duration::from_secs(6 * 60));
    assert_eq!(governor.state(), CircuitState::HalfOpen);
    match governor.admit().unwrap() {
        Admission::Warning { request_ratio, .. } => {
            assert!((request_ratio - 0.8).abs() < 1e-9);
        }
        other => panic!("expected a warning, got {:?}", other),
    }
    assert_eq!(governor.state(), CircuitState::HalfOpen);
    assert_eq!(governor.current_usage().request_count, 8);
}

#[test]
fn test_cost_limit_trips_circuit() {
    let harness = GovernorHarness::strict();
    let governor = &harness.governor;

    assert_eq!(governor.admit().unwrap(), Admission::Allowed);
    let record = governor.record(OPUS, 0, 100_000);
    assert!((record.cost - 7.5).abs() < 1e-9);

    let err = governor.admit().unwrap_err();
    assert!(matches!(err, Error::CostLimitExceeded { limit, .. } if limit == 1.0));
    assert!(err.is_retryable());
    assert_eq!(governor.state(), CircuitState::Open);
}

#[test]
fn test_cost_warning_before_limit() {
    let harness = GovernorHarness::strict();
    let governor = &harness.governor;

    // 0.3 + 0.3 + 0.3 = 0.9 of a $1 budget
    for _ in 0..3 {
        governor.record(SONNET, 100_000, 0);
    }

    match governor.admit().unwrap() {
        Admission::Warning {
            cost_ratio,
            request_ratio,
        } => {
            assert!((cost_ratio - 0.9).abs() < 1e-9);
            assert!((request_ratio - 0.3).abs() < 1e-9);
        }
        other => panic!("expected a warning, got {:?}", other),
    }
    assert_eq!(governor.state(), CircuitState::Closed);
}

#[test]
fn test_window_boundary_is_inclusive() {
    let harness = GovernorHarness::strict();
    let governor = &harness.governor;

    governor.record(SONNET, 1_000, 1_000);
    harness.clock.advance(WINDOW);
    assert_eq!(governor.current_usage().request_count, 1);

    harness.clock.advance(Duration::from_secs(1));
    let usage = governor.current_usage();
    assert_eq!(usage.request_count, 0);
    assert_eq!(usage.total_cost, 0.0);
}

#[test]
fn test_statistics_track_cooldown() {
    let harness = GovernorHarness::strict();
    let governor = &harness.governor;

    for _ in 0..10 {
        governor.record(SONNET, 10, 10);
    }
    assert!(governor.admit().is_err());

    let stats = governor.statistics();
    assert_eq!(stats.state, CircuitState::Open);
    assert_eq!(stats.time_until_reset_ms, 60_000);
    assert!((stats.request_utilization - 1.0).abs() < 1e-9);

    harness.clock.advance(Duration::from_secs(20));
    assert_eq!(governor.statistics().time_until_reset_ms, 40_000);
}

#[test]
fn test_unknown_service_uses_default_price() {
    let harness = GovernorHarness::new(Default::default());
    let record = harness.governor.record("some-future-model", 1_000_000, 0);
    assert!((record.cost - 3.0).abs() < 1e-9);
    assert_eq!(record.units, 1_000_000);
}

#[test]
fn test_reset_closes_and_clears() {
    let harness = GovernorHarness::strict();
    let governor = &harness.governor;

    governor.record(OPUS, 0, 1_000_000);
    assert!(governor.admit().is_err());

    governor.reset();
    assert_eq!(governor.state(), CircuitState::Closed);
    assert_eq!(governor.current_usage().request_count, 0);
    assert_eq!(governor.admit().unwrap(), Admission::Allowed);
}

/// Test: Concurrent recording
/// Given one governor shared across threads
/// When every thread records calls
/// Then no record is lost
#[test]
fn test_concurrent_records_are_all_counted() {
    let mut config = strict_config();
    config.max_requests_per_hour = 1_000;
    let harness = GovernorHarness::new(config);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let governor = Arc::clone(&harness.governor);
            thread::spawn(move || {
                for _ in 0..25 {
                    governor.record(SONNET, 1, 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(harness.governor.current_usage().request_count, 200);
}
