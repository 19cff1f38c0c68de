// Timing behavior of the polling primitive, on a paused tokio clock so the
// bounds can be asserted exactly instead of with slack.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use leodev_common::error::HarnessError;
use leodev_harness::waiters::{wait_until, Probe};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn timeout_fires_within_one_interval_of_the_bound() {
    let started = Instant::now();
    let result: Result<(), _> = wait_until(
        "a predicate that never holds",
        Duration::from_secs(5),
        Duration::from_secs(1),
        || async { Probe::Pending("still false".to_string()) },
    )
    .await;

    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_secs(5),
        "failed before the bound: {elapsed:?}"
    );
    assert!(
        elapsed <= Duration::from_secs(6),
        "failed more than one interval past the bound: {elapsed:?}"
    );

    match result {
        Err(HarnessError::Timeout {
            what,
            waited,
            last_observed,
        }) => {
            assert_eq!(what, "a predicate that never holds");
            assert!(waited >= Duration::from_secs(5));
            assert_eq!(last_observed, "still false");
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn probe_attempts_are_sequential_until_ready() {
    let attempts = AtomicU32::new(0);
    let value = wait_until(
        "third attempt succeeds",
        Duration::from_secs(30),
        Duration::from_secs(1),
        || {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n >= 3 {
                    Probe::Ready(n)
                } else {
                    Probe::Pending(format!("attempt {n}"))
                }
            }
        },
    )
    .await
    .unwrap();

    assert_eq!(value, 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn immediate_readiness_does_not_sleep() {
    let started = Instant::now();
    let value = wait_until(
        "instant",
        Duration::from_secs(5),
        Duration::from_secs(1),
        || async { Probe::Ready(42u64) },
    )
    .await
    .unwrap();

    assert_eq!(value, 42);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn probe_runs_at_least_once_even_with_a_zero_bound() {
    let attempts = AtomicU32::new(0);
    let result: Result<(), _> = wait_until(
        "zero bound",
        Duration::ZERO,
        Duration::from_secs(1),
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Probe::Pending("observed once".to_string()) }
        },
    )
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(HarnessError::Timeout { .. })));
}
