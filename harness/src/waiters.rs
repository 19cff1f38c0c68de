//! Bounded polling.
//!
//! The devnet exposes no push notifications, so "wait until X" is always a
//! poll loop. [`wait_until`] is the single primitive behind node readiness,
//! height thresholds and transaction confirmation; attempts are strictly
//! sequential with a fixed sleep between them, and the timeout error carries
//! the last observation for diagnostics.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use leodev_common::error::HarnessError;

/// One poll attempt's verdict.
#[derive(Debug)]
pub enum Probe<T> {
    Ready(T),
    /// Not there yet; the string is what was observed, kept for the
    /// eventual timeout error.
    Pending(String),
}

/// Repeatedly evaluate `probe` until it is [`Probe::Ready`] or `timeout`
/// elapses. The bound is checked after each attempt, so a probe that never
/// succeeds fails no earlier than `timeout` and no later than `timeout`
/// plus one `interval`.
pub async fn wait_until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T, HarnessError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    let started = Instant::now();
    let mut last_observed = String::from("nothing observed yet");

    loop {
        match probe().await {
            Probe::Ready(value) => return Ok(value),
            Probe::Pending(observation) => last_observed = observation,
        }

        if started.elapsed() >= timeout {
            return Err(HarnessError::Timeout {
                what: what.to_string(),
                waited: started.elapsed(),
                last_observed,
            });
        }

        sleep(interval).await;
    }
}

/// Poll the node until its height reaches `min_height`. Unreachable reads
/// count as pending within the bound; the node routinely drops a few probes
/// while catching up after a broadcast.
pub async fn wait_for_min_height(
    client: &crate::query::ChainClient,
    min_height: u64,
    timeout: Duration,
    interval: Duration,
) -> Result<u64, HarnessError> {
    let what = format!("block height >= {min_height}");
    wait_until(&what, timeout, interval, move || async move {
        match client.latest_height().await {
            Ok(height) if height >= min_height => Probe::Ready(height),
            Ok(height) => Probe::Pending(format!("height {height}")),
            Err(err) => Probe::Pending(err.to_string()),
        }
    })
    .await
}
