//! Convergence waits
//!
//! A [`ConvergenceWaiter`] evaluates a [`Predicate`] against external
//! state until it is satisfied or the given timeout elapses.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::debug;

use crate::error::{Error, Result};

/// Last failure reported when the deadline passes during an evaluation
pub const UNFINISHED_EVALUATION: &str = "evaluation did not complete";

/// Reason why a predicate is not satisfied
#[derive(Debug)]
pub enum PollFailure {
    /// The condition does not hold yet; the predicate is evaluated again
    /// after the poll interval.
    Pending(String),
    /// Polling stops and the error is returned to the caller.
    Fatal(Error),
}

impl PollFailure {
    pub fn pending(reason: impl Into<String>) -> Self {
        PollFailure::Pending(reason.into())
    }
}

impl From<Error> for PollFailure {
    fn from(error: Error) -> Self {
        PollFailure::Fatal(error)
    }
}

/// A condition on external state which is re-evaluated on every poll
///
/// Closures returning a future are predicates, so a wait can be written
/// as
///
/// ```ignore
/// waiter.wait_for("pod to be ready", timeout, || async { check(&client).await }).await?;
/// ```
#[async_trait]
pub trait Predicate: Send {
    /// Queries the current state; must not modify it.
    async fn evaluate(&mut self) -> Result<(), PollFailure>;
}

#[async_trait]
impl<F, Fut> Predicate for F
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<(), PollFailure>> + Send,
{
    async fn evaluate(&mut self) -> Result<(), PollFailure> {
        (*self)().await
    }
}

/// Polls predicates with a fixed interval
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConvergenceWaiter {
    interval: Duration,
}

impl Default for ConvergenceWaiter {
    fn default() -> Self {
        ConvergenceWaiter::new(Duration::from_secs(5))
    }
}

impl ConvergenceWaiter {
    /// Creates a waiter which sleeps `interval` between two evaluations.
    pub fn new(interval: Duration) -> Self {
        ConvergenceWaiter { interval }
    }

    /// Waits until `predicate` is satisfied.
    ///
    /// The predicate is evaluated at least once, also if `timeout` is
    /// zero. A [`PollFailure::Fatal`] is returned immediately. If the
    /// predicate is still pending when `timeout` has elapsed then an
    /// [`Error::Timeout`] is returned which names `condition` and the
    /// last pending reason. The final sleep is shortened so that the last
    /// evaluation happens at the deadline. An evaluation still running half
    /// an interval after the deadline is abandoned.
    pub async fn wait_for<P>(&self, condition: &str, timeout: Duration, mut predicate: P) -> Result<()>
    where
        P: Predicate,
    {
        let start = Instant::now();
        // The last evaluation starts at the deadline and may run for half an
        // interval.
        let cutoff = start + timeout + self.interval / 2;
        let mut evaluations = 0u32;

        loop {
            evaluations += 1;

            let reason = match timeout_at(cutoff, predicate.evaluate()).await {
                Ok(Ok(())) => {
                    debug!(condition, evaluations, "Condition satisfied");
                    return Ok(());
                }
                Ok(Err(PollFailure::Pending(reason))) => reason,
                Ok(Err(PollFailure::Fatal(error))) => return Err(error),
                Err(_) => {
                    debug!(condition, evaluations, "Evaluation abandoned at the deadline");
                    return Err(Error::Timeout {
                        condition: condition.to_owned(),
                        timeout,
                        last_failure: String::from(UNFINISHED_EVALUATION),
                    });
                }
            };

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(Error::Timeout {
                    condition: condition.to_owned(),
                    timeout,
                    last_failure: reason,
                });
            }

            debug!(condition, evaluations, %reason, "Condition not satisfied yet");
            sleep(self.interval.min(timeout - elapsed)).await;
        }
    }
}
