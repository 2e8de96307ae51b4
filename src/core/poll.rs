// src/core/poll.rs

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Retry budget and cadence for [`wait_for`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub poll_interval: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            max_retries: 5,
        }
    }
}

/// The retry budget ran out before the operation reached its target state.
/// Carries the last observed result as a diagnostic payload.
#[derive(Debug)]
pub struct OperationTimeout<T> {
    pub last_result: T,
    pub attempts: u32,
}

impl<T: fmt::Debug> fmt::Display for OperationTimeout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operation never succeeded within {} attempt(s); last result: {:?}",
            self.attempts, self.last_result
        )
    }
}

impl<T: fmt::Debug> std::error::Error for OperationTimeout<T> {}

/// Polls `operation` until `is_done` accepts its result.
///
/// The operation is re-invoked from scratch on every attempt (nothing is
/// cached or deduped), so it must be idempotent or safely re-callable. An
/// operation error propagates immediately without consuming the budget; a
/// result that never satisfies `is_done` exhausts `max_retries` and fails
/// with [`OperationTimeout`]. Total invocations on timeout: 1 + max_retries.
pub async fn wait_for<T, Op, Fut>(
    operation: Op,
    is_done: impl Fn(&T) -> bool,
    policy: RetryPolicy,
) -> Result<T>
where
    T: fmt::Debug + Send + Sync + 'static,
    Op: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries_left = policy.max_retries;
    let mut attempts: u32 = 1;

    loop {
        let result = operation().await?;
        if is_done(&result) {
            return Ok(result);
        }
        if retries_left == 0 {
            return Err(anyhow::Error::new(OperationTimeout {
                last_result: result,
                attempts,
            }));
        }
        retries_left -= 1;
        attempts += 1;
        log::debug!(
            "Operation not finished yet; retrying in {:?} ({} retr{} left)",
            policy.poll_interval,
            retries_left,
            if retries_left == 1 { "y" } else { "ies" }
        );
        tokio::time::sleep(policy.poll_interval).await;
    }
}
