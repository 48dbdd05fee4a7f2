//! Async retry loop for store calls.

use std::future::Future;

use doer_core::retry::RetryPolicy;

use crate::error::StoreResult;

/// Run `op` until it succeeds, fails permanently, or `policy.max_attempts`
/// tries are used up. Only [transient](crate::StoreError::is_transient)
/// errors are retried; the delay grows by `policy.multiplier` per retry.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &'static str,
    mut op: F,
) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(
                    op = op_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Store call failed, retrying",
                );
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay);
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(op = op_name, attempt, error = %err, "Store call failed");
                return Err(err);
            }
        }
    }
}
