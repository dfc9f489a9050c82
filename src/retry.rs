//! Deadline-bounded retry of remote calls.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::ApiError;

/// How long resource creation is retried.
pub const CREATE_TIMEOUT: Duration = Duration::from_secs(20);

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Run `operation` until it succeeds, fails permanently, or `timeout` passes.
///
/// Errors for which [`ApiError::is_retryable`] holds are retried with
/// exponential backoff; anything else is returned immediately. When the
/// deadline passes the last error is returned as [`ApiError::Timeout`].
pub async fn retry_context<T, F, Fut>(timeout: Duration, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let deadline = Instant::now() + timeout;
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt: u32 = 1;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        let now = Instant::now();
        if now >= deadline {
            warn!(attempt, error = %err, "Giving up after {:?}", timeout);
            return Err(ApiError::Timeout {
                timeout,
                source: Box::new(err),
            });
        }

        let wait = backoff.min(deadline - now);
        debug!(attempt, error = %err, wait_ms = wait.as_millis() as u64, "Retrying");
        tokio::time::sleep(wait).await;

        backoff = (backoff * 2).min(MAX_BACKOFF);
        attempt += 1;
    }
}
