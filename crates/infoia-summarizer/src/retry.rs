//! Retry with exponential back-off and jitter for summarization calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (timeouts, network failures, 429, 5xx). Authentication
//! failures and malformed responses are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ServiceError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** call timeouts, connect/timeout transport failures, HTTP 429
/// and 5xx responses.
///
/// **Not retriable:** [`ServiceError::Unauthorized`] (the key will not start
/// working), [`ServiceError::Malformed`], and other 4xx statuses.
pub(crate) fn is_retriable(err: &ServiceError) -> bool {
    match err {
        ServiceError::Timeout { .. } => true,
        ServiceError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ServiceError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        ServiceError::Unauthorized { .. }
        | ServiceError::Malformed(_)
        | ServiceError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` up to `max_attempts` times in total, sleeping between
/// attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
///
/// Delay is capped at 60 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "summarization call failed, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}
