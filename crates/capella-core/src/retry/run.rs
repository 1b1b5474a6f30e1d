//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::error::ClientError;
use std::time::Instant;

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
///
/// The closure must repeat the exact same request on every call. When the
/// next wait would cross `policy.timeout`, the last error is returned wrapped
/// in `ClientError::RetryTimeout`.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, ClientError>
where
    F: FnMut() -> Result<T, ClientError>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        if Instant::now() + d >= deadline {
                            tracing::warn!(attempt, error = %e, "retry window exhausted");
                            return Err(ClientError::RetryTimeout {
                                timeout: policy.timeout,
                                source: Box::new(e),
                            });
                        }
                        tracing::debug!(attempt, ?kind, delay = ?d, error = %e, "retrying request");
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
