//! Retry and backoff policy.
//!
//! This module encapsulates error classification (timeouts, throttling,
//! gateway timeouts) and jittered exponential backoff so that the client,
//! the pagination aggregator and the poller share one consistent policy.

mod classify;
mod policy;
mod run;

pub use classify::{classify, is_retryable, is_timeout_error};
pub use policy::{Backoff, ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
