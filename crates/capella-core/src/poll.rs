//! Bounded polling of long-running server-side operations.
//!
//! Each round goes `Waiting -> Checking`, then either loops through
//! `Retrying` with a longer backoff or ends. The terminal states are the
//! return value: `Ok(())` once satisfied, `Err` once failed. A wall-clock deadline
//! bounds the whole loop and cuts any wait short. A failed status check is
//! taken as "not visible yet" and retried, since the resource may not exist
//! until the operation has progressed.

use crate::error::ClientError;
use crate::retry::Backoff;
use crate::transport::Response;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Minimal status envelope returned by status endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Timing of a poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Wait before the first check.
    pub initial_delay: Duration,
    /// Wait between checks; attempt `n` waits `backoff.delay(n)`.
    pub backoff: Backoff,
    /// Hard bound on the whole loop.
    pub timeout: Duration,
    /// Optional cap on checks that did not reach the target state.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(60),
            backoff: Backoff::operation(),
            timeout: Duration::from_secs(60 * 60),
            max_attempts: None,
        }
    }
}

/// Non-terminal phase of the poll state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Checking,
    Retrying,
}

/// Mutable state of one poll loop.
#[derive(Debug)]
struct PollState<'a> {
    attempt: u32,
    deadline: Instant,
    desired: &'a str,
    next_wait: Duration,
    phase: Phase,
}

impl PollState<'_> {
    fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Drives status checks until the target state, the deadline, or a fatal
/// error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `check` until its `status` equals `desired`.
    pub fn wait_for<F>(&self, desired: &str, mut check: F) -> Result<(), ClientError>
    where
        F: FnMut() -> Result<Response, ClientError>,
    {
        let mut state = self.start(desired);
        self.drive(&mut state, "operation", &mut check)
    }

    /// Poll each named sub-operation in order until every one is satisfied.
    ///
    /// The cursor only advances once the current name reaches `desired`; the
    /// deadline covers the whole batch and the backoff restarts per name.
    pub fn wait_for_all<S, F>(&self, desired: &str, names: &[S], mut check: F) -> Result<(), ClientError>
    where
        S: AsRef<str>,
        F: FnMut(&str) -> Result<Response, ClientError>,
    {
        let mut state = self.start(desired);
        for (i, name) in names.iter().enumerate() {
            let name = name.as_ref();
            if i > 0 {
                state.attempt = 0;
                state.next_wait = self.config.initial_delay;
                state.phase = Phase::Waiting;
            }
            self.drive(&mut state, name, &mut || check(name))?;
            tracing::info!(name, done = i + 1, total = names.len(), "sub-operation satisfied");
        }
        Ok(())
    }

    fn start<'a>(&self, desired: &'a str) -> PollState<'a> {
        PollState {
            attempt: 0,
            deadline: Instant::now() + self.config.timeout,
            desired,
            next_wait: self.config.initial_delay,
            phase: Phase::Waiting,
        }
    }

    fn drive<F>(&self, state: &mut PollState<'_>, label: &str, check: &mut F) -> Result<(), ClientError>
    where
        F: FnMut() -> Result<Response, ClientError>,
    {
        loop {
            match state.phase {
                Phase::Waiting => {
                    std::thread::sleep(state.next_wait.min(state.remaining()));
                    if state.expired() {
                        tracing::warn!(label, attempt = state.attempt, "poll deadline elapsed");
                        return Err(ClientError::PollTimeout(self.config.timeout));
                    }
                    state.phase = Phase::Checking;
                }
                Phase::Checking => {
                    state.phase = Phase::Retrying;
                    match check() {
                        Ok(response) => {
                            let status: StatusResponse = match serde_json::from_slice(&response.body) {
                                Ok(s) => s,
                                Err(e) => return Err(ClientError::Decode(e)),
                            };
                            tracing::debug!(label, attempt = state.attempt, status = %status.status, "checked status");
                            if status.status == state.desired {
                                return Ok(());
                            }
                        }
                        Err(e) => {
                            tracing::debug!(label, attempt = state.attempt, error = %e, "status not available yet");
                        }
                    }
                }
                Phase::Retrying => {
                    state.attempt += 1;
                    if let Some(max) = self.config.max_attempts {
                        if state.attempt >= max {
                            return Err(ClientError::MaxAttemptsExceeded(max));
                        }
                    }
                    if state.expired() {
                        tracing::warn!(label, attempt = state.attempt, "poll deadline elapsed");
                        return Err(ClientError::PollTimeout(self.config.timeout));
                    }
                    state.next_wait = self.config.backoff.delay(state.attempt);
                    state.phase = Phase::Waiting;
                }
            }
        }
    }
}
