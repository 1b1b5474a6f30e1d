use std::time::Duration;

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request or deadline timed out somewhere in the cause chain.
    Timeout,
    /// HTTP 429; carries the server's `Retry-After` when it sent one.
    Throttled(Option<Duration>),
    /// HTTP 504 from the API gateway (other than the index DDL code).
    GatewayTimeout,
    /// Anything else; never retried.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Jitter applied on each side of the nominal delay.
const JITTER_FRACTION: f64 = 0.2;

/// Exponential backoff with a ceiling and ±20% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on the nominal delay.
    pub cap: Duration,
}

impl Backoff {
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Policy used between request retries: 2s doubling up to 32s.
    pub const fn request() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(32))
    }

    /// Policy used between checks of long-running operations: 1 minute
    /// doubling up to 20 minutes.
    pub const fn operation() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(20 * 60))
    }

    /// `min(base * 2^(attempt-1), cap)` without jitter. `attempt` is 1-based;
    /// 0 is treated as 1.
    pub fn nominal(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exp).min(self.cap)
    }

    /// Nominal delay scaled by a fresh random factor in `[0.8, 1.2)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1.0 - JITTER_FRACTION + rand::random::<f64>() * 2.0 * JITTER_FRACTION;
        self.nominal(attempt).mul_f64(factor)
    }
}

/// Bounded retry policy for single requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Overall window for all attempts and waits together.
    pub timeout: Duration,
    /// Only retry `Throttled`. Used for non-idempotent requests, where
    /// anything but an explicit rejection may already have taken effect.
    pub throttled_only: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Backoff::request(),
            timeout: Duration::from_secs(10 * 60),
            throttled_only: false,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn throttled_only(mut self) -> Self {
        self.throttled_only = true;
        self
    }

    /// Compute the next backoff delay for a given attempt and error kind.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns `RetryDecision::NoRetry`
    /// when we should stop retrying.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            ErrorKind::Other => RetryDecision::NoRetry,
            ErrorKind::Throttled(Some(d)) => RetryDecision::RetryAfter(d),
            ErrorKind::Throttled(None) => RetryDecision::RetryAfter(self.backoff.delay(attempt)),
            ErrorKind::Timeout | ErrorKind::GatewayTimeout if self.throttled_only => {
                RetryDecision::NoRetry
            }
            ErrorKind::Timeout | ErrorKind::GatewayTimeout => {
                RetryDecision::RetryAfter(self.backoff.delay(attempt))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn within_jitter(d: Duration, nominal: Duration) -> bool {
        let lo = nominal.mul_f64(0.8);
        let hi = nominal.mul_f64(1.2);
        d >= lo && d <= hi
    }

    #[test]
    fn nominal_doubles_then_caps() {
        let b = Backoff::request();
        assert_eq!(b.nominal(1), Duration::from_secs(2));
        assert_eq!(b.nominal(2), Duration::from_secs(4));
        assert_eq!(b.nominal(3), Duration::from_secs(8));
        assert_eq!(b.nominal(4), Duration::from_secs(16));
        assert_eq!(b.nominal(5), Duration::from_secs(32));
        assert_eq!(b.nominal(10), Duration::from_secs(32));
        assert_eq!(b.nominal(0), Duration::from_secs(2));
        assert_eq!(b.nominal(u32::MAX), Duration::from_secs(32));
    }

    #[test]
    fn operation_backoff_caps_at_twenty_minutes() {
        let b = Backoff::operation();
        assert_eq!(b.nominal(1), Duration::from_secs(60));
        assert_eq!(b.nominal(5), Duration::from_secs(16 * 60));
        assert_eq!(b.nominal(6), Duration::from_secs(20 * 60));
    }

    #[test]
    fn delay_stays_within_twenty_percent() {
        for base in [
            Duration::from_millis(1),
            Duration::from_millis(250),
            Duration::from_secs(2),
            Duration::from_secs(60),
        ] {
            for cap in [Duration::from_secs(32), Duration::from_secs(20 * 60)] {
                let b = Backoff::new(base, cap);
                for attempt in 1..=10 {
                    let expected = base.saturating_mul(1 << (attempt - 1)).min(cap);
                    for _ in 0..10 {
                        let d = b.delay(attempt);
                        assert!(
                            within_jitter(d, expected),
                            "attempt {attempt}: {d:?} outside 20% of {expected:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn delay_has_jitter() {
        let b = Backoff::request();
        let distinct: HashSet<Duration> = (0..50).map(|_| b.delay(3)).collect();
        assert!(
            distinct.len() >= 5,
            "only {} distinct delays in 50 samples",
            distinct.len()
        );
    }

    #[test]
    fn no_retry_for_other() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, ErrorKind::Other), RetryDecision::NoRetry);
    }

    #[test]
    fn throttled_uses_server_delay() {
        let p = RetryPolicy::default();
        assert_eq!(
            p.decide(1, ErrorKind::Throttled(Some(Duration::from_secs(7)))),
            RetryDecision::RetryAfter(Duration::from_secs(7))
        );
        match p.decide(2, ErrorKind::Throttled(None)) {
            RetryDecision::RetryAfter(d) => assert!(within_jitter(d, Duration::from_secs(4))),
            RetryDecision::NoRetry => panic!("expected retry"),
        }
    }

    #[test]
    fn respects_max_attempts() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 3;
        assert!(matches!(
            p.decide(1, ErrorKind::Timeout),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, ErrorKind::GatewayTimeout),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, ErrorKind::Timeout), RetryDecision::NoRetry);
        assert_eq!(RetryPolicy::never().decide(1, ErrorKind::Timeout), RetryDecision::NoRetry);
    }

    #[test]
    fn throttled_only_skips_timeouts() {
        let p = RetryPolicy::default().throttled_only();
        assert_eq!(p.decide(1, ErrorKind::Timeout), RetryDecision::NoRetry);
        assert_eq!(p.decide(1, ErrorKind::GatewayTimeout), RetryDecision::NoRetry);
        assert!(matches!(
            p.decide(1, ErrorKind::Throttled(None)),
            RetryDecision::RetryAfter(_)
        ));
    }
}
