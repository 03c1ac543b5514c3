//! Bounded retry with exponential backoff around one lookup + classify.

use crate::classify::classify_lookup;
use crate::protocols::RegistrationLookup;
use crate::types::{SweepConfig, Verdict};
use chrono::Utc;
use std::time::Duration;

/// Attempt budget and backoff unit for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait after failed attempt `n` (1-based) is `backoff_unit * 2^n`
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl From<&SweepConfig> for RetryPolicy {
    fn from(config: &SweepConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_unit: config.backoff_unit,
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait after the given failed attempt (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// How a domain's retry loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// A verdict was reached after `attempts` lookups
    Verdict { verdict: Verdict, attempts: u32 },
    /// Every attempt failed transiently; nothing is reported for the domain
    Exhausted { attempts: u32 },
}

impl RetryOutcome {
    /// The verdict, if one was reached.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            RetryOutcome::Verdict { verdict, .. } => Some(*verdict),
            RetryOutcome::Exhausted { .. } => None,
        }
    }

    /// Number of lookups performed.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Verdict { attempts, .. } | RetryOutcome::Exhausted { attempts } => {
                *attempts
            }
        }
    }
}

/// Look up and classify one domain, retrying transient failures.
///
/// Non-transient failures resolve to [`Verdict::Unknown`] at once. The
/// backoff sleep only suspends the calling task.
pub async fn check_with_retry(
    lookup: &dyn RegistrationLookup,
    domain: &str,
    policy: &RetryPolicy,
) -> RetryOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match lookup.lookup(domain).await {
            Err(err) if err.is_transient() => {
                if attempt >= max_attempts {
                    tracing::debug!(domain, attempts = attempt, error = %err, "retries exhausted");
                    return RetryOutcome::Exhausted { attempts: attempt };
                }
                let wait = policy.backoff_after(attempt);
                tracing::debug!(domain, attempt, ?wait, error = %err, "transient failure, backing off");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            result => {
                if let Err(err) = &result {
                    tracing::debug!(domain, attempt, error = %err, "lookup failed, verdict unknown");
                }
                let verdict = classify_lookup(&result, Utc::now());
                tracing::debug!(domain, attempt, %verdict, "lookup classified");
                return RetryOutcome::Verdict {
                    verdict,
                    attempts: attempt,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainSweepError;
    use crate::types::RegistrationRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails transiently `failures` times, then returns `record`.
    struct FlakyLookup {
        failures: u32,
        calls: AtomicU32,
        record: RegistrationRecord,
    }

    impl FlakyLookup {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                record: RegistrationRecord::default(),
            }
        }
    }

    #[async_trait]
    impl RegistrationLookup for FlakyLookup {
        async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DomainSweepError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(DomainSweepError::transient(domain, "connection reset by peer"))
            } else {
                Ok(self.record.clone())
            }
        }
    }

    struct BrokenLookup {
        calls: AtomicU32,
    }

    #[async_trait]
    impl RegistrationLookup for BrokenLookup {
        async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DomainSweepError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DomainSweepError::decode(domain, "invalid utf-8"))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_unit: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_after(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_after(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let lookup = FlakyLookup::new(0);
        let outcome = check_with_retry(&lookup, "a.com", &fast_policy()).await;
        assert_eq!(outcome.verdict(), Some(Verdict::Free));
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_two_transient_failures_then_success() {
        let lookup = FlakyLookup::new(2);
        let outcome = check_with_retry(&lookup, "a.com", &fast_policy()).await;
        assert_eq!(
            outcome,
            RetryOutcome::Verdict {
                verdict: Verdict::Free,
                attempts: 3
            }
        );
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_always_transient_exhausts_after_three() {
        let lookup = FlakyLookup::new(u32::MAX);
        let outcome = check_with_retry(&lookup, "a.com", &fast_policy()).await;
        assert_eq!(outcome, RetryOutcome::Exhausted { attempts: 3 });
        assert_eq!(outcome.verdict(), None);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_is_unknown_without_retry() {
        let lookup = BrokenLookup {
            calls: AtomicU32::new(0),
        };
        let outcome = check_with_retry(&lookup, "a.com", &fast_policy()).await;
        assert_eq!(outcome.verdict(), Some(Verdict::Unknown));
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_two_then_four_units() {
        let lookup = FlakyLookup::new(u32::MAX);
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        };
        let start = tokio::time::Instant::now();
        let outcome = check_with_retry(&lookup, "a.com", &policy).await;
        assert_eq!(outcome.attempts(), 3);
        // 2s after attempt 1, 4s after attempt 2, nothing after the last
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "waited {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(7), "waited {:?}", elapsed);
    }
}
