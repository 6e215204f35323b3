//! Per-symbol retry with exponential backoff.
//!
//! Wraps any provider. Only transient errors are retried, and the state lives
//! inside a single `fetch` call, so one symbol's retries never affect another.

use super::provider::{DataSource, MarketDataProvider, ProviderError, RawBar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Retry schedule: `max_retries` extra attempts, delay doubling from `base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    #[serde(with = "millis")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt number `attempt` (1-based retry count).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Provider decorator adding [`RetryPolicy`] to every fetch.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: MarketDataProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: MarketDataProvider> MarketDataProvider for RetryingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn source(&self) -> DataSource {
        self.inner.source()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch(symbol, start, end) {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    warn!(symbol, attempt, ?delay, error = %e, "retrying fetch");
                    std::thread::sleep(delay);
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with the given error for the first `failures` calls, then succeeds.
    struct Flaky {
        failures: u32,
        error: ProviderError,
        calls: AtomicU32,
    }

    impl MarketDataProvider for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn source(&self) -> DataSource {
            DataSource::InMemory
        }

        fn fetch(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<RawBar>, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn retries_transient_until_success() {
        let provider = RetryingProvider::new(
            Flaky {
                failures: 2,
                error: ProviderError::Unavailable("timeout".into()),
                calls: AtomicU32::new(0),
            },
            quick(3),
        );
        let (s, e) = range();
        assert!(provider.fetch("A", s, e).is_ok());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let provider = RetryingProvider::new(
            Flaky {
                failures: 10,
                error: ProviderError::RateLimited { retry_after_secs: 1 },
                calls: AtomicU32::new(0),
            },
            quick(2),
        );
        let (s, e) = range();
        assert!(matches!(
            provider.fetch("A", s, e),
            Err(ProviderError::RateLimited { .. })
        ));
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn final_errors_are_not_retried() {
        let provider = RetryingProvider::new(
            Flaky {
                failures: 10,
                error: ProviderError::SymbolNotFound { symbol: "A".into() },
                calls: AtomicU32::new(0),
            },
            quick(5),
        );
        let (s, e) = range();
        assert!(provider.fetch("A", s, e).is_err());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
    }
}
