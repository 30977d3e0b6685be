//! Exponential backoff for outgoing backend calls

use super::client::HttpError;
use crate::config::RetrySettings;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy applied inside the backend clients.
///
/// Only transient failures are retried (see [`HttpError::is_retryable`]).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
    jitter: bool,
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            exponential_base: 1.0,
            jitter: false,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay: Duration::from_secs_f64(settings.initial_delay.max(0.0)),
            max_delay: Duration::from_secs_f64(settings.max_delay.max(0.0)),
            exponential_base: settings.exponential_base.max(1.0),
            jitter: settings.jitter,
        }
    }

    /// Delay before retry number `retry` (1-based), capped at `max_delay`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = self.exponential_base.powi(retry.saturating_sub(1) as i32);
        let base = (self.initial_delay.as_secs_f64() * exp).min(self.max_delay.as_secs_f64());
        let secs = if self.jitter {
            base * (0.5 + rand::thread_rng().gen::<f64>())
        } else {
            base
        };
        Duration::from_secs_f64(secs)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, HttpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HttpError>>,
    {
        let mut retries = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let delay = self.delay_for(retries);
                    warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        label, e, retries, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fixed(max_retries: u32) -> RetryPolicy {
        RetryPolicy::from_settings(&RetrySettings {
            max_retries,
            initial_delay: 0.001,
            max_delay: 0.004,
            exponential_base: 2.0,
            jitter: false,
        })
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::from_settings(&RetrySettings {
            max_retries: 5,
            initial_delay: 0.5,
            max_delay: 2.0,
            exponential_base: 2.0,
            jitter: false,
        });
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::from_settings(&RetrySettings {
            max_retries: 1,
            initial_delay: 1.0,
            max_delay: 10.0,
            exponential_base: 2.0,
            jitter: true,
        });
        for _ in 0..20 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fixed(2)
            .run("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(HttpError::Transport("connection reset".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fixed(3)
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(HttpError::Status {
                    status: 400,
                    message: "bad request".to_string(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fixed(1)
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(HttpError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(HttpError::Status { status: 503, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
