//! Bounded exponential backoff for remote calls.
//!
//! Only the translation engine is retried: cache store reads and writes are
//! single-shot by design (a failed read is a miss, a failed write is logged
//! and counted).

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Initial delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }

    /// Preset for translation engine calls (3 attempts)
    /// Delays: 500ms, 1s = 1.5s total wait time
    pub fn engine_call() -> Self {
        let mut config = Self::new(3, Duration::from_millis(500));
        config.max_delay = Duration::from_secs(4);
        config
    }

    /// Delay before a given attempt (0-indexed; the first attempt is free)
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::engine_call()
    }
}

/// Run an async operation, retrying only when `should_retry` approves of the
/// error. Client errors like 4xx must not be retried; rate limits and server
/// errors should be.
///
/// # Panics
/// Panics if `config.max_attempts` is 0
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    assert!(
        config.max_attempts >= 1,
        "RetryConfig.max_attempts must be >= 1, got {}",
        config.max_attempts
    );

    let mut last_error: Option<E> = None;

    for attempt in 0..config.max_attempts {
        let delay = config.delay_for_attempt(attempt);
        if !delay.is_zero() {
            debug!(
                "{}: retry attempt {}/{} after {:?}",
                operation_name,
                attempt + 1,
                config.max_attempts,
                delay
            );
            sleep(delay).await;
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if !should_retry(&error) {
                    debug!("{}: non-retryable error: {}", operation_name, error);
                    return Err(error);
                }
                let remaining = config.max_attempts - attempt - 1;
                if remaining > 0 {
                    warn!(
                        "{}: attempt {}/{} failed ({}), {} retries remaining",
                        operation_name,
                        attempt + 1,
                        config.max_attempts,
                        error,
                        remaining
                    );
                } else {
                    warn!(
                        "{}: all {} attempts failed, last error: {}",
                        operation_name, config.max_attempts, error
                    );
                }
                last_error = Some(error);
            }
        }
    }

    Err(last_error.expect("at least one attempt was made"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_first_success() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = with_retry_if(
            &RetryConfig::engine_call(),
            "test op",
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = with_retry_if(
            &RetryConfig::engine_call(),
            "test op",
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(7)
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_and_returns_last_error() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = with_retry_if(
            &RetryConfig::engine_call(),
            "test op",
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                Err(format!("failure {n}"))
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_non_retryable_error() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = with_retry_if(
            &RetryConfig::engine_call(),
            "test op",
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("bad request".to_string())
            },
            |error| !error.contains("bad request"),
        )
        .await;

        assert_eq!(result, Err("bad request".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let config = RetryConfig::new(6, Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(5), Duration::from_millis(8000));
        // Capped by max_delay
        assert_eq!(config.delay_for_attempt(6), Duration::from_secs(10));
    }

    #[test]
    #[should_panic(expected = "max_attempts")]
    fn zero_attempts_panics() {
        let config = RetryConfig::new(0, Duration::from_millis(1));
        let future = with_retry_if(&config, "test op", || async { Ok::<_, String>(1) }, |_| true);
        // The assert fires before the first await.
        let _ = tokio_test::block_on(future);
    }
}
