//! Retry with exponential backoff for calls to the synthesis service.
//!
//! The pipeline itself never retries a failed segment; callers opt in by
//! wrapping their synthesizer (see `synth::RetryingSynthesizer`).

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total attempts, including the first call. Treated as at least 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Default::default()
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        self.initial_delay.mul_f64(factor).min(self.max_delay)
    }
}

/// Runs `f` until it succeeds, retries are exhausted, or `is_retryable`
/// rejects the error.
pub async fn retry_with_backoff<F, T, E, Fut>(
    config: &RetryConfig,
    mut f: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let attempts = config.max_attempts.max(1);

    for attempt in 1..=attempts {
        let err = match f().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "call succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if attempt == attempts || !is_retryable(&err) {
            return Err(err);
        }

        let delay = config.delay_for_attempt(attempt);
        warn!(
            attempt,
            max_attempts = attempts,
            delay_ms = delay.as_millis() as u64,
            "call failed, retrying"
        );
        sleep(delay).await;
    }

    unreachable!("loop always returns within max attempts")
}

/// Server errors and throttling are worth retrying; other client errors are
/// not.
pub fn is_http_retryable(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_per_attempt() {
        let config = RetryConfig::new(5, Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 10.0,
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(1));
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_http_retryable(500));
        assert!(is_http_retryable(503));
        assert!(is_http_retryable(429));
        assert!(is_http_retryable(408));
        assert!(!is_http_retryable(400));
        assert!(!is_http_retryable(401));
        assert!(!is_http_retryable(404));
    }

    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let mut calls = 0u32;
        let config = RetryConfig::new(5, Duration::from_millis(1));
        let result: Result<(), &str> = retry_with_backoff(
            &config,
            || {
                calls += 1;
                async { Err("fatal") }
            },
            |_| false,
        )
        .await;
        assert_eq!(result.unwrap_err(), "fatal");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn zero_max_attempts_still_calls_once() {
        let mut calls = 0u32;
        let config = RetryConfig::new(0, Duration::from_millis(1));
        let result: Result<u32, &str> = retry_with_backoff(
            &config,
            || {
                calls += 1;
                async { Ok(7) }
            },
            |_| true,
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
    }
}
