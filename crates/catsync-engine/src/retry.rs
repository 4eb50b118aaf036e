//! Pacing and retry for calls to the commerce platform.
//!
//! Every remote call goes through [`RetryPolicy::run`]: a fixed pause after
//! each call keeps the steady-state request rate under the platform's limit,
//! and retriable failures ([`PlatformError::is_retriable`]) back off
//! exponentially with jitter, bounded by `max_retries`.

use std::future::Future;
use std::time::Duration;

use catsync_core::AppConfig;

use crate::error::PlatformError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub backoff_base: Duration,
    /// Upper bound for any single wait, including a server's Retry-After.
    pub backoff_max: Duration,
    /// Pause after every completed call.
    pub pause: Duration,
    /// Spread computed backoff delays by ±25 %.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            backoff_base: Duration::from_millis(1_000),
            backoff_max: Duration::from_millis(30_000),
            pause: Duration::from_millis(600),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.retry_backoff_base_ms),
            backoff_max: Duration::from_millis(config.retry_backoff_max_ms),
            pause: Duration::from_millis(config.inter_call_delay_ms),
            jitter: true,
        }
    }

    /// No waits at all; the retry bound still applies.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_base: Duration::ZERO,
            backoff_max: Duration::ZERO,
            pause: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    ///
    /// A server-supplied Retry-After is used as-is; otherwise the delay is
    /// `base × 2^(attempt-1)` with optional jitter. Both are capped at
    /// `backoff_max`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, err: &PlatformError) -> Duration {
        if let PlatformError::RateLimited {
            retry_after_secs: Some(secs),
        } = err
        {
            return Duration::from_secs(*secs).min(self.backoff_max);
        }
        let computed = self
            .backoff_base
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        let capped = computed.min(self.backoff_max);
        if self.jitter {
            capped
                .mul_f64(rand::random::<f64>() * 0.5 + 0.75)
                .min(self.backoff_max)
        } else {
            capped
        }
    }

    /// Runs `operation`, retrying retriable failures.
    ///
    /// # Errors
    ///
    /// Returns the first non-retriable error, or the last retriable one once
    /// `max_retries` is exhausted.
    pub async fn run<T, F, Fut>(&self, call: &str, mut operation: F) -> Result<T, PlatformError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = operation().await;
            match outcome {
                Err(err) if err.is_retriable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for(attempt, &err);
                    tracing::warn!(
                        call,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        status = err.status(),
                        error = %err,
                        "retriable platform error; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => {
                    if !self.pause.is_zero() {
                        tokio::time::sleep(self.pause).await;
                    }
                    return other;
                }
            }
        }
    }
}
