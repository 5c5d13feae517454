//! Retry with exponential backoff and jitter.
//!
//! Only transient model errors (rate limits, 5xx, network failures) are
//! retried. Client errors fail on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::domain::ports::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = fail immediately).
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// No waiting between attempts.
    pub fn immediate(retries: u32) -> Self {
        Self {
            max_retries: retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let max = self.max_delay.as_secs_f64();
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = if base.is_nan() { max } else { base.clamp(0.0, max) };

        if self.jitter {
            // Deterministic spread; keeps `rand` out of the dependency tree.
            let factor = match attempt % 4 {
                0 => 0.75,
                1 => 0.90,
                2 => 0.60,
                _ => 0.85,
            };
            Duration::from_secs_f64(capped * factor)
        } else {
            Duration::from_secs_f64(capped)
        }
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub struct Retried<T> {
    pub result: Result<T, ModelError>,
    /// Total attempts made, at least 1.
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
pub async fn run_with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Retried<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModelError>>,
{
    let mut attempts = 0;
    loop {
        let result = op().await;
        attempts += 1;
        match result {
            Err(err) if err.is_transient() && attempts <= config.max_retries => {
                let delay = config.delay_for_attempt(attempts - 1);
                warn!(
                    attempt = attempts,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient model error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            result => return Retried { result, attempts },
        }
    }
}
