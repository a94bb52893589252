//! Retrying model calls on transient failures.
//!
//! Rate limits (429), gateway errors (5xx) and network hiccups are retried
//! with exponential backoff. Authentication and request errors fail at once.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff settings for model calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Shorten each delay by a fixed per-attempt factor.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
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

    /// A config that never retries.
    pub fn none() -> Self {
        Self::with_retries(0)
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        if !self.jitter {
            return Duration::from_secs_f64(capped);
        }
        // Deterministic spread; no rand dependency for this.
        let factor = [0.75, 0.90, 0.60, 0.85][(attempt % 4) as usize];
        Duration::from_secs_f64(capped * factor)
    }
}

/// Whether an error message describes a failure worth retrying.
pub fn is_transient_error(error: &str) -> bool {
    if ["429", "500", "502", "503", "504"]
        .iter()
        .any(|code| error.contains(&format!("HTTP {code}")))
    {
        return true;
    }
    let lower = error.to_lowercase();
    [
        "request failed:",
        "connection reset",
        "connection refused",
        "timed out",
        "timeout",
        "broken pipe",
    ]
    .iter()
    .any(|p| lower.contains(p))
}

/// Whether an error message describes a failure that will not go away.
pub fn is_permanent_error(error: &str) -> bool {
    ["HTTP 400", "HTTP 401", "HTTP 403", "HTTP 404", "HTTP 422", "not set"]
        .iter()
        .any(|p| error.contains(p))
}

/// Run `call` until it succeeds, fails permanently, or retries run out.
pub async fn retry_api_call<T, F, Fut>(config: &RetryConfig, mut call: F) -> Result<T, String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(v) => return Ok(v),
            Err(e)
                if attempt < config.max_retries
                    && is_transient_error(&e)
                    && !is_permanent_error(&e) =>
            {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "Transient model error (attempt {}/{}): {e}. Retrying in {delay:?}",
                    attempt + 1,
                    config.max_retries,
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
