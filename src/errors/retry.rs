use std::time::Duration;
use std::future::Future;

use super::classification::ErrorClassification;
use super::types::FabricError;
use tracing::warn;

impl ErrorClassification {
    /// Delay before the next attempt (0-indexed).
    ///
    /// - RateLimitError: 5s + (attempt * 5s), capped at 30s
    /// - Default: exponential backoff 2^attempt + random jitter (0-1s), capped at 30s
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        match self.error_type {
            "RateLimitError" => {
                let secs = 5 + (attempt as u64 * 5);
                Duration::from_secs(secs.min(30))
            }
            _ => {
                let base: f64 = 2.0_f64.powi(attempt as i32);
                let jitter: f64 = rand::random::<f64>();
                let secs = (base + jitter).min(30.0);
                Duration::from_secs_f64(secs)
            }
        }
    }
}

/// Retry configuration for calls to the identity provider and the REST API.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// Execute an async operation, retrying only errors classified as retryable.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, FabricError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FabricError>>,
{
    let max_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        let err = match factory().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let classification = err.classify();
        if !classification.retryable {
            warn!(
                operation = operation_name,
                error_type = classification.error_type,
                "Non-retryable error, failing immediately"
            );
            return Err(err);
        }
        if attempt + 1 >= max_attempts {
            warn!(
                operation = operation_name,
                attempt = attempt + 1,
                max = max_attempts,
                "Max retries exhausted"
            );
            return Err(err);
        }

        let delay = classification.retry_delay(attempt);
        warn!(
            operation = operation_name,
            attempt = attempt + 1,
            max = max_attempts,
            error_type = classification.error_type,
            delay_secs = delay.as_secs(),
            error = %err,
            "Retrying after error"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
