//! Fixed-delay retry for requests that never got a response.

use std::future::Future;
use std::time::Duration;

use vsi_core::ApiConfig;
use vsi_logging::vsi_debug;

use crate::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub attempts: u32,
    /// Pause between attempts. Constant, no backoff.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for RetryPolicy {
    fn from(api: &ApiConfig) -> Self {
        Self {
            attempts: api.retries,
            delay: api.retry_delay,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, error: &TransportError, retries_so_far: u32) -> bool {
        error.is_retryable() && retries_so_far < self.attempts
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the policy is spent.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut retries = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if policy.should_retry(&err, retries) => {
                retries += 1;
                vsi_debug!(
                    "Retrying after {err} (attempt {} of {})",
                    retries,
                    policy.attempts
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
