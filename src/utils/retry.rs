use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

/// Result of one try at a rate-limited operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Ready(T),
    RetryAfter(Duration),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` keeps retrying for as long as the remote asks us to wait.
    pub max_retries: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self { max_retries: None }
    }

    pub fn bounded(max_retries: u32) -> Self {
        Self {
            max_retries: Some(max_retries),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("gave up after {retries} rate-limited retries")]
pub struct RetriesExhausted {
    pub retries: u32,
}

/// Runs `op` until it is ready, sleeping for the delay the remote asked for
/// between tries.
pub async fn retry_after<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, RetriesExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut retries = 0u32;
    loop {
        match op().await {
            Attempt::Ready(value) => return Ok(value),
            Attempt::RetryAfter(wait) => {
                if policy.max_retries.is_some_and(|max| retries >= max) {
                    return Err(RetriesExhausted { retries });
                }
                retries += 1;
                info!(
                    "rate limited, waiting {:.3}s before retry #{}",
                    wait.as_secs_f64(),
                    retries
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}
