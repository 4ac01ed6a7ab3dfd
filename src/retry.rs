//! Shared retry policy for outbound HTTP calls.
//!
//! One primitive parameterized per call site instead of ad hoc retry loops in
//! every adapter: a fixed attempt budget, a linearly increasing backoff with
//! no jitter, and an optional retryable-error predicate.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before the attempt following `failed_attempt` (1-based).
    fn backoff(&self, failed_attempt: u32) -> Duration {
        self.base_delay * failed_attempt
    }

    /// Run `op` up to `max_attempts` times, treating every error as retryable.
    pub async fn run<T, F, Fut>(&self, op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.run_if(op, |_| true).await
    }

    /// Run `op` up to `max_attempts` times; errors rejected by `retryable`
    /// are returned immediately.
    pub async fn run_if<T, F, Fut, P>(&self, mut op: F, retryable: P) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
        P: Fn(&anyhow::Error) -> bool,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= self.max_attempts || !retryable(&error) {
                        return Err(error);
                    }
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "attempt failed, retrying after backoff"
                    );
                    tokio::time::sleep(self.backoff(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn exhausts_exactly_the_attempt_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(1));

        let result: anyhow::Result<()> = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("API Error: 500"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_retrying_on_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(1));

        let result = policy
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(anyhow!("transient"))
                } else {
                    Ok("generated text")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "generated text");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_short_circuit() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(1));

        let result: anyhow::Result<()> = policy
            .run_if(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow!("missing credential"))
                },
                |error| !error.to_string().contains("credential"),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
