use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with a fixed delay between attempts.
///
/// Attempts never overlap: the next one starts only after the previous one
/// failed and the delay elapsed. Once started, a retry loop runs until it
/// succeeds or exhausts its attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Public key publication. A keep is a fresh contract clone, and nodes
    /// behind a load balancer may not have seen it yet.
    pub const PUBLIC_KEY_SUBMISSION: Self = Self {
        max_attempts: 4,
        delay: Duration::from_millis(250),
    };

    /// Longer-lived node unavailability.
    pub const TRANSACTION_SUBMISSION: Self = Self {
        max_attempts: 10,
        delay: Duration::from_secs(12),
    };

    /// A zero attempt budget is raised to one attempt.
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay,
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds, returning the last error once
    /// every attempt has failed.
    pub async fn run<T, E, F, Fut>(&self, name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        operation = name,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Attempt {}/{} failed",
                        attempt,
                        self.max_attempts
                    );
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::TRANSACTION_SUBMISSION
    }
}

/// Runs `operation` under an ad hoc policy.
pub async fn with_retry<T, E, F, Fut>(
    operation: F,
    max_attempts: u32,
    delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryPolicy::new(max_attempts, delay)
        .run("operation", operation)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let mut calls = 0u32;
        let result: Result<u32, String> = with_retry(
            || {
                calls += 1;
                let call = calls;
                async move {
                    if call <= 2 {
                        Err(format!("failure {}", call))
                    } else {
                        Ok(call)
                    }
                }
            },
            5,
            Duration::from_millis(100),
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_when_exhausted() {
        let mut calls = 0u32;
        let start = Instant::now();
        let result: Result<(), String> = RetryPolicy::PUBLIC_KEY_SUBMISSION
            .run("always-failing", || {
                calls += 1;
                let call = calls;
                async move { Err(format!("failure {}", call)) }
            })
            .await;

        assert_eq!(result, Err("failure 4".to_string()));
        assert_eq!(calls, 4);
        // three delays between four attempts, none after the last one
        assert_eq!(start.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_is_not_delayed() {
        let start = Instant::now();
        let result: Result<&str, String> = RetryPolicy::default()
            .run("immediate", || async { Ok("done") })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_predefined_policies() {
        assert_eq!(RetryPolicy::PUBLIC_KEY_SUBMISSION.max_attempts(), 4);
        assert_eq!(
            RetryPolicy::PUBLIC_KEY_SUBMISSION.delay(),
            Duration::from_millis(250)
        );
        assert_eq!(RetryPolicy::default().max_attempts(), 10);
        assert_eq!(RetryPolicy::default().delay(), Duration::from_secs(12));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
