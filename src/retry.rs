//! Retry policy shared by all probers.
//!
//! Transient failures are retried with linear backoff (`attempt * unit`) until a
//! fixed attempt ceiling. Intermediate failures log at `info`; only the final,
//! giving-up attempt logs at `warn`.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::{log, Level};
use tokio_retry::RetryIf;

use crate::config::Config;

/// Result of running an action under the retry policy.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// Final result: the first success, or the last error seen
    pub result: Result<T, E>,
    /// Number of attempts made (including the first)
    pub attempts: usize,
}

/// Backoff and give-up decisions for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff_unit: Duration,
}

impl RetryPolicy {
    /// Creates a policy allowing at most `max_attempts` attempts (at least one).
    pub fn new(max_attempts: usize, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.retries_max, config.retry_backoff())
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Whether another attempt is allowed after `attempt` attempts have failed.
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    /// Wait before the next attempt, after `attempt` failed attempts.
    pub fn delay(&self, attempt: usize) -> Duration {
        self.backoff_unit * attempt as u32
    }

    /// Delays between attempts: `unit, 2*unit, ...`, one fewer than the ceiling.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        let policy = *self;
        (1..policy.max_attempts).map(move |attempt| policy.delay(attempt))
    }

    /// Severity of a transient failure after `attempt` attempts: `info` while
    /// another attempt follows, `warn` on the give-up.
    pub fn failure_level(&self, attempt: usize) -> Level {
        if self.should_retry(attempt) {
            Level::Info
        } else {
            Level::Warn
        }
    }

    /// Logs a transient failure at the severity matching its position.
    pub fn log_failure(&self, url: &str, attempt: usize, cause: &dyn Display) {
        let level = self.failure_level(attempt);
        if level == Level::Warn {
            log!(
                level,
                "Giving up on {} after {} attempts: {}",
                url,
                attempt,
                cause
            );
        } else {
            log!(
                level,
                "Attempt {}/{} failed for {}: {} (retrying in {:?})",
                attempt,
                self.max_attempts,
                url,
                cause,
                self.delay(attempt)
            );
        }
    }

    /// Runs `action` until it succeeds, fails with a non-transient error, or the
    /// attempt ceiling is reached.
    ///
    /// # Arguments
    ///
    /// * `url` - Locator (or group key) used in log messages
    /// * `action` - Produces one attempt
    /// * `is_transient` - Decides whether an error is worth retrying
    pub async fn execute<T, E, A, Fut, C>(
        &self,
        url: &str,
        mut action: A,
        mut is_transient: C,
    ) -> RetryResult<T, E>
    where
        A: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        C: FnMut(&E) -> bool,
    {
        let attempts = AtomicUsize::new(0);

        let result = RetryIf::spawn(
            self.strategy(),
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                action()
            },
            |err: &E| {
                let transient = is_transient(err);
                if transient {
                    self.log_failure(url, attempts.load(Ordering::SeqCst), err);
                }
                transient
            },
        )
        .await;

        RetryResult {
            result,
            attempts: attempts.load(Ordering::SeqCst),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max: usize) -> RetryPolicy {
        RetryPolicy::new(max, Duration::from_millis(1))
    }

    #[test]
    fn test_should_retry_ceiling() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(3));
        assert!(!policy.should_retry(4));
        assert!(!policy.should_retry(5));
    }

    #[test]
    fn test_only_give_up_logs_at_warn() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.failure_level(1), Level::Info);
        assert_eq!(policy.failure_level(policy.max_attempts() - 1), Level::Info);
        assert_eq!(policy.failure_level(policy.max_attempts()), Level::Warn);

        let single = fast_policy(1);
        assert_eq!(single.failure_level(1), Level::Warn);
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = policy.strategy().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3)
            ]
        );
    }

    #[test]
    fn test_zero_ceiling_still_attempts_once() {
        let policy = fast_policy(0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.strategy().count(), 0);
    }

    #[tokio::test]
    async fn test_execute_exhausts_transient_errors() {
        let policy = fast_policy(4);
        let outcome: RetryResult<(), String> = policy
            .execute("http://example.com/", || async { Err("503".to_string()) }, |_| true)
            .await;
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.result, Err("503".to_string()));
    }

    #[tokio::test]
    async fn test_execute_stops_on_permanent_error() {
        let policy = fast_policy(4);
        let outcome: RetryResult<(), String> = policy
            .execute(
                "ftp://example.com/",
                || async { Err("530 login incorrect".to_string()) },
                |_| false,
            )
            .await;
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.result.is_err());
    }

    #[tokio::test]
    async fn test_execute_succeeds_after_transient_failures() {
        let policy = fast_policy(4);
        let calls = AtomicUsize::new(0);
        let outcome = policy
            .execute(
                "http://example.com/",
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n < 3 {
                            Err(format!("attempt {n} failed"))
                        } else {
                            Ok(n)
                        }
                    }
                },
                |_| true,
            )
            .await;
        assert_eq!(outcome.result, Ok(3));
        assert_eq!(outcome.attempts, 3);
    }
}
