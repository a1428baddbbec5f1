//! Bounded retry with exponential backoff.
//!
//! The sleep is behind a trait so retry behavior is testable without
//! wall-clock waits.

use crate::error::{AssistError, Result};
use std::sync::Mutex;
use std::time::Duration;

/// Trait for waiting between attempts, allowing fake sleepers in tests.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper using `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSleeper;

impl Sleeper for SystemSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeper that records requested delays instead of waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// All delays requested so far, in order.
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Sum of all requested delays.
    pub fn total(&self) -> Duration {
        self.slept().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

/// Bounded exponential-backoff retry policy.
///
/// Attempt `n` (counted from 1) that fails is followed by a wait of
/// `base_delay * 2^n` before attempt `n + 1`. No wait follows the final
/// attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::defaults::MAX_RETRIES,
            base_delay: crate::defaults::RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after failed attempt `attempt` (counted from 1).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    /// Runs `operation` until it succeeds or attempts are exhausted.
    ///
    /// Non-retryable errors abort immediately. On exhaustion the last error
    /// is wrapped in [`AssistError::CompletionExhausted`].
    pub fn run<T>(
        &self,
        sleeper: &dyn Sleeper,
        mut operation: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let attempts = self.max_attempts.max(1);
        let mut last_message = String::new();

        for attempt in 1..=attempts {
            match operation() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    last_message = e.to_string();
                    if attempt < attempts {
                        sleeper.sleep(self.delay_after(attempt));
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(AssistError::CompletionExhausted {
            attempts,
            message: last_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let p = policy();
        assert_eq!(p.delay_after(1), Duration::from_secs(2));
        assert_eq!(p.delay_after(2), Duration::from_secs(4));
        assert_eq!(p.delay_after(3), Duration::from_secs(8));
    }

    #[test]
    fn test_success_on_first_attempt_never_sleeps() {
        let sleeper = RecordingSleeper::new();
        let result = policy().run(&sleeper, || Ok::<_, crate::error::AssistError>(42));
        assert_eq!(result.unwrap(), 42);
        assert!(sleeper.slept().is_empty());
    }

    #[test]
    fn test_success_on_attempt_k_waits_expected_total() {
        // Fails attempts 1 and 2, succeeds on 3. Total wait must be
        // 2^1 + 2^2 seconds.
        let sleeper = RecordingSleeper::new();
        let count = AtomicU32::new(0);

        let result = policy().run(&sleeper, || {
            let n = count.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(AssistError::Completion {
                    message: format!("attempt {} down", n),
                })
            } else {
                Ok("ok")
            }
        });

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(
            sleeper.slept(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert!(sleeper.total() >= Duration::from_secs(6));
    }

    #[test]
    fn test_exhaustion_returns_exhausted_error() {
        let sleeper = RecordingSleeper::new();
        let count = AtomicU32::new(0);

        let result: Result<()> = policy().run(&sleeper, || {
            count.fetch_add(1, Ordering::SeqCst);
            Err(AssistError::Completion {
                message: "always down".to_string(),
            })
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
        match result {
            Err(AssistError::CompletionExhausted { attempts, message }) => {
                assert_eq!(attempts, 3);
                assert!(message.contains("always down"));
            }
            _ => panic!("Expected CompletionExhausted"),
        }
        // No wait after the final attempt.
        assert_eq!(sleeper.slept().len(), 2);
    }

    #[test]
    fn test_non_retryable_error_aborts_immediately() {
        let sleeper = RecordingSleeper::new();
        let count = AtomicU32::new(0);

        let result: Result<()> = policy().run(&sleeper, || {
            count.fetch_add(1, Ordering::SeqCst);
            Err(AssistError::ConfigInvalidValue {
                key: "api_key".to_string(),
                message: "empty".to_string(),
            })
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(sleeper.slept().is_empty());
        assert!(matches!(
            result,
            Err(AssistError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn test_zero_max_attempts_still_runs_once() {
        let sleeper = RecordingSleeper::new();
        let p = RetryPolicy {
            max_attempts: 0,
            base_delay: Duration::from_secs(1),
        };
        let result = p.run(&sleeper, || Ok::<_, crate::error::AssistError>(7));
        assert_eq!(result.unwrap(), 7);
    }
}
