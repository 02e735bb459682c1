use std::future::Future;

use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::{error, warn};

pub const RETRY_ATTEMPTS_DEFAULT: u32 = 1;
pub const RETRY_BASE_DELAY_MS_DEFAULT: u64 = 200;
pub const RETRY_MAX_DELAY_MS_DEFAULT: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// will be mutiply by 2 on every attempt until max_delay_ms
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// invariant: >= base_delay_ms
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: RETRY_ATTEMPTS_DEFAULT,
            base_delay_ms: RETRY_BASE_DELAY_MS_DEFAULT,
            max_delay_ms: RETRY_MAX_DELAY_MS_DEFAULT,
        }
    }
}

impl RetrySettings {
    /// Run `operation` until it succeeds, fails with an error `retryable` rejects,
    /// or the attempts are used up. The last error is returned.
    pub async fn run_with_retry<F, Fut, T, E, R>(&self, mut operation: F, retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        R: Fn(&E) -> bool,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && retryable(&e) => {
                    warn!("Attempt {attempt}/{attempts} failed: {e}");
                    sleep(Duration::from_millis(delay)).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
                Err(e) => {
                    if attempts > 1 {
                        error!("giving up after {attempt}/{attempts} attempts: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }

    fn next_delay(&self, delay: u64) -> u64 {
        delay.saturating_mul(2).min(self.max_delay_ms)
    }
}

fn default_attempts() -> u32 {
    RETRY_ATTEMPTS_DEFAULT
}

fn default_base_delay_ms() -> u64 {
    RETRY_BASE_DELAY_MS_DEFAULT
}

fn default_max_delay_ms() -> u64 {
    RETRY_MAX_DELAY_MS_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetrySettings {
        RetrySettings {
            attempts,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fast(3)
            .run_with_retry(
                || async {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 { Err(format!("transient {n}")) } else { Ok(n) }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = fast(5)
            .run_with_retry(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("permanent".to_owned())
                },
                |_| false,
            )
            .await;

        assert_eq!(result, Err("permanent".to_owned()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), String> = fast(0)
            .run_with_retry(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("boom".to_owned())
                },
                |_| true,
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_up_to_max_without_overflow() {
        let settings = RetrySettings {
            attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 500,
        };
        assert_eq!(settings.next_delay(200), 400);
        assert_eq!(settings.next_delay(400), 500);

        let huge = RetrySettings {
            attempts: 3,
            base_delay_ms: u64::MAX,
            max_delay_ms: u64::MAX,
        };
        assert_eq!(huge.next_delay(u64::MAX), u64::MAX);
    }
}
