//! Retry logic with exponential backoff
//!
//! Configurable retry for transient failures: exponential backoff with
//! optional jitter to prevent thundering herd. Whether an error is worth
//! retrying is a pure decision over the [`Error`](crate::error::Error)
//! variant (and the HTTP status it carries), implemented via [`IsRetryable`].

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, rate limiting, server errors)
/// should return `true`. Permanent failures (not found, bad request, local
/// I/O problems that a retry cannot fix) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Timeouts and connection failures are transient
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            // Rate limiting and server-side errors are transient;
            // client-side statuses (400, 403, ...) are not
            Error::Status { code } => *code == 429 || (500..=599).contains(code),
            // A handful of I/O kinds represent transient network glitches
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // Resource does not exist upstream; retrying cannot create it
            Error::NotFound(_) => false,
            // Everything else is a logic/config/local failure
            Error::Config { .. }
            | Error::Serialization(_)
            | Error::Csv(_)
            | Error::Ledger(_)
            | Error::Manifest(_)
            | Error::PostProcess(_)
            | Error::Cancelled => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// Retries the operation while it fails with a retryable error, sleeping an
/// exponentially growing (optionally jittered) delay between attempts, up to
/// `config.max_attempts` retries. Non-retryable errors are returned
/// immediately; exhausting attempts returns the last error.
pub async fn download_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                let jittered_delay = if config.jitter { add_jitter(delay) } else { delay };

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = jittered_delay.as_millis(),
                    "operation failed, retrying"
                );

                tokio::time::sleep(jittered_delay).await;

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "operation failed after all retry attempts exhausted"
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay lands in `[delay, 2 * delay]`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
