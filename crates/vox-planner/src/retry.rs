//! Retry with exponential backoff for completion calls
//!
//! Transport failures are classified by message, the same way provider
//! errors surface them (status codes and reqwest error text). Only
//! recoverable failures are retried.

use crate::error::PlanError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Base delay for exponential backoff (in milliseconds)
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Maximum delay between retries (in milliseconds)
const MAX_RETRY_DELAY_MS: u64 = 10000;

const JITTER_FACTOR: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorType {
    Recoverable(RecoverableError),
    NonRecoverable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecoverableError {
    RateLimit,
    NetworkError,
    /// Server error (5xx)
    ServerError,
    ModelBusy,
    Timeout,
}

/// Classify a transport error as recoverable or non-recoverable
pub fn classify_error(error: &anyhow::Error) -> ErrorType {
    let error_str = format!("{:#}", error).to_lowercase();

    if error_str.contains("rate limit")
        || error_str.contains("rate_limit")
        || error_str.contains("429")
        || error_str.contains("resource_exhausted")
    {
        return ErrorType::Recoverable(RecoverableError::RateLimit);
    }

    if error_str.contains("network")
        || error_str.contains("connection")
        || error_str.contains("dns")
        || error_str.contains("refused")
    {
        return ErrorType::Recoverable(RecoverableError::NetworkError);
    }

    if error_str.contains("500")
        || error_str.contains("502")
        || error_str.contains("503")
        || error_str.contains("504")
        || error_str.contains("server error")
        || error_str.contains("internal error")
    {
        return ErrorType::Recoverable(RecoverableError::ServerError);
    }

    if error_str.contains("busy")
        || error_str.contains("overloaded")
        || error_str.contains("capacity")
        || error_str.contains("unavailable")
    {
        return ErrorType::Recoverable(RecoverableError::ModelBusy);
    }

    if error_str.contains("timeout") || error_str.contains("timed out") {
        return ErrorType::Recoverable(RecoverableError::Timeout);
    }

    ErrorType::NonRecoverable
}

/// Calculate retry delay with exponential backoff and jitter
pub fn calculate_retry_delay(attempt: u32) -> Duration {
    use rand::Rng;

    // delay = base * 2^(attempt - 1), capped
    let exponent = attempt.saturating_sub(1).min(16);
    let base_delay = BASE_RETRY_DELAY_MS.saturating_mul(2_u64.pow(exponent));
    let capped_delay = base_delay.min(MAX_RETRY_DELAY_MS);

    let mut rng = rand::thread_rng();
    let jitter = (capped_delay as f64 * JITTER_FACTOR * rng.gen::<f64>()) as u64;
    let final_delay = if rng.gen_bool(0.5) {
        capped_delay + jitter
    } else {
        capped_delay.saturating_sub(jitter)
    };

    Duration::from_millis(final_delay)
}

/// Run `operation` until it succeeds, fails non-recoverably, or
/// `max_attempts` attempts have been made.
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    mut operation: F,
    max_attempts: u32,
) -> Result<T, PlanError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlanError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        "Operation '{}' succeeded after {} attempts",
                        operation_name, attempt
                    );
                }
                return Ok(result);
            }
            Err(err) if err.is_recoverable() => {
                if attempt >= max_attempts {
                    error!(
                        "Operation '{}' failed after {} attempts. Giving up.",
                        operation_name, attempt
                    );
                    return Err(err);
                }

                let delay = calculate_retry_delay(attempt);
                warn!(
                    "Recoverable error in '{}' (attempt {}/{}). Retrying in {:?}: {}",
                    operation_name, attempt, max_attempts, delay, err
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                debug!(
                    "Non-recoverable error in '{}' (attempt {}): {}",
                    operation_name, attempt, err
                );
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_error_classification() {
        let error = anyhow!("Rate limit exceeded");
        assert_eq!(
            classify_error(&error),
            ErrorType::Recoverable(RecoverableError::RateLimit)
        );

        let error = anyhow!("HTTP 429 Too Many Requests");
        assert_eq!(
            classify_error(&error),
            ErrorType::Recoverable(RecoverableError::RateLimit)
        );

        let error = anyhow!("Network connection failed");
        assert_eq!(
            classify_error(&error),
            ErrorType::Recoverable(RecoverableError::NetworkError)
        );

        let error = anyhow!("HTTP 503 Service Unavailable");
        assert_eq!(
            classify_error(&error),
            ErrorType::Recoverable(RecoverableError::ServerError)
        );

        let error = anyhow!("Model is overloaded, please try again");
        assert_eq!(
            classify_error(&error),
            ErrorType::Recoverable(RecoverableError::ModelBusy)
        );

        let error = anyhow!("Request timed out");
        assert_eq!(
            classify_error(&error),
            ErrorType::Recoverable(RecoverableError::Timeout)
        );

        let error = anyhow!("Invalid API key");
        assert_eq!(classify_error(&error), ErrorType::NonRecoverable);
    }

    #[test]
    fn test_classification_sees_context_chain() {
        let error = anyhow!("status 503").context("Gemini request failed");
        assert_eq!(
            classify_error(&error),
            ErrorType::Recoverable(RecoverableError::ServerError)
        );
    }

    #[test]
    fn test_retry_delay_calculation() {
        let delay1 = calculate_retry_delay(1);
        let delay2 = calculate_retry_delay(2);

        assert!(delay1.as_millis() >= (BASE_RETRY_DELAY_MS as f64 * 0.7) as u128);
        assert!(delay1.as_millis() <= (BASE_RETRY_DELAY_MS as f64 * 1.3) as u128);
        assert!(delay2.as_millis() >= (2.0 * BASE_RETRY_DELAY_MS as f64 * 0.7) as u128);

        let delay_max = calculate_retry_delay(40);
        assert!(delay_max.as_millis() <= (MAX_RETRY_DELAY_MS as f64 * 1.3) as u128);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_recoverable_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(
            "complete",
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(PlanError::Transport(anyhow!("503 Service Unavailable")))
                    } else {
                        Ok(n)
                    }
                }
            },
            3,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(
            "complete",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(PlanError::Timeout { seconds: 1 }) }
            },
            2,
        )
        .await;

        assert!(matches!(result, Err(PlanError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_recoverable_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(
            "complete",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(PlanError::Syntax {
                        raw: "garbage".into(),
                    })
                }
            },
            5,
        )
        .await;

        assert!(matches!(result, Err(PlanError::Syntax { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
