//! Retry with exponential backoff for chat requests.
//!
//! Retries 408, 429 and 5xx responses plus connect/timeout errors. Other
//! failures are returned immediately.

use crate::config::toml_config::RetryConfig;
use crate::utils::error::{Result, SaphireError};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_retries: config.attempts.unwrap_or(defaults.max_retries),
            initial_delay: config
                .delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_delay),
            max_delay: config
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500..=599)
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(BODY_EXCERPT_CHARS).collect();
        format!("{}…", cut)
    }
}

/// Sends `request`, retrying transient failures. Non-success responses that
/// are not retried become `ProviderError`.
pub async fn send_with_retry(
    provider: &str,
    request: RequestBuilder,
    policy: &RetryPolicy,
) -> Result<Response> {
    let mut attempt = 0;

    loop {
        let current = request
            .try_clone()
            .ok_or_else(|| SaphireError::ScenarioError {
                message: format!("{} request body cannot be replayed", provider),
            })?;

        match current.send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) && attempt < policy.max_retries {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        "{} returned {}, retrying in {:?} ({}/{})",
                        provider,
                        status,
                        delay,
                        attempt + 1,
                        policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                let body = response.text().await.unwrap_or_default();
                return Err(SaphireError::ProviderError {
                    provider: provider.to_string(),
                    status: status.as_u16(),
                    message: excerpt(&body),
                });
            }
            Err(e) if (e.is_connect() || e.is_timeout()) && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "{} request failed ({}), retrying in {:?} ({}/{})",
                    provider,
                    e,
                    delay,
                    attempt + 1,
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
        assert_eq!(policy.delay_for(30), Duration::from_secs(3));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_policy_from_config_keeps_unset_defaults() {
        let config = RetryConfig {
            attempts: Some(4),
            delay_ms: None,
            max_delay_ms: Some(1000),
        };
        let policy = RetryPolicy::from(&config);

        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_connect_errors_are_retried_with_backoff() {
        // Nothing listens on the discard port, so every attempt is refused.
        let client = reqwest::Client::new();
        let request = client.post("http://127.0.0.1:9/api/generate").body("{}");
        let policy = RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(60),
            max_delay: Duration::from_secs(1),
        };

        let started = std::time::Instant::now();
        let result = send_with_retry("ollama", request, &policy).await;

        assert!(matches!(result, Err(SaphireError::HttpError(_))));
        // 60ms before the first retry, 120ms before the second.
        assert!(started.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_connect_error_without_retries_fails_at_once() {
        let client = reqwest::Client::new();
        let request = client.post("http://127.0.0.1:9/api/generate").body("{}");

        let result = send_with_retry("ollama", request, &RetryPolicy::none()).await;
        assert!(matches!(result, Err(SaphireError::HttpError(_))));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let short = excerpt(&long);
        assert_eq!(short.chars().count(), BODY_EXCERPT_CHARS + 1);
        assert_eq!(excerpt("  tiny  "), "tiny");
    }
}
