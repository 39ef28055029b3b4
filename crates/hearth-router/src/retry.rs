// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with exponential backoff and a per-attempt timeout.

use std::time::Duration;

use hearth_config::model::ModelsConfig;
use hearth_core::{ChatResponse, HearthError, ProviderClient, ProviderRequest};
use tracing::{debug, warn};

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How one candidate model is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
    /// Deadline for each individual attempt.
    pub request_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ModelsConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Calls `client` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Timeouts count as retryable failures. Non-retryable errors return
    /// immediately without sleeping.
    pub async fn call(
        &self,
        client: &dyn ProviderClient,
        request: &ProviderRequest,
    ) -> Result<ChatResponse, HearthError> {
        let mut attempt = 0u32;
        loop {
            let result = match tokio::time::timeout(self.request_timeout, client.chat(request.clone()))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(HearthError::Timeout {
                    duration: self.request_timeout,
                }),
            };

            match result {
                Ok(response) => {
                    debug!(model = %request.model, attempt, "provider call succeeded");
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!(
                        model = %request.model,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient provider error, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use hearth_core::{FinishReason, TokenUsage};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            request_timeout: Duration::from_millis(200),
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "m".into(),
            messages: vec![],
            tools: vec![],
            max_tokens: 16,
            temperature: 0.0,
        }
    }

    fn ok() -> ChatResponse {
        ChatResponse {
            content: Some("ok".into()),
            tool_calls: None,
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
        }
    }

    /// Fails with `status` for the first `failures` calls.
    struct Flaky {
        failures: u32,
        status: u16,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ProviderClient for Flaky {
        async fn chat(&self, _request: ProviderRequest) -> Result<ChatResponse, HearthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(HearthError::provider_status(self.status, "flaky"))
            } else {
                Ok(ok())
            }
        }
    }

    struct Slow;

    #[async_trait]
    impl ProviderClient for Slow {
        async fn chat(&self, _request: ProviderRequest) -> Result<ChatResponse, HearthError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(ok())
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(1),
        };
        assert_eq!(p.backoff(1), Duration::from_millis(500));
        assert_eq!(p.backoff(2), Duration::from_millis(1000));
        assert_eq!(p.backoff(3), Duration::from_millis(2000));
        assert_eq!(p.backoff(20), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let client = Flaky {
            failures: 2,
            status: 503,
            calls: AtomicU32::new(0),
        };
        assert!(policy(2).call(&client, &request()).await.is_ok());
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let client = Flaky {
            failures: u32::MAX,
            status: 429,
            calls: AtomicU32::new(0),
        };
        assert!(policy(1).call(&client, &request()).await.is_err());
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let client = Flaky {
            failures: u32::MAX,
            status: 401,
            calls: AtomicU32::new(0),
        };
        let err = policy(3).call(&client, &request()).await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_attempt_times_out() {
        let err = policy(0).call(&Slow, &request()).await.unwrap_err();
        assert!(matches!(err, HearthError::Timeout { .. }));
    }
}
