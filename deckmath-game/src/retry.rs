//! Bounded retry for idempotent reads.
//!
//! Only `/next` is ever retried. Answer submission, skips and pool changes go
//! out exactly once so the server never scores a request twice.

use serde::{Deserialize, Serialize};

use crate::Transport;
use crate::config::ConfigError;
use crate::constants::{READ_RETRY_ATTEMPTS, READ_RETRY_BACKOFF_MS};
use crate::protocol::{ApiRequest, HttpReply};
use crate::transport::TransportError;

const MAX_RETRY_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    #[serde(default = "RetryPolicy::default_attempts")]
    pub attempts: u32,
    /// Linear backoff step in milliseconds.
    #[serde(default = "RetryPolicy::default_backoff_ms")]
    pub backoff_ms: u32,
}

impl RetryPolicy {
    const fn default_attempts() -> u32 {
        READ_RETRY_ATTEMPTS
    }

    const fn default_backoff_ms() -> u32 {
        READ_RETRY_BACKOFF_MS
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            attempts: 0,
            backoff_ms: 0,
        }
    }

    /// Wait before retry number `attempt` (1-based).
    #[must_use]
    pub const fn delay_before(&self, attempt: u32) -> u32 {
        self.backoff_ms.saturating_mul(attempt)
    }

    #[must_use]
    pub const fn applies_to(&self, request: &ApiRequest) -> bool {
        request.endpoint().is_idempotent()
    }

    /// # Errors
    ///
    /// Returns an error when more than two retries are configured.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::RangeViolation {
                field: "retry.attempts",
                min: 0,
                max: MAX_RETRY_ATTEMPTS as i64,
                value: self.attempts as i64,
            });
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: Self::default_attempts(),
            backoff_ms: Self::default_backoff_ms(),
        }
    }
}

/// Server faults worth another try; client errors are final.
fn is_retryable(result: &Result<HttpReply, TransportError>) -> bool {
    match result {
        Ok(reply) => reply.status >= 500,
        Err(err) => err.is_retryable(),
    }
}

/// Execute `request`, retrying idempotent reads per `policy`.
///
/// # Errors
///
/// Returns the last transport error once every permitted attempt failed.
pub async fn send_with_retry<T>(
    transport: &T,
    policy: &RetryPolicy,
    request: &ApiRequest,
) -> Result<HttpReply, TransportError>
where
    T: Transport + ?Sized,
{
    let retries = if policy.applies_to(request) {
        policy.attempts
    } else {
        0
    };
    let mut result = transport.send(request).await;
    for attempt in 1..=retries {
        if !is_retryable(&result) {
            break;
        }
        log::debug!(
            "retrying {} (attempt {attempt} of {retries})",
            request.endpoint().label()
        );
        transport.pause(policy.delay_before(attempt)).await;
        result = transport.send(request).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CheckRequest, ClientIds, NextQuery};
    use async_trait::async_trait;
    use serde_json::json;
    use std::cell::RefCell;

    struct FlakyTransport {
        failures_left: RefCell<u32>,
        calls: RefCell<u32>,
        pauses: RefCell<Vec<u32>>,
    }

    impl FlakyTransport {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: RefCell::new(times),
                calls: RefCell::new(0),
                pauses: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl Transport for FlakyTransport {
        async fn send(&self, _request: &ApiRequest) -> Result<HttpReply, TransportError> {
            *self.calls.borrow_mut() += 1;
            let mut left = self.failures_left.borrow_mut();
            if *left > 0 {
                *left -= 1;
                return Err(TransportError::Network("connection reset".to_string()));
            }
            Ok(HttpReply::ok(json!({"ok": true})))
        }

        async fn pause(&self, millis: u32) {
            self.pauses.borrow_mut().push(millis);
        }
    }

    fn next_request() -> ApiRequest {
        ApiRequest::Next(NextQuery {
            theme: "classic".to_string(),
            level: "easy".to_string(),
            seq: 1,
            target: None,
            case_id: None,
            ids: ClientIds::default(),
        })
    }

    fn check_request() -> ApiRequest {
        ApiRequest::Check(CheckRequest {
            values: vec![1, 2, 3, 4],
            answer: "1*2*3*4".to_string(),
            case_id: None,
            target: Some(24),
            step: None,
            ids: ClientIds::default(),
        })
    }

    #[tokio::test]
    async fn reads_retry_once_with_linear_backoff() {
        let transport = FlakyTransport::failing(1);
        let reply = send_with_retry(&transport, &RetryPolicy::default(), &next_request()).await;
        assert!(reply.is_ok());
        assert_eq!(*transport.calls.borrow(), 2);
        assert_eq!(*transport.pauses.borrow(), vec![250]);
    }

    #[tokio::test]
    async fn reads_give_up_after_the_budget() {
        let transport = FlakyTransport::failing(5);
        let reply = send_with_retry(&transport, &RetryPolicy::default(), &next_request()).await;
        assert!(reply.is_err());
        assert_eq!(*transport.calls.borrow(), 2);
    }

    #[tokio::test]
    async fn answers_are_never_retried() {
        let transport = FlakyTransport::failing(1);
        let reply = send_with_retry(&transport, &RetryPolicy::default(), &check_request()).await;
        assert!(reply.is_err());
        assert_eq!(*transport.calls.borrow(), 1);
        assert!(transport.pauses.borrow().is_empty());
    }

    #[test]
    fn backoff_is_linear() {
        let policy = RetryPolicy {
            attempts: 2,
            backoff_ms: 250,
        };
        assert_eq!(policy.delay_before(1), 250);
        assert_eq!(policy.delay_before(2), 500);
        assert!(policy.validate().is_ok());
        assert!(RetryPolicy { attempts: 3, ..policy }.validate().is_err());
    }
}
