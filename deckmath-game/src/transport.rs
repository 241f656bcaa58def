use thiserror::Error;

use crate::protocol::ProtocolError;

/// Failures raised while moving a request to the server and back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),
    /// A response arrived but its body was not JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// Whether a repeat of the same request could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_failures_retry() {
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(!TransportError::InvalidBody("<html>".into()).is_retryable());
        let protocol = TransportError::from(ProtocolError::Encode {
            endpoint: "check",
            message: "boom".into(),
        });
        assert!(!protocol.is_retryable());
        assert_eq!(protocol.to_string(), "could not encode check request: boom");
    }
}
