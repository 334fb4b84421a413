// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single delivery attempt.
#[derive(Debug, Error)]
pub enum FlushError {
    /// The batch could not be serialized.
    #[error("failed to encode batch: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Transport-level issue (DNS, TLS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The ingest endpoint answered with a non-2xx status.
    #[error("ingest endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl FlushError {
    /// Whether a later attempt with the same batch may succeed.
    ///
    /// Encoding failures and 4xx rejections (other than 408/429) are
    /// permanent: resending the same payload cannot change the outcome.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Encoding(_) => false,
            Self::Transport(_) => true,
            Self::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

/// Errors surfaced by the public client API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The client has been closed and its worker is gone.
    #[error("client is closed")]
    Closed,

    #[error(transparent)]
    Flush(#[from] FlushError),

    #[error("ingestion worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(code: u16) -> FlushError {
        FlushError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            body: String::new(),
        }
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(status_error(500).is_retryable());
        assert!(status_error(502).is_retryable());
        assert!(status_error(503).is_retryable());
    }

    #[test]
    fn throttling_and_timeouts_are_retryable() {
        assert!(status_error(408).is_retryable());
        assert!(status_error(429).is_retryable());
    }

    #[test]
    fn client_errors_are_permanent() {
        assert!(!status_error(400).is_retryable());
        assert!(!status_error(401).is_retryable());
        assert!(!status_error(403).is_retryable());
        assert!(!status_error(302).is_retryable());
    }

    #[test]
    fn encoding_errors_are_permanent() {
        let err = serde_json::from_str::<u32>("not a number").unwrap_err();
        assert!(!FlushError::Encoding(err).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let error = status_error(401);
        assert_eq!(
            error.to_string(),
            "ingest endpoint returned status 401 Unauthorized: "
        );
        assert_eq!(ClientError::Closed.to_string(), "client is closed");
        assert_eq!(
            ClientError::from(status_error(503)).to_string(),
            "ingest endpoint returned status 503 Service Unavailable: "
        );
    }
}
