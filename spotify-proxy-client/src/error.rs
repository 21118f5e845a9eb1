//! Error types for the proxy client.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`ProxyClient`](crate::ProxyClient) calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (connection refused,
    /// DNS failure, socket timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with an `{"error": ...}` body or a non-200
    /// status.
    ///
    /// - `400`: unknown method or bad arguments (never retried)
    /// - `500`: the Spotify call itself failed
    #[error("proxy error (status {status}): {message}")]
    Remote {
        /// HTTP status of the reply.
        status: u16,
        /// Error text reported by the service.
        message: String,
    },

    /// The call's overall time budget ran out before a result arrived.
    #[error("call timed out after {elapsed:?} ({attempts} attempts)")]
    Timeout {
        /// Time spent on the call so far.
        elapsed: Duration,
        /// Requests actually sent.
        attempts: u32,
    },

    /// Arguments rejected locally, before any request was sent.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Failed to encode arguments or decode a reply.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether another attempt may succeed. Invocation errors (4xx) are
    /// deterministic and are not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Remote { status, .. } => !(400..500).contains(status),
            Self::Timeout { .. } | Self::InvalidArguments(_) | Self::Json(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Convenience alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;
