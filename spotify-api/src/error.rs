//! Error types for the Spotify Web API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Spotify Web API.
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// HTTP transport error (connection refused, timeout, TLS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    ///
    /// Common statuses:
    /// - `401`: access token expired or revoked
    /// - `403`: missing scope for this endpoint
    /// - `404`: unknown ID
    /// - `429`: rate limited
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status returned by the API.
        status: u16,
        /// Human-readable error message from the API error envelope.
        message: String,
    },

    /// The accounts service rejected a token request (bad code, revoked
    /// refresh token, wrong client credentials).
    #[error("authorization failed: {0}")]
    Auth(String),

    /// No access token is installed on the client. Run `login` first.
    #[error("not authenticated")]
    NotAuthenticated,

    /// File I/O error (credential cache read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or produce JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors (e.g. missing config directory, bad ID).
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for `Result<T, SpotifyError>`.
pub type Result<T> = std::result::Result<T, SpotifyError>;
