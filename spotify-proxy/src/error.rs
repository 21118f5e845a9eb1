//! Error types for the proxy service.

use spotify_api::SpotifyError;
use thiserror::Error;

/// Errors that stop the service (and make the supervisor restart it).
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Missing or invalid configuration (identity, client credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// The initial authentication from the credential cache failed.
    #[error("startup authentication failed: {0}")]
    Startup(#[source] SpotifyError),

    /// Any other Spotify client error.
    #[error(transparent)]
    Spotify(#[from] SpotifyError),

    /// Binding or serving the HTTP endpoint failed.
    #[error("server error: {0}")]
    Server(String),

    /// File I/O error (config read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, ProxyError>`.
pub type Result<T> = std::result::Result<T, ProxyError>;
