//! Token state and the on-disk credential cache.
//!
//! One cache file exists per caller identity, stored at
//! `<cache_dir>/.cache-<user>` and containing the last token response:
//!
//! ```json
//! {
//!   "access_token": "BQD...",
//!   "token_type": "Bearer",
//!   "scope": "playlist-modify-private user-library-read",
//!   "expires_in": 3600,
//!   "expires_at": 1718000000,
//!   "refresh_token": "AQC..."
//! }
//! ```
//!
//! `expires_at` is an absolute unix timestamp in seconds, computed when the
//! token was issued. It is the only field consulted to decide freshness.

use crate::error::{Result, SpotifyError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An access/refresh token pair with its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Bearer token sent on every API request.
    pub access_token: String,
    /// Always `"Bearer"` for this API.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Space-separated scopes granted to this token.
    #[serde(default)]
    pub scope: String,
    /// Lifetime in seconds as reported by the accounts service.
    #[serde(default)]
    pub expires_in: i64,
    /// Absolute expiry, unix seconds.
    pub expires_at: i64,
    /// Long-lived token used to mint new access tokens.
    pub refresh_token: String,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

impl TokenInfo {
    /// Build a token that expires `expires_in` seconds from now.
    pub fn issued_now(
        access_token: String,
        refresh_token: String,
        scope: String,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            token_type: default_token_type(),
            scope,
            expires_in,
            expires_at: Utc::now().timestamp() + expires_in,
            refresh_token,
        }
    }

    /// Seconds left before expiry at `now` (negative once expired).
    pub fn seconds_left(&self, now: i64) -> i64 {
        self.expires_at - now
    }

    /// Time left before expiry, saturating at zero.
    pub fn remaining(&self) -> Duration {
        let secs = self.seconds_left(Utc::now().timestamp());
        Duration::from_secs(u64::try_from(secs).unwrap_or(0))
    }

    /// Whether the token expires within `margin` from now.
    pub fn is_expiring(&self, margin: Duration) -> bool {
        let margin = i64::try_from(margin.as_secs()).unwrap_or(i64::MAX);
        self.seconds_left(Utc::now().timestamp()) < margin
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Reads and writes the credential cache of one caller identity.
#[derive(Debug, Clone)]
pub struct CacheHandler {
    path: PathBuf,
}

impl CacheHandler {
    /// Cache for `user` inside `cache_dir`.
    pub fn new(cache_dir: &Path, user: &str) -> Self {
        Self {
            path: cache_dir.join(format!(".cache-{user}")),
        }
    }

    /// Cache for `user` inside the default directory
    /// (`~/.config/spotify-proxy`).
    pub fn for_user(user: &str) -> Result<Self> {
        Ok(Self::new(&default_cache_dir()?, user))
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached token. Returns `None` if the file does not exist.
    pub fn load(&self) -> Result<Option<TokenInfo>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Save the token, creating parent directories if needed.
    pub fn save(&self, token: &TokenInfo) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(token)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Delete the cache file.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// `~/.config/spotify-proxy` (platform equivalent).
pub fn default_cache_dir() -> Result<PathBuf> {
    let config = dirs::config_dir()
        .ok_or_else(|| SpotifyError::Other("cannot determine config directory".into()))?;
    Ok(config.join("spotify-proxy"))
}
