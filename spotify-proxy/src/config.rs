//! Service configuration.
//!
//! Settings are layered: `config.json` in the data directory (written with
//! defaults on first run), then environment variables, then CLI flags.
//!
//! ```json
//! {
//!   "user": "alice",
//!   "port": 5151,
//!   "bind": "127.0.0.1",
//!   "cache_dir": null,
//!   "scopes": ["user-library-read", "playlist-read-private"],
//!   "client_id": "...",
//!   "client_secret": "...",
//!   "redirect_uri": "http://127.0.0.1:8888/callback",
//!   "restart_delay_secs": 5
//! }
//! ```
//!
//! | Variable                | Field           |
//! |-------------------------|-----------------|
//! | `SPOTIFY_PROXY_USER`    | `user`          |
//! | `SPOTIFY_PROXY_PORT`    | `port`          |
//! | `SPOTIFY_PROXY_BIND`    | `bind`          |
//! | `SPOTIFY_CLIENT_ID`     | `client_id`     |
//! | `SPOTIFY_CLIENT_SECRET` | `client_secret` |
//! | `SPOTIFY_REDIRECT_URI`  | `redirect_uri`  |

use crate::error::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use spotify_api::{CacheHandler, OAuth};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_PORT: u16 = 5151;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_RESTART_DELAY_SECS: u64 = 5;

const DEFAULT_SCOPES: &[&str] = &[
    "user-library-read",
    "user-follow-read",
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-private",
    "playlist-modify-public",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Identity whose credential cache the service uses.
    pub user: Option<String>,
    pub port: u16,
    pub bind: String,
    /// Directory of the credential cache; the data directory when unset.
    pub cache_dir: Option<PathBuf>,
    pub scopes: Vec<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    /// Pause before the supervisor restarts a failed service.
    pub restart_delay_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            user: None,
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_owned(),
            cache_dir: None,
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_owned()).collect(),
            client_id: None,
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_owned(),
            restart_delay_secs: DEFAULT_RESTART_DELAY_SECS,
        }
    }
}

/// `~/.config/spotify-proxy` (platform equivalent), created if missing.
pub fn data_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| ProxyError::Config("cannot determine config directory".into()))?
        .join("spotify-proxy");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Load `config.json` from `dir`, writing the defaults first if it does not
/// exist yet.
pub fn load_config(dir: &Path) -> Result<ProxyConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        let config = ProxyConfig::default();
        if let Err(e) = save_config(dir, &config) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default config");
        }
        return Ok(config);
    }
    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content)
        .map_err(|e| ProxyError::Config(format!("failed to parse {}: {e}", path.display())))
}

pub fn save_config(dir: &Path, config: &ProxyConfig) -> Result<()> {
    fs::create_dir_all(dir)?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(dir.join(CONFIG_FILE), content)?;
    Ok(())
}

impl ProxyConfig {
    /// Override fields from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`; empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(user) = get("SPOTIFY_PROXY_USER") {
            self.user = Some(user);
        }
        if let Some(port) = get("SPOTIFY_PROXY_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ProxyError::Config(format!("SPOTIFY_PROXY_PORT is not a port: {port}")))?;
        }
        if let Some(bind) = get("SPOTIFY_PROXY_BIND") {
            self.bind = bind;
        }
        if let Some(id) = get("SPOTIFY_CLIENT_ID") {
            self.client_id = Some(id);
        }
        if let Some(secret) = get("SPOTIFY_CLIENT_SECRET") {
            self.client_secret = Some(secret);
        }
        if let Some(uri) = get("SPOTIFY_REDIRECT_URI") {
            self.redirect_uri = uri;
        }
        Ok(())
    }

    /// Check everything needed to start the service.
    pub fn validate(&self) -> Result<()> {
        self.user()?;
        self.credentials()?;
        self.bind_addr()?;
        Ok(())
    }

    pub fn user(&self) -> Result<&str> {
        self.user
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                ProxyError::Config("no user configured (set `user` or SPOTIFY_PROXY_USER)".into())
            })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => Err(ProxyError::Config(
                "client credentials missing (set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET)".into(),
            )),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| ProxyError::Config(format!("invalid bind address {}:{}: {e}", self.bind, self.port)))
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// OAuth helper for the configured application.
    pub fn oauth(&self) -> Result<OAuth> {
        let (id, secret) = self.credentials()?;
        Ok(OAuth::new(id, secret, self.redirect_uri.clone(), self.scopes.clone())?)
    }

    /// Credential cache of the configured user.
    pub fn cache(&self) -> Result<CacheHandler> {
        let user = self.user()?;
        let dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => data_dir()?,
        };
        Ok(CacheHandler::new(&dir, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config, ProxyConfig::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
        assert_eq!(config.port, 5151);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"user":"alice","port":6000}"#).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.user.as_deref(), Some("alice"));
        assert_eq!(config.port, 6000);
        assert_eq!(config.bind, DEFAULT_BIND);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ nope").unwrap();
        assert!(matches!(load_config(dir.path()), Err(ProxyError::Config(_))));
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = ProxyConfig {
            user: Some("file-user".into()),
            ..ProxyConfig::default()
        };
        config
            .apply_env_from(env(&[
                ("SPOTIFY_PROXY_USER", "bob"),
                ("SPOTIFY_PROXY_PORT", "7000"),
                ("SPOTIFY_CLIENT_ID", "id"),
                ("SPOTIFY_CLIENT_SECRET", "secret"),
                ("SPOTIFY_PROXY_BIND", ""),
            ]))
            .unwrap();
        assert_eq!(config.user.as_deref(), Some("bob"));
        assert_eq!(config.port, 7000);
        assert_eq!(config.bind, DEFAULT_BIND);
        config.validate().unwrap();
        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:7000".parse().unwrap());

        let err = config
            .apply_env_from(env(&[("SPOTIFY_PROXY_PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ProxyError::Config(_)));
    }

    #[test]
    fn missing_identity_or_credentials_is_fatal() {
        let mut config = ProxyConfig::default();
        assert!(matches!(config.validate(), Err(ProxyError::Config(_))));

        config.user = Some("alice".into());
        config.client_id = Some("id".into());
        assert!(matches!(config.validate(), Err(ProxyError::Config(_))));
        assert!(config.oauth().is_err());

        config.client_secret = Some("secret".into());
        config.validate().unwrap();
    }

    #[test]
    fn cache_lives_in_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProxyConfig {
            user: Some("alice".into()),
            cache_dir: Some(dir.path().to_path_buf()),
            ..ProxyConfig::default()
        };
        assert_eq!(config.cache().unwrap().path(), dir.path().join(".cache-alice"));
    }
}
