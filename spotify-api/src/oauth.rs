//! OAuth 2.0 authorization-code flow against the accounts service.
//!
//! # Endpoints
//!
//! ## Authorize: `GET https://accounts.spotify.com/authorize`
//!
//! Opened once in a browser by [`OAuth::authorize_url`]. The user is
//! redirected to `redirect_uri?code=...&state=...`.
//!
//! ## Token: `POST https://accounts.spotify.com/api/token`
//!
//! Form-encoded body, client credentials in a `Basic` header:
//!
//! - `grant_type=authorization_code&code=...&redirect_uri=...`
//! - `grant_type=refresh_token&refresh_token=...`
//!
//! Response:
//! ```json
//! {
//!   "access_token": "BQD...",
//!   "token_type": "Bearer",
//!   "scope": "user-library-read",
//!   "expires_in": 3600,
//!   "refresh_token": "AQC..."
//! }
//! ```
//!
//! A refresh response may omit `refresh_token`; the previous one stays valid.

use crate::auth::{CacheHandler, TokenInfo};
use crate::error::{Result, SpotifyError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Tokens closer than this to expiry are refreshed by [`OAuth::authenticate`].
const AUTHENTICATE_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    scope: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

/// Application credentials plus the scopes requested at login.
#[derive(Debug, Clone)]
pub struct OAuth {
    http: Client,
    accounts_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl OAuth {
    /// Create an OAuth helper for the given application.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            accounts_url: ACCOUNTS_URL.to_owned(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
        })
    }

    /// Point token requests at a different accounts host.
    #[must_use]
    pub fn with_accounts_url(mut self, url: impl Into<String>) -> Self {
        self.accounts_url = url.into();
        self
    }

    /// Space-separated scope string.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// URL the user opens to grant access.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
            self.accounts_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scope()),
            urlencoding::encode(state),
        )
    }

    /// Exchange the authorization code from the redirect for a token.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenInfo> {
        let body = format!(
            "grant_type=authorization_code&code={}&redirect_uri={}",
            urlencoding::encode(code),
            urlencoding::encode(&self.redirect_uri),
        );
        let resp = self.token_request(body).await?;
        let refresh_token = resp
            .refresh_token
            .ok_or_else(|| SpotifyError::Auth("token response without refresh_token".into()))?;
        Ok(TokenInfo::issued_now(
            resp.access_token,
            refresh_token,
            resp.scope,
            resp.expires_in,
        ))
    }

    /// Mint a new access token from `token`'s refresh token.
    pub async fn refresh(&self, token: &TokenInfo) -> Result<TokenInfo> {
        let body = format!(
            "grant_type=refresh_token&refresh_token={}",
            urlencoding::encode(&token.refresh_token),
        );
        let resp = self.token_request(body).await?;
        let scope = if resp.scope.is_empty() {
            token.scope.clone()
        } else {
            resp.scope
        };
        Ok(TokenInfo::issued_now(
            resp.access_token,
            resp.refresh_token
                .unwrap_or_else(|| token.refresh_token.clone()),
            scope,
            resp.expires_in,
        ))
    }

    /// Produce a valid token from the persisted cache, refreshing (and
    /// re-persisting) it when it is expired or about to expire.
    ///
    /// # Errors
    ///
    /// - [`SpotifyError::NotAuthenticated`]: no cached credentials
    /// - [`SpotifyError::Auth`]: the refresh token was rejected
    pub async fn authenticate(&self, cache: &CacheHandler) -> Result<TokenInfo> {
        let cached = cache.load()?.ok_or(SpotifyError::NotAuthenticated)?;
        if !cached.is_expiring(AUTHENTICATE_MARGIN) {
            return Ok(cached);
        }
        tracing::info!("cached token expired, refreshing");
        let token = self.refresh(&cached).await?;
        cache.save(&token)?;
        Ok(token)
    }

    fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }

    async fn token_request(&self, body: String) -> Result<TokenResponse> {
        let resp = self
            .http
            .post(format!("{}/api/token", self.accounts_url))
            .header("Authorization", self.basic_auth())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let detail = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| {
                    v.get("error_description")
                        .or_else(|| v.get("error"))
                        .and_then(serde_json::Value::as_str)
                        .map(String::from)
                })
                .unwrap_or(text);
            return Err(SpotifyError::Auth(format!("{status}: {detail}")));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pull the `code` parameter out of a pasted redirect URL. A bare code is
/// returned unchanged.
pub fn parse_response_code(input: &str) -> Option<String> {
    let input = input.trim();
    let Some((_, query)) = input.split_once('?') else {
        return (!input.is_empty()).then(|| input.to_owned());
    };
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "code")
        .and_then(|(_, v)| urlencoding::decode(v).ok())
        .map(|v| v.into_owned())
}
