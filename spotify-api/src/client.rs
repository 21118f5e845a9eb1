//! HTTP client for the Spotify Web API.
//!
//! Every request carries `Authorization: Bearer <access_token>` taken from
//! the token currently installed on the client. The token lives behind a
//! lock as an `Arc<TokenInfo>`; replacing it swaps the whole `Arc`, so a
//! request never sees a half-written token.
//!
//! # Response format
//!
//! Successful responses are returned as raw JSON. An empty body (e.g.
//! `204 No Content`) becomes `null`. Failures use this envelope:
//!
//! ```json
//! { "error": { "status": 404, "message": "Non existing id" } }
//! ```
//!
//! and are mapped to [`SpotifyError::Api`](crate::SpotifyError::Api).

use crate::auth::TokenInfo;
use crate::error::{Result, SpotifyError};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

const BASE_URL: &str = "https://api.spotify.com/v1";

/// Query parameters of one request.
pub type Query = Vec<(&'static str, String)>;

/// Async client for the Spotify Web API.
///
/// API operations are implemented in separate modules (`search`,
/// `catalog`, `playlist`, `user`) as `impl SpotifyClient` blocks.
pub struct SpotifyClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<Arc<TokenInfo>>>,
}

impl SpotifyClient {
    /// Create a client without a token. Install one with
    /// [`install_token`](Self::install_token) before issuing requests.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_owned(),
            token: RwLock::new(None),
        })
    }

    /// Create a client that already holds `token`.
    pub fn with_token(token: TokenInfo) -> Result<Self> {
        let client = Self::new()?;
        client.install_token(token);
        Ok(client)
    }

    /// Send requests to a different API root (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Replace the current token in one write.
    pub fn install_token(&self, token: TokenInfo) {
        let token = Arc::new(token);
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Snapshot of the current token.
    pub fn token(&self) -> Option<Arc<TokenInfo>> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `GET` an endpoint (path below the API root, or an absolute URL under
    /// it).
    pub async fn get(&self, endpoint: &str, query: &Query) -> Result<Value> {
        self.request(Method::GET, endpoint, query, None).await
    }

    /// `POST` a JSON body.
    pub async fn post(&self, endpoint: &str, query: &Query, body: &Value) -> Result<Value> {
        self.request(Method::POST, endpoint, query, Some(body)).await
    }

    /// `PUT` a JSON body.
    pub async fn put(&self, endpoint: &str, query: &Query, body: &Value) -> Result<Value> {
        self.request(Method::PUT, endpoint, query, Some(body)).await
    }

    /// `DELETE` with a JSON body.
    pub async fn delete(&self, endpoint: &str, query: &Query, body: &Value) -> Result<Value> {
        self.request(Method::DELETE, endpoint, query, Some(body)).await
    }

    /// Absolute URLs must point below the API root; the bearer token is
    /// never sent anywhere else.
    fn url(&self, endpoint: &str) -> Result<String> {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Ok(format!("{}{endpoint}", self.base_url));
        }
        let under_root = endpoint
            .strip_prefix(self.base_url.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']));
        if under_root {
            Ok(endpoint.to_owned())
        } else {
            Err(SpotifyError::Other(format!(
                "refusing to send credentials outside {}: {endpoint}",
                self.base_url
            )))
        }
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(endpoint)?;
        let token = self.token().ok_or(SpotifyError::NotAuthenticated)?;
        tracing::debug!(%method, %url, "spotify request");

        let mut req = self
            .http
            .request(method, &url)
            .header("Authorization", token.bearer());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn api_error(status: u16, body: &str) -> SpotifyError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match &v["error"] {
            Value::Object(e) => e.get("message").and_then(Value::as_str).map(String::from),
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                "unknown error".to_owned()
            } else {
                body.to_owned()
            }
        });
    SpotifyError::Api { status, message }
}

/// Append `key=value` to `query` when `value` is present.
pub(crate) fn push_opt<T: ToString>(query: &mut Query, key: &'static str, value: Option<T>) {
    if let Some(v) = value {
        query.push((key, v.to_string()));
    }
}

/// Reduce a bare ID, `spotify:<kind>:<id>` URI, or open.spotify.com URL to
/// the bare ID.
pub fn normalize_id(kind: &str, id: &str) -> Result<String> {
    let id = id.trim();
    if let Some(rest) = id.strip_prefix("spotify:") {
        return match rest.split_once(':') {
            Some((k, bare)) if k == kind => Ok(bare.to_owned()),
            _ => Err(SpotifyError::Other(format!("unexpected {kind} URI: {id}"))),
        };
    }
    if let Some(pos) = id.find("open.spotify.com/") {
        let path = &id[pos + "open.spotify.com/".len()..];
        let path = path.split(['?', '#']).next().unwrap_or_default();
        return match path.split_once('/') {
            Some((k, bare)) if k == kind && !bare.is_empty() => Ok(bare.to_owned()),
            _ => Err(SpotifyError::Other(format!("unexpected {kind} URL: {id}"))),
        };
    }
    if id.is_empty() || id.contains(['/', ':', '?']) {
        return Err(SpotifyError::Other(format!("invalid {kind} id: {id:?}")));
    }
    Ok(id.to_owned())
}

/// `spotify:<kind>:<id>` for any accepted ID form.
pub fn to_uri(kind: &str, id: &str) -> Result<String> {
    Ok(format!("spotify:{kind}:{}", normalize_id(kind, id)?))
}
