//! Search and page-cursor APIs.
//!
//! # Endpoints
//!
//! ## `search`: `GET /search`
//!
//! Query: `q`, `type` (comma-separated), `limit` (max 50), `offset`,
//! optional `market`.
//!
//! Response, one container per requested type:
//! ```json
//! {
//!   "tracks": {
//!     "href": "https://api.spotify.com/v1/search?query=...&offset=0&limit=10",
//!     "items": [ { "id": "4uLU6hMC", "name": "...", "artists": [...] } ],
//!     "limit": 10,
//!     "next": "https://api.spotify.com/v1/search?query=...&offset=10&limit=10",
//!     "offset": 0,
//!     "previous": null,
//!     "total": 268
//!   }
//! }
//! ```
//!
//! ## `next` / `previous`
//!
//! Every paged object carries absolute `next`/`previous` URLs (or `null`).
//! These operations `GET` that URL verbatim. Following a search cursor
//! yields the same `{ "<type>s": { ... } }` wrapper again.

use crate::client::{Query, SpotifyClient, push_opt};
use crate::error::Result;
use crate::types::SearchType;
use serde_json::Value;

impl SpotifyClient {
    /// Search the catalog.
    ///
    /// # Errors
    ///
    /// - [`SpotifyError::Http`](crate::SpotifyError::Http): network failure
    /// - [`SpotifyError::Api`](crate::SpotifyError::Api): e.g. an empty `q`
    pub async fn search(
        &self,
        q: &str,
        types: &[SearchType],
        limit: u32,
        offset: u32,
        market: Option<&str>,
    ) -> Result<Value> {
        let mut query: Query = vec![
            ("q", q.to_owned()),
            ("type", SearchType::join(types)),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        push_opt(&mut query, "market", market);
        self.get("/search", &query).await
    }

    /// Fetch the page after `page`, or `null` when `page` is the last one.
    pub async fn next(&self, page: &Value) -> Result<Value> {
        self.follow(page, "next").await
    }

    /// Fetch the page before `page`, or `null` when `page` is the first one.
    pub async fn previous(&self, page: &Value) -> Result<Value> {
        self.follow(page, "previous").await
    }

    async fn follow(&self, page: &Value, cursor: &str) -> Result<Value> {
        match page.get(cursor).and_then(Value::as_str) {
            Some(url) if !url.is_empty() => self.get(url, &Query::new()).await,
            _ => Ok(Value::Null),
        }
    }
}
