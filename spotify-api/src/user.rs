//! Current-user APIs.
//!
//! | Method                                          | Endpoint                 | Paging            |
//! |-------------------------------------------------|--------------------------|-------------------|
//! | [`SpotifyClient::current_user`]                 | `GET /me`                | none              |
//! | [`SpotifyClient::current_user_playlists`]       | `GET /me/playlists`      | offset            |
//! | [`SpotifyClient::current_user_saved_tracks`]    | `GET /me/tracks`         | offset            |
//! | [`SpotifyClient::current_user_followed_artists`]| `GET /me/following`      | cursor (`after`)  |
//!
//! Followed artists are the one cursor-paged shape nested under a typed
//! container:
//! ```json
//! {
//!   "artists": {
//!     "items": [ { "id": "0OdUWJ0s", "name": "..." } ],
//!     "next": "https://api.spotify.com/v1/me/following?type=artist&after=0OdUWJ0s&limit=20",
//!     "cursors": { "after": "0OdUWJ0s" },
//!     "total": 43
//!   }
//! }
//! ```
//!
//! All of these require a user token; `401` means the token expired.

use crate::client::{Query, SpotifyClient, push_opt};
use crate::error::Result;
use serde_json::Value;

impl SpotifyClient {
    /// Profile of the token's owner.
    pub async fn current_user(&self) -> Result<Value> {
        self.get("/me", &Query::new()).await
    }

    /// Playlists owned or followed by the current user.
    pub async fn current_user_playlists(&self, limit: u32, offset: u32) -> Result<Value> {
        let query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        self.get("/me/playlists", &query).await
    }

    /// Tracks in the current user's library.
    pub async fn current_user_saved_tracks(
        &self,
        limit: u32,
        offset: u32,
        market: Option<&str>,
    ) -> Result<Value> {
        let mut query: Query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        push_opt(&mut query, "market", market);
        self.get("/me/tracks", &query).await
    }

    /// Artists the current user follows, starting after the `after` cursor.
    pub async fn current_user_followed_artists(
        &self,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Value> {
        let mut query: Query = vec![("type", "artist".to_owned()), ("limit", limit.to_string())];
        push_opt(&mut query, "after", after);
        self.get("/me/following", &query).await
    }
}
