//! Playlist APIs.
//!
//! # Endpoints
//!
//! | Method                                                     | Endpoint                          |
//! |------------------------------------------------------------|-----------------------------------|
//! | [`SpotifyClient::playlist`]                                | `GET /playlists/{id}`             |
//! | [`SpotifyClient::playlist_items`]                          | `GET /playlists/{id}/tracks`      |
//! | [`SpotifyClient::user_playlist_create`]                    | `POST /users/{user}/playlists`    |
//! | [`SpotifyClient::playlist_add_items`]                      | `POST /playlists/{id}/tracks`     |
//! | [`SpotifyClient::playlist_replace_items`]                  | `PUT /playlists/{id}/tracks`      |
//! | [`SpotifyClient::playlist_remove_all_occurrences_of_items`]| `DELETE /playlists/{id}/tracks`   |
//!
//! `playlist_items` pages look like:
//! ```json
//! {
//!   "items": [ { "added_at": "2024-01-01T00:00:00Z", "track": { "id": "...", "name": "..." } } ],
//!   "next": "https://api.spotify.com/v1/playlists/{id}/tracks?offset=100&limit=100",
//!   "total": 250
//! }
//! ```
//!
//! Mutations answer with `{ "snapshot_id": "..." }`. Item lists accept
//! track/episode URIs, URLs, or bare track IDs, at most 100 per call.

use crate::client::{Query, SpotifyClient, normalize_id, push_opt, to_uri};
use crate::error::{Result, SpotifyError};
use serde_json::{Value, json};

/// Upper bound of items per mutation.
const MAX_ITEMS: usize = 100;

impl SpotifyClient {
    /// Get a playlist with its first page of items.
    pub async fn playlist(&self, playlist_id: &str, fields: Option<&str>) -> Result<Value> {
        let id = normalize_id("playlist", playlist_id)?;
        let mut query = Query::new();
        push_opt(&mut query, "fields", fields);
        self.get(&format!("/playlists/{id}"), &query).await
    }

    /// Page through a playlist's items.
    pub async fn playlist_items(
        &self,
        playlist_id: &str,
        fields: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Value> {
        let id = normalize_id("playlist", playlist_id)?;
        let mut query: Query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        push_opt(&mut query, "fields", fields);
        self.get(&format!("/playlists/{id}/tracks"), &query).await
    }

    /// Create a playlist owned by `user`.
    pub async fn user_playlist_create(
        &self,
        user: &str,
        name: &str,
        public: bool,
        description: &str,
    ) -> Result<Value> {
        let body = json!({
            "name": name,
            "public": public,
            "description": description,
        });
        let user = urlencoding::encode(user);
        self.post(&format!("/users/{user}/playlists"), &Query::new(), &body)
            .await
    }

    /// Append (or insert at `position`) items.
    pub async fn playlist_add_items(
        &self,
        playlist_id: &str,
        items: &[String],
        position: Option<u32>,
    ) -> Result<Value> {
        let id = normalize_id("playlist", playlist_id)?;
        let mut body = json!({ "uris": item_uris(items)? });
        if let Some(position) = position {
            body["position"] = json!(position);
        }
        self.post(&format!("/playlists/{id}/tracks"), &Query::new(), &body)
            .await
    }

    /// Replace every item of the playlist with `items`.
    pub async fn playlist_replace_items(&self, playlist_id: &str, items: &[String]) -> Result<Value> {
        let id = normalize_id("playlist", playlist_id)?;
        let body = json!({ "uris": item_uris(items)? });
        self.put(&format!("/playlists/{id}/tracks"), &Query::new(), &body)
            .await
    }

    /// Remove every occurrence of `items`.
    pub async fn playlist_remove_all_occurrences_of_items(
        &self,
        playlist_id: &str,
        items: &[String],
        snapshot_id: Option<&str>,
    ) -> Result<Value> {
        let id = normalize_id("playlist", playlist_id)?;
        let tracks: Vec<Value> = item_uris(items)?
            .into_iter()
            .map(|uri| json!({ "uri": uri }))
            .collect();
        let mut body = json!({ "tracks": tracks });
        if let Some(snapshot_id) = snapshot_id {
            body["snapshot_id"] = json!(snapshot_id);
        }
        self.delete(&format!("/playlists/{id}/tracks"), &Query::new(), &body)
            .await
    }
}

fn item_uris(items: &[String]) -> Result<Vec<String>> {
    if items.len() > MAX_ITEMS {
        return Err(SpotifyError::Other(format!(
            "at most {MAX_ITEMS} items per call, got {}",
            items.len()
        )));
    }
    items.iter().map(String::as_str).map(item_uri).collect()
}

/// Episodes are recognized by URI or URL form only; bare IDs are tracks.
fn item_uri(item: &str) -> Result<String> {
    let trimmed = item.trim();
    let is_episode =
        trimmed.starts_with("spotify:episode:") || trimmed.contains("open.spotify.com/episode/");
    to_uri(if is_episode { "episode" } else { "track" }, item)
}
