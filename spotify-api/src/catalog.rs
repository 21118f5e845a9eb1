//! Track, artist, and album lookups.
//!
//! # Endpoints
//!
//! | Method                               | Endpoint                        | Shape                         |
//! |--------------------------------------|---------------------------------|-------------------------------|
//! | [`SpotifyClient::track`]             | `GET /tracks/{id}`              | single track object           |
//! | [`SpotifyClient::tracks`]            | `GET /tracks?ids=`              | `{ "tracks": [...] }` (≤ 50)  |
//! | [`SpotifyClient::artist`]            | `GET /artists/{id}`             | single artist object          |
//! | [`SpotifyClient::artists`]           | `GET /artists?ids=`             | `{ "artists": [...] }` (≤ 50) |
//! | [`SpotifyClient::artist_albums`]     | `GET /artists/{id}/albums`      | paged `{ "items", "next" }`   |
//! | [`SpotifyClient::artist_top_tracks`] | `GET /artists/{id}/top-tracks`  | `{ "tracks": [...] }`         |
//! | [`SpotifyClient::album`]             | `GET /albums/{id}`              | album with paged `tracks`     |
//! | [`SpotifyClient::album_tracks`]      | `GET /albums/{id}/tracks`       | paged `{ "items", "next" }`   |
//!
//! IDs may be given bare, as `spotify:` URIs, or as open.spotify.com URLs.

use crate::client::{Query, SpotifyClient, normalize_id, push_opt};
use crate::error::{Result, SpotifyError};
use serde_json::Value;

/// Upper bound of IDs per batch lookup.
const MAX_BATCH: usize = 50;

impl SpotifyClient {
    /// Get one track.
    pub async fn track(&self, track_id: &str, market: Option<&str>) -> Result<Value> {
        let id = normalize_id("track", track_id)?;
        let mut query = Query::new();
        push_opt(&mut query, "market", market);
        self.get(&format!("/tracks/{id}"), &query).await
    }

    /// Get up to 50 tracks in one call.
    pub async fn tracks(&self, track_ids: &[String], market: Option<&str>) -> Result<Value> {
        let mut query = vec![("ids", join_ids("track", track_ids)?)];
        push_opt(&mut query, "market", market);
        self.get("/tracks", &query).await
    }

    /// Get one artist.
    pub async fn artist(&self, artist_id: &str) -> Result<Value> {
        let id = normalize_id("artist", artist_id)?;
        self.get(&format!("/artists/{id}"), &Query::new()).await
    }

    /// Get up to 50 artists in one call.
    pub async fn artists(&self, artist_ids: &[String]) -> Result<Value> {
        let query = vec![("ids", join_ids("artist", artist_ids)?)];
        self.get("/artists", &query).await
    }

    /// Page through an artist's releases.
    ///
    /// `include_groups` is a comma-separated subset of
    /// `album,single,appears_on,compilation`.
    pub async fn artist_albums(
        &self,
        artist_id: &str,
        include_groups: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Value> {
        let id = normalize_id("artist", artist_id)?;
        let mut query: Query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        push_opt(&mut query, "include_groups", include_groups);
        self.get(&format!("/artists/{id}/albums"), &query).await
    }

    /// An artist's most popular tracks in `country`.
    pub async fn artist_top_tracks(&self, artist_id: &str, country: &str) -> Result<Value> {
        let id = normalize_id("artist", artist_id)?;
        let query = vec![("market", country.to_owned())];
        self.get(&format!("/artists/{id}/top-tracks"), &query).await
    }

    /// Get one album, including its first page of tracks.
    pub async fn album(&self, album_id: &str, market: Option<&str>) -> Result<Value> {
        let id = normalize_id("album", album_id)?;
        let mut query = Query::new();
        push_opt(&mut query, "market", market);
        self.get(&format!("/albums/{id}"), &query).await
    }

    /// Page through an album's tracks.
    pub async fn album_tracks(&self, album_id: &str, limit: u32, offset: u32) -> Result<Value> {
        let id = normalize_id("album", album_id)?;
        let query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        self.get(&format!("/albums/{id}/tracks"), &query).await
    }
}

fn join_ids(kind: &str, ids: &[String]) -> Result<String> {
    if ids.len() > MAX_BATCH {
        return Err(SpotifyError::Other(format!(
            "at most {MAX_BATCH} {kind} ids per call, got {}",
            ids.len()
        )));
    }
    let ids = ids
        .iter()
        .map(|id| normalize_id(kind, id))
        .collect::<Result<Vec<_>>>()?;
    Ok(ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_mixed_id_forms() {
        let ids = vec!["a1".to_owned(), "spotify:artist:b2".to_owned()];
        assert_eq!(join_ids("artist", &ids).unwrap(), "a1,b2");
    }

    #[test]
    fn rejects_oversized_batch() {
        let ids: Vec<String> = (0..51).map(|i| format!("id{i}")).collect();
        assert!(join_ids("track", &ids).is_err());
    }
}
