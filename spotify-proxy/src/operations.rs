//! The Spotify operations exposed over the wire.
//!
//! Parameter names, order and defaults follow the client methods of
//! `spotify-api`; every operation may be called positionally, by keyword,
//! or mixed.
//!
//! | Method                                      | Parameters                                             |
//! |---------------------------------------------|--------------------------------------------------------|
//! | `search`                                    | `q, limit=10, offset=0, type="track", market=None`     |
//! | `next` / `previous`                         | `result`                                               |
//! | `track`                                     | `track_id, market=None`                                |
//! | `tracks`                                    | `tracks, market=None`                                  |
//! | `artist`                                    | `artist_id`                                            |
//! | `artists`                                   | `artists`                                              |
//! | `artist_albums`                             | `artist_id, include_groups=None, limit=20, offset=0`   |
//! | `artist_top_tracks`                         | `artist_id, country="US"`                              |
//! | `album`                                     | `album_id, market=None`                                |
//! | `album_tracks`                              | `album_id, limit=50, offset=0`                         |
//! | `playlist`                                  | `playlist_id, fields=None`                             |
//! | `playlist_items`                            | `playlist_id, fields=None, limit=100, offset=0`        |
//! | `user_playlist_create`                      | `user, name, public=true, description=""`              |
//! | `playlist_add_items`                        | `playlist_id, items, position=None`                    |
//! | `playlist_replace_items`                    | `playlist_id, items`                                   |
//! | `playlist_remove_all_occurrences_of_items`  | `playlist_id, items, snapshot_id=None`                 |
//! | `current_user` / `me`                       | none                                                   |
//! | `current_user_playlists`                    | `limit=50, offset=0`                                   |
//! | `current_user_saved_tracks`                 | `limit=20, offset=0, market=None`                      |
//! | `current_user_followed_artists`             | `limit=20, after=None`                                 |

use crate::dispatch::{Args, InvokeError, Registry};
use serde_json::Value;
use spotify_api::SpotifyClient;
use spotify_api::types::SearchType;
use std::sync::Arc;

type Client = Arc<SpotifyClient>;
type Outcome = Result<Value, InvokeError>;

impl Registry<SpotifyClient> {
    /// Registry holding every operation in the table above.
    pub fn spotify() -> Self {
        let mut registry = Self::new();
        registry
            .register("search", search)
            .register("next", next)
            .register("previous", previous)
            .register("track", track)
            .register("tracks", tracks)
            .register("artist", artist)
            .register("artists", artists)
            .register("artist_albums", artist_albums)
            .register("artist_top_tracks", artist_top_tracks)
            .register("album", album)
            .register("album_tracks", album_tracks)
            .register("playlist", playlist)
            .register("playlist_items", playlist_items)
            .register("user_playlist_create", user_playlist_create)
            .register("playlist_add_items", playlist_add_items)
            .register("playlist_replace_items", playlist_replace_items)
            .register(
                "playlist_remove_all_occurrences_of_items",
                playlist_remove_all_occurrences_of_items,
            )
            .register("current_user", current_user)
            .register("me", current_user)
            .register("current_user_playlists", current_user_playlists)
            .register("current_user_saved_tracks", current_user_saved_tracks)
            .register("current_user_followed_artists", current_user_followed_artists);
        registry
    }
}

async fn search(c: Client, mut a: Args) -> Outcome {
    let q: String = a.required(0, "q")?;
    let limit = a.or(1, "limit", 10)?;
    let offset = a.or(2, "offset", 0)?;
    let kind: String = a.or(3, "type", "track".to_owned())?;
    let market: Option<String> = a.optional(4, "market")?;
    a.finish()?;
    let types = SearchType::parse_list(&kind).map_err(InvokeError::arguments)?;
    Ok(c.search(&q, &types, limit, offset, market.as_deref()).await?)
}

async fn next(c: Client, mut a: Args) -> Outcome {
    let page: Value = a.required(0, "result")?;
    a.finish()?;
    Ok(c.next(&page).await?)
}

async fn previous(c: Client, mut a: Args) -> Outcome {
    let page: Value = a.required(0, "result")?;
    a.finish()?;
    Ok(c.previous(&page).await?)
}

async fn track(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "track_id")?;
    let market: Option<String> = a.optional(1, "market")?;
    a.finish()?;
    Ok(c.track(&id, market.as_deref()).await?)
}

async fn tracks(c: Client, mut a: Args) -> Outcome {
    let ids: Vec<String> = a.required(0, "tracks")?;
    let market: Option<String> = a.optional(1, "market")?;
    a.finish()?;
    Ok(c.tracks(&ids, market.as_deref()).await?)
}

async fn artist(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "artist_id")?;
    a.finish()?;
    Ok(c.artist(&id).await?)
}

async fn artists(c: Client, mut a: Args) -> Outcome {
    let ids: Vec<String> = a.required(0, "artists")?;
    a.finish()?;
    Ok(c.artists(&ids).await?)
}

async fn artist_albums(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "artist_id")?;
    let include_groups: Option<String> = a.optional(1, "include_groups")?;
    let limit = a.or(2, "limit", 20)?;
    let offset = a.or(3, "offset", 0)?;
    a.finish()?;
    Ok(c.artist_albums(&id, include_groups.as_deref(), limit, offset).await?)
}

async fn artist_top_tracks(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "artist_id")?;
    let country: String = a.or(1, "country", "US".to_owned())?;
    a.finish()?;
    Ok(c.artist_top_tracks(&id, &country).await?)
}

async fn album(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "album_id")?;
    let market: Option<String> = a.optional(1, "market")?;
    a.finish()?;
    Ok(c.album(&id, market.as_deref()).await?)
}

async fn album_tracks(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "album_id")?;
    let limit = a.or(1, "limit", 50)?;
    let offset = a.or(2, "offset", 0)?;
    a.finish()?;
    Ok(c.album_tracks(&id, limit, offset).await?)
}

async fn playlist(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "playlist_id")?;
    let fields: Option<String> = a.optional(1, "fields")?;
    a.finish()?;
    Ok(c.playlist(&id, fields.as_deref()).await?)
}

async fn playlist_items(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "playlist_id")?;
    let fields: Option<String> = a.optional(1, "fields")?;
    let limit = a.or(2, "limit", 100)?;
    let offset = a.or(3, "offset", 0)?;
    a.finish()?;
    Ok(c.playlist_items(&id, fields.as_deref(), limit, offset).await?)
}

async fn user_playlist_create(c: Client, mut a: Args) -> Outcome {
    let user: String = a.required(0, "user")?;
    let name: String = a.required(1, "name")?;
    let public = a.or(2, "public", true)?;
    let description: String = a.or(3, "description", String::new())?;
    a.finish()?;
    Ok(c.user_playlist_create(&user, &name, public, &description).await?)
}

async fn playlist_add_items(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "playlist_id")?;
    let items: Vec<String> = a.required(1, "items")?;
    let position: Option<u32> = a.optional(2, "position")?;
    a.finish()?;
    Ok(c.playlist_add_items(&id, &items, position).await?)
}

async fn playlist_replace_items(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "playlist_id")?;
    let items: Vec<String> = a.required(1, "items")?;
    a.finish()?;
    Ok(c.playlist_replace_items(&id, &items).await?)
}

async fn playlist_remove_all_occurrences_of_items(c: Client, mut a: Args) -> Outcome {
    let id: String = a.required(0, "playlist_id")?;
    let items: Vec<String> = a.required(1, "items")?;
    let snapshot_id: Option<String> = a.optional(2, "snapshot_id")?;
    a.finish()?;
    Ok(c
        .playlist_remove_all_occurrences_of_items(&id, &items, snapshot_id.as_deref())
        .await?)
}

async fn current_user(c: Client, a: Args) -> Outcome {
    a.finish()?;
    Ok(c.current_user().await?)
}

async fn current_user_playlists(c: Client, mut a: Args) -> Outcome {
    let limit = a.or(0, "limit", 50)?;
    let offset = a.or(1, "offset", 0)?;
    a.finish()?;
    Ok(c.current_user_playlists(limit, offset).await?)
}

async fn current_user_saved_tracks(c: Client, mut a: Args) -> Outcome {
    let limit = a.or(0, "limit", 20)?;
    let offset = a.or(1, "offset", 0)?;
    let market: Option<String> = a.optional(2, "market")?;
    a.finish()?;
    Ok(c.current_user_saved_tracks(limit, offset, market.as_deref()).await?)
}

async fn current_user_followed_artists(c: Client, mut a: Args) -> Outcome {
    let limit = a.or(0, "limit", 20)?;
    let after: Option<String> = a.optional(1, "after")?;
    a.finish()?;
    Ok(c.current_user_followed_artists(limit, after.as_deref()).await?)
}
