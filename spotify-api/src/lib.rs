//! Spotify Web API client library.
//!
//! Provides token management (credential cache, authorization-code login,
//! refresh) and an async client exposing the catalog, playlist, library,
//! and search endpoints as methods returning raw JSON.
//!
//! # Authentication
//!
//! A one-time interactive login stores a token pair in the credential
//! cache (`~/.config/spotify-proxy/.cache-<user>`). Afterwards
//! [`OAuth::authenticate`] rebuilds a valid token from the cache without
//! user interaction.
//!
//! ```no_run
//! # async fn demo() -> spotify_api::Result<()> {
//! use spotify_api::{CacheHandler, OAuth, SpotifyClient};
//!
//! let oauth = OAuth::new("id", "secret", "http://127.0.0.1:8080/callback", vec![])?;
//! let cache = CacheHandler::for_user("alice")?;
//! let client = SpotifyClient::with_token(oauth.authenticate(&cache).await?)?;
//! let _me = client.current_user().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # API endpoint mapping
//!
//! | Method                                            | Endpoint                         |
//! |---------------------------------------------------|----------------------------------|
//! | [`SpotifyClient::search`]                         | `GET /search`                    |
//! | [`SpotifyClient::next`] / [`SpotifyClient::previous`] | page `next`/`previous` URL   |
//! | [`SpotifyClient::track`] / [`SpotifyClient::tracks`]  | `GET /tracks`                |
//! | [`SpotifyClient::artist`] / [`SpotifyClient::artists`]| `GET /artists`               |
//! | [`SpotifyClient::artist_albums`]                  | `GET /artists/{id}/albums`       |
//! | [`SpotifyClient::artist_top_tracks`]              | `GET /artists/{id}/top-tracks`   |
//! | [`SpotifyClient::album`] / [`SpotifyClient::album_tracks`] | `GET /albums/{id}`      |
//! | [`SpotifyClient::playlist`] / [`SpotifyClient::playlist_items`] | `GET /playlists/{id}` |
//! | [`SpotifyClient::user_playlist_create`]           | `POST /users/{user}/playlists`   |
//! | [`SpotifyClient::playlist_add_items`]             | `POST /playlists/{id}/tracks`    |
//! | [`SpotifyClient::playlist_replace_items`]         | `PUT /playlists/{id}/tracks`     |
//! | [`SpotifyClient::playlist_remove_all_occurrences_of_items`] | `DELETE /playlists/{id}/tracks` |
//! | [`SpotifyClient::current_user`]                   | `GET /me`                        |
//! | [`SpotifyClient::current_user_playlists`]         | `GET /me/playlists`              |
//! | [`SpotifyClient::current_user_saved_tracks`]      | `GET /me/tracks`                 |
//! | [`SpotifyClient::current_user_followed_artists`]  | `GET /me/following`              |

pub mod auth;
mod catalog;
pub mod client;
pub mod error;
pub mod oauth;
mod playlist;
mod search;
pub mod types;
mod user;

pub use auth::{CacheHandler, TokenInfo};
pub use client::SpotifyClient;
pub use error::{Result, SpotifyError};
pub use oauth::OAuth;
