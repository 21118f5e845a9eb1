//! Authenticated gateway that shares one Spotify session among many
//! callers.
//!
//! The service owns a single [`SpotifyClient`](spotify_api::SpotifyClient),
//! keeps its token fresh in the background ([`refresh`]), and exposes every
//! registered operation over `POST /proxy/:method` ([`server`]). Callers use
//! the `spotify-proxy-client` crate to reach it.
//!
//! | Module        | Role                                                    |
//! |---------------|---------------------------------------------------------|
//! | [`config`]    | `config.json` + environment layering                    |
//! | [`dispatch`]  | method registry and argument binding                    |
//! | [`operations`]| the Spotify operations registered at startup            |
//! | [`refresh`]   | token refresh loop                                      |
//! | [`server`]    | axum router and server handle                           |
//! | [`service`]   | startup, shutdown and the restart supervisor            |
//! | [`logger`]    | console + rolling file logging                          |

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logger;
pub mod operations;
pub mod refresh;
pub mod server;
pub mod service;

pub use config::ProxyConfig;
pub use dispatch::{Args, InvokeError, Registry};
pub use error::{ProxyError, Result};
pub use server::{ProxyServer, router};
pub use service::{run_service, serve, supervise};
