//! Caller-side access to `spotify-proxy`.
//!
//! Two halves:
//!
//! - [`ProxyClient`] forwards Spotify operations to the proxy service with
//!   bounded retries ([`RetryPolicy`]).
//! - [`extract`], [`locate`] and [`gather`] shape raw, paginated responses
//!   into flat lists of records according to a [`FieldSchema`].
//!
//! ```no_run
//! use spotify_proxy_client::{FieldSchema, ProxyClient, gather};
//!
//! let client = ProxyClient::connect("http://127.0.0.1:5151")?;
//! let first = client.current_user_saved_tracks(50)?;
//! let schema = FieldSchema::node()
//!     .field("added_at")
//!     .child("track", FieldSchema::fields(["id", "name", "uri"]));
//! let saved = gather(first, &schema, &client)?;
//! # Ok::<(), spotify_proxy_client::ClientError>(())
//! ```

pub mod error;
pub mod extract;
pub mod gather;
pub mod retry;
pub mod schema;
pub mod stub;
pub mod wire;

pub use error::{ClientError, Result};
pub use extract::{extract, locate};
pub use gather::{NextPage, gather};
pub use retry::{RetryBudget, RetryPolicy};
pub use schema::FieldSchema;
pub use stub::{HttpTransport, ProxyClient, RawReply, Transport};
pub use wire::{Invocation, Reply};
