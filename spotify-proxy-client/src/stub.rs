//! Client stub that makes the proxy's Spotify operations callable locally.
//!
//! [`ProxyClient::call`] turns a method name plus arguments into one
//! `POST /proxy/<method>` and applies the retry policy:
//!
//! 1. Before every attempt, a spent time budget fails the call with
//!    [`ClientError::Timeout`] without sending anything.
//! 2. Transport failures, 5xx replies and `{"error": ...}` bodies are
//!    retried; 4xx replies (unknown method, bad arguments) are returned at
//!    once.
//! 3. Between attempts the stub sleeps `backoff_factor * 2^attempt`
//!    seconds, re-checking the budget first.
//! 4. Once all attempts fail, the last error is returned unchanged.

use crate::error::{ClientError, Result};
use crate::gather::NextPage;
use crate::retry::RetryPolicy;
use crate::wire::{Invocation, Reply};
use reqwest::blocking::Client;
use serde_json::{Map, Value, json};
use std::time::Duration;

/// Default service address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5151";

/// Status and JSON body of one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReply {
    pub status: u16,
    pub body: Value,
}

/// Sends one invocation and returns the raw reply.
pub trait Transport {
    fn send(&self, invocation: &Invocation) -> Result<RawReply>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    /// Transport for the service at `base_url` (e.g. `http://127.0.0.1:5151`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, invocation: &Invocation) -> Result<RawReply> {
        let url = format!("{}{}", self.base_url, invocation.path());
        let resp = self.http.post(&url).json(invocation).send()?;
        let status = resp.status().as_u16();
        let text = resp.text()?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(RawReply { status, body })
    }
}

/// Local stand-in for the remote Spotify client.
pub struct ProxyClient<T = HttpTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl ProxyClient<HttpTransport> {
    /// Client for the service at `base_url` with the default retry policy.
    pub fn connect(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(base_url)?))
    }
}

impl<T: Transport> ProxyClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `method` remotely and return its result.
    pub fn call(&self, method: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value> {
        let invocation = Invocation::new(method, args, kwargs);
        let budget = self.policy.begin();
        let attempts = budget.attempts();
        let mut sent = 0;
        let mut last_err = None;

        for attempt in 0..attempts {
            if budget.exhausted() {
                return Err(ClientError::Timeout {
                    elapsed: budget.elapsed(),
                    attempts: sent,
                });
            }

            sent += 1;
            let err = match self.transport.send(&invocation) {
                Ok(reply) => match interpret(reply) {
                    Ok(result) => return Ok(result),
                    Err(e) => e,
                },
                Err(e) => e,
            };
            if !err.is_retryable() {
                return Err(err);
            }
            tracing::warn!(
                method,
                attempt = attempt + 1,
                of = attempts,
                error = %err,
                "proxy call failed"
            );
            last_err = Some(err);

            if attempt + 1 < attempts {
                if budget.exhausted() {
                    return Err(ClientError::Timeout {
                        elapsed: budget.elapsed(),
                        attempts: sent,
                    });
                }
                std::thread::sleep(budget.backoff(attempt));
            }
        }

        Err(last_err.unwrap_or(ClientError::Timeout {
            elapsed: budget.elapsed(),
            attempts: sent,
        }))
    }

    /// Invoke `method` with keyword arguments only.
    pub fn call_kw(&self, method: &str, kwargs: Value) -> Result<Value> {
        let kwargs = match kwargs {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ClientError::InvalidArguments(format!(
                    "keyword arguments must be an object, got {other}"
                )));
            }
        };
        self.call(method, Vec::new(), kwargs)
    }

    pub fn search(&self, q: &str, search_type: &str, limit: u32, offset: u32) -> Result<Value> {
        self.call_kw(
            "search",
            json!({ "q": q, "type": search_type, "limit": limit, "offset": offset }),
        )
    }

    /// Page after `page`; `null` at the end.
    pub fn next(&self, page: &Value) -> Result<Value> {
        self.call("next", vec![page.clone()], Map::new())
    }

    pub fn tracks(&self, track_ids: &[String]) -> Result<Value> {
        self.call_kw("tracks", json!({ "tracks": track_ids }))
    }

    pub fn artists(&self, artist_ids: &[String]) -> Result<Value> {
        self.call_kw("artists", json!({ "artists": artist_ids }))
    }

    pub fn artist_albums(&self, artist_id: &str, include_groups: &str, limit: u32) -> Result<Value> {
        self.call_kw(
            "artist_albums",
            json!({ "artist_id": artist_id, "include_groups": include_groups, "limit": limit }),
        )
    }

    pub fn album_tracks(&self, album_id: &str, limit: u32) -> Result<Value> {
        self.call_kw("album_tracks", json!({ "album_id": album_id, "limit": limit }))
    }

    pub fn playlist_items(&self, playlist_id: &str, limit: u32) -> Result<Value> {
        self.call_kw(
            "playlist_items",
            json!({ "playlist_id": playlist_id, "limit": limit }),
        )
    }

    pub fn current_user(&self) -> Result<Value> {
        self.call("current_user", Vec::new(), Map::new())
    }

    pub fn current_user_playlists(&self, limit: u32) -> Result<Value> {
        self.call_kw("current_user_playlists", json!({ "limit": limit }))
    }

    pub fn current_user_saved_tracks(&self, limit: u32) -> Result<Value> {
        self.call_kw("current_user_saved_tracks", json!({ "limit": limit }))
    }

    pub fn current_user_followed_artists(&self, limit: u32) -> Result<Value> {
        self.call_kw("current_user_followed_artists", json!({ "limit": limit }))
    }

    pub fn user_playlist_create(
        &self,
        user: &str,
        name: &str,
        public: bool,
        description: &str,
    ) -> Result<Value> {
        self.call_kw(
            "user_playlist_create",
            json!({ "user": user, "name": name, "public": public, "description": description }),
        )
    }

    pub fn playlist_add_items(&self, playlist_id: &str, items: &[String]) -> Result<Value> {
        self.call_kw(
            "playlist_add_items",
            json!({ "playlist_id": playlist_id, "items": items }),
        )
    }

    pub fn playlist_replace_items(&self, playlist_id: &str, items: &[String]) -> Result<Value> {
        self.call_kw(
            "playlist_replace_items",
            json!({ "playlist_id": playlist_id, "items": items }),
        )
    }
}

impl<T: Transport> NextPage for ProxyClient<T> {
    fn next_page(&self, page: &Value) -> Result<Option<Value>> {
        let next = self.next(page)?;
        Ok(Some(next).filter(|v| !v.is_null()))
    }
}

fn interpret(reply: RawReply) -> Result<Value> {
    let status = reply.status;
    match Reply::from_body(reply.body) {
        Reply::Result(result) if status == 200 => Ok(result),
        Reply::Result(_) => Err(ClientError::Remote {
            status,
            message: format!("unexpected status {status}"),
        }),
        Reply::Error(message) => Err(ClientError::Remote { status, message }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Plays back canned outcomes, then keeps failing.
    struct Scripted {
        outcomes: RefCell<VecDeque<Result<RawReply>>>,
        calls: Cell<u32>,
        last: RefCell<Option<Invocation>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<RawReply>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                calls: Cell::new(0),
                last: RefCell::new(None),
            }
        }
    }

    impl Transport for &Scripted {
        fn send(&self, invocation: &Invocation) -> Result<RawReply> {
            self.calls.set(self.calls.get() + 1);
            *self.last.borrow_mut() = Some(invocation.clone());
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Transport("connection refused".into())))
        }
    }

    fn ok(result: Value) -> Result<RawReply> {
        Ok(RawReply { status: 200, body: json!({ "result": result }) })
    }

    fn refused() -> Result<RawReply> {
        Err(ClientError::Transport("connection refused".into()))
    }

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_factor: 0.0,
            overall_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn succeeds_after_two_failures() {
        let transport = Scripted::new(vec![
            refused(),
            Ok(RawReply { status: 500, body: json!({ "error": "upstream" }) }),
            ok(json!({ "id": "X" })),
        ]);
        let client = ProxyClient::with_transport(&transport).with_policy(fast(3));

        let result = client.call("current_user", vec![], Map::new()).unwrap();
        assert_eq!(result, json!({ "id": "X" }));
        assert_eq!(transport.calls.get(), 3);
    }

    #[test]
    fn gives_up_after_max_retries_with_last_error() {
        let transport = Scripted::new(vec![
            refused(),
            refused(),
            Ok(RawReply { status: 502, body: json!("Bad Gateway") }),
        ]);
        let client = ProxyClient::with_transport(&transport).with_policy(fast(3));

        let err = client.call("current_user", vec![], Map::new()).unwrap_err();
        assert_eq!(transport.calls.get(), 3);
        assert!(matches!(err, ClientError::Remote { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[test]
    fn error_payload_with_200_is_retried() {
        let transport = Scripted::new(vec![
            Ok(RawReply { status: 200, body: json!({ "error": "flaky" }) }),
            ok(json!(1)),
        ]);
        let client = ProxyClient::with_transport(&transport).with_policy(fast(3));
        assert_eq!(client.call("x", vec![], Map::new()).unwrap(), json!(1));
        assert_eq!(transport.calls.get(), 2);
    }

    #[test]
    fn invocation_errors_are_not_retried() {
        let transport = Scripted::new(vec![Ok(RawReply {
            status: 400,
            body: json!({ "error": "Invalid method 'nope': no such operation" }),
        })]);
        let client = ProxyClient::with_transport(&transport).with_policy(fast(3));

        let err = client.call("nope", vec![], Map::new()).unwrap_err();
        assert_eq!(transport.calls.get(), 1);
        assert!(matches!(err, ClientError::Remote { status: 400, .. }));
    }

    #[test]
    fn zero_timeout_sends_nothing() {
        let transport = Scripted::new(vec![ok(json!(1))]);
        let client = ProxyClient::with_transport(&transport).with_policy(RetryPolicy {
            overall_timeout: Duration::ZERO,
            ..fast(3)
        });

        let err = client.call("current_user", vec![], Map::new()).unwrap_err();
        assert!(matches!(err, ClientError::Timeout { attempts: 0, .. }));
        assert_eq!(transport.calls.get(), 0);
    }

    #[test]
    fn convenience_methods_send_keyword_arguments() {
        let transport = Scripted::new(vec![ok(json!({ "tracks": {} }))]);
        let client = ProxyClient::with_transport(&transport).with_policy(fast(1));

        client.search("query", "track", 5, 0).unwrap();
        let sent = transport.last.borrow().clone().unwrap();
        assert_eq!(sent.method, "search");
        assert!(sent.args.is_empty());
        assert_eq!(sent.kwargs["q"], "query");
        assert_eq!(sent.kwargs["limit"], 5);
    }

    #[test]
    fn non_object_keyword_arguments_fail_locally() {
        let transport = Scripted::new(vec![ok(json!(1))]);
        let client = ProxyClient::with_transport(&transport).with_policy(fast(3));

        let err = client.call_kw("search", json!(["q"])).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArguments(_)));
        assert!(!err.is_retryable());
        assert_eq!(transport.calls.get(), 0);

        assert_eq!(client.call_kw("current_user", Value::Null).unwrap(), json!(1));
    }

    #[test]
    fn next_page_maps_null_to_end() {
        let transport = Scripted::new(vec![ok(Value::Null), ok(json!({ "items": [] }))]);
        let client = ProxyClient::with_transport(&transport).with_policy(fast(1));

        let page = json!({ "items": [], "next": "http://x" });
        assert_eq!(client.next_page(&page).unwrap(), None);
        assert_eq!(client.next_page(&page).unwrap(), Some(json!({ "items": [] })));
        assert_eq!(transport.last.borrow().as_ref().unwrap().args, vec![page]);
    }
}
