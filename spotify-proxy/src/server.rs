//! HTTP front of the proxy.
//!
//! # Endpoints
//!
//! ## Invoke: `POST /proxy/:method`
//!
//! Runs `method` against the shared Spotify client.
//!
//! Request body (both keys optional):
//! ```json
//! { "args": ["radiohead"], "kwargs": { "type": "artist", "limit": 5 } }
//! ```
//!
//! | Status | Body                                                              |
//! |--------|-------------------------------------------------------------------|
//! | 200    | `{"result": <operation output>}`                                  |
//! | 400    | `{"error": "Invalid method '<m>': ..."}`                          |
//! | 400    | `{"error": "Incorrect arguments or non-callable method '<m>': ..."}` |
//! | 500    | `{"error": "<error text of the failed call>"}`                    |
//!
//! ## Health: `GET /healthz`
//!
//! Always `{"status": "ok"}`.

use crate::dispatch::{InvokeError, Registry};
use crate::error::{ProxyError, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use spotify_proxy_client::{Invocation, Reply};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shared by every request handler.
pub struct AppState<C> {
    pub client: Arc<C>,
    pub registry: Arc<Registry<C>>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            registry: Arc::clone(&self.registry),
        }
    }
}

/// Routes of the service, serving `registry` against `client`.
pub fn router<C: Send + Sync + 'static>(client: Arc<C>, registry: Registry<C>) -> Router {
    let state = AppState {
        client,
        registry: Arc::new(registry),
    };
    Router::new()
        .route("/proxy/:method", post(invoke_handler::<C>))
        .route("/healthz", get(health_check_handler))
        .with_state(state)
}

async fn invoke_handler<C: Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Path(method): Path<String>,
    body: std::result::Result<Json<Invocation>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let outcome = match body {
        Ok(Json(mut invocation)) => {
            invocation.method.clone_from(&method);
            state.registry.invoke(Arc::clone(&state.client), invocation).await
        }
        Err(rejection) => Err(InvokeError::arguments(rejection.body_text())),
    };

    match outcome {
        Ok(result) => {
            debug!(%method, "invocation succeeded");
            (StatusCode::OK, Json(Reply::ok(result)))
        }
        Err(e) => {
            let status = e.status();
            let message = e.message(&method);
            warn!(%method, status = status.as_u16(), error = %message, "invocation failed");
            (status, Json(Reply::err(message)))
        }
    }
}

async fn health_check_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// A running server task.
pub struct ProxyServer {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl ProxyServer {
    /// Bind `addr` and serve `app` until [`stop`](Self::stop) is called or
    /// `cancel` fires.
    pub async fn start(addr: SocketAddr, app: Router, cancel: CancellationToken) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ProxyError::Server(format!("failed to bind {addr}: {e}")))?;
        let local_addr = listener.local_addr()?;
        info!("proxy listening on http://{local_addr}");

        let shutdown = cancel.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        });

        Ok(Self {
            local_addr,
            cancel,
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolves when the server task ends on its own.
    pub async fn stopped(&mut self) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let res = task.await;
        self.task = None;
        flatten(res)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(mut self) -> Result<()> {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => {
                let res = flatten(task.await);
                info!("proxy stopped");
                res
            }
            None => Ok(()),
        }
    }
}

fn flatten(res: std::result::Result<std::io::Result<()>, JoinError>) -> Result<()> {
    match res {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ProxyError::Server(e.to_string())),
        Err(e) => Err(ProxyError::Server(format!("server task failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Args;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use spotify_proxy_client::ProxyClient;
    use tower::ServiceExt;

    struct FakeSpotify {
        label: &'static str,
    }

    fn app() -> Router {
        let mut registry: Registry<FakeSpotify> = Registry::new();
        registry
            .register("search", |_c: Arc<FakeSpotify>, mut a: Args| async move {
                let q: String = a.required(0, "q")?;
                let limit: u32 = a.or(1, "limit", 10)?;
                let offset: u32 = a.or(2, "offset", 0)?;
                let kind: String = a.or(3, "type", "track".to_owned())?;
                a.finish()?;
                Ok::<_, InvokeError>(json!({
                    "items": [{ "id": "X", "q": q, "limit": limit, "offset": offset, "type": kind }]
                }))
            })
            .register("current_user", |c: Arc<FakeSpotify>, a: Args| async move {
                a.finish()?;
                Ok::<_, InvokeError>(json!({ "id": c.label }))
            })
            .register("album", |_c: Arc<FakeSpotify>, _a: Args| async move {
                Err::<Value, _>(InvokeError::Upstream("API error (status 404): Non existing id".into()))
            });
        router(Arc::new(FakeSpotify { label: "alice" }), registry)
    }

    async fn post_json(path: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::post(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn invoke_returns_result() {
        let (status, body) =
            post_json("/proxy/search", r#"{"args":["query"],"kwargs":{"limit":5}}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["items"][0]["id"], "X");
        assert_eq!(body["result"]["items"][0]["q"], "query");
        assert_eq!(body["result"]["items"][0]["limit"], 5);
    }

    #[tokio::test]
    async fn missing_args_default_to_empty() {
        let (status, body) = post_json("/proxy/current_user", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "result": { "id": "alice" } }));
    }

    #[tokio::test]
    async fn unknown_method_is_bad_request() {
        let (status, body) = post_json("/proxy/launch_rockets", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid method 'launch_rockets': no such operation");
    }

    #[tokio::test]
    async fn bad_arguments_are_bad_request() {
        let (status, body) = post_json("/proxy/search", r#"{"args":["q",5,0,"track","extra"]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Incorrect arguments or non-callable method 'search': takes 4 positional arguments but 5 were given"
        );

        let (status, body) = post_json("/proxy/search", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Incorrect arguments or non-callable method 'search'")
        );
    }

    #[tokio::test]
    async fn upstream_failure_is_server_error() {
        let (status, body) = post_json("/proxy/album", r#"{"args":["nope"]}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "API error (status 404): Non existing id");
    }

    #[tokio::test]
    async fn healthz() {
        let req = Request::get("/healthz").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn stub_round_trip_over_tcp() {
        let cancel = CancellationToken::new();
        let server = ProxyServer::start("127.0.0.1:0".parse().unwrap(), app(), cancel)
            .await
            .unwrap();
        let base = format!("http://{}", server.local_addr());

        let (found, unknown) = tokio::task::spawn_blocking(move || {
            let client = ProxyClient::connect(base).unwrap();
            let found = client.search("query", "artist", 5, 10);
            let unknown = client.call("launch_rockets", vec![], serde_json::Map::new());
            (found, unknown)
        })
        .await
        .unwrap();

        let found = found.unwrap();
        assert_eq!(found["items"][0]["type"], "artist");
        assert_eq!(found["items"][0]["offset"], 10);
        assert!(matches!(
            unknown,
            Err(spotify_proxy_client::ClientError::Remote { status: 400, .. })
        ));
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_ends_the_task() {
        let cancel = CancellationToken::new();
        let mut server = ProxyServer::start("127.0.0.1:0".parse().unwrap(), app(), cancel.clone())
            .await
            .unwrap();
        cancel.cancel();
        server.stopped().await.unwrap();
        server.stop().await.unwrap();
    }
}
