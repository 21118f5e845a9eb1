//! Name-based dispatch of invocations to typed operations.
//!
//! The wire format stays `method + args + kwargs`, but every method the
//! service accepts is registered once at startup in a [`Registry`]; an
//! operation pulls its parameters out of [`Args`] by position or keyword
//! and calls a typed client method.

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use spotify_api::SpotifyError;
use spotify_proxy_client::Invocation;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Why an invocation failed.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// No operation is registered under this name.
    #[error("Invalid method '{method}': {detail}")]
    UnknownMethod { method: String, detail: String },

    /// Wrong arity, unexpected keyword, or a value of the wrong type.
    #[error("{0}")]
    Arguments(String),

    /// The operation itself failed.
    #[error("{0}")]
    Upstream(String),
}

impl InvokeError {
    pub fn arguments(detail: impl std::fmt::Display) -> Self {
        Self::Arguments(detail.to_string())
    }

    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownMethod { .. } | Self::Arguments(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `error` text of the reply body.
    pub fn message(&self, method: &str) -> String {
        match self {
            Self::UnknownMethod { .. } | Self::Upstream(_) => self.to_string(),
            Self::Arguments(detail) => {
                format!("Incorrect arguments or non-callable method '{method}': {detail}")
            }
        }
    }
}

impl From<SpotifyError> for InvokeError {
    fn from(e: SpotifyError) -> Self {
        Self::Upstream(e.to_string())
    }
}

/// Arguments of one invocation, consumed parameter by parameter.
#[derive(Debug)]
pub struct Args {
    positional: Vec<Option<Value>>,
    keyword: Map<String, Value>,
}

impl Args {
    pub fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self {
            positional: args.into_iter().map(Some).collect(),
            keyword: kwargs,
        }
    }

    /// Parameter `name` at position `pos`; `null` counts as absent.
    pub fn optional<T: DeserializeOwned>(&mut self, pos: usize, name: &str) -> Result<Option<T>, InvokeError> {
        let by_pos = self.positional.get_mut(pos).and_then(Option::take);
        let by_name = self.keyword.remove(name);
        let value = match (by_pos, by_name) {
            (Some(_), Some(_)) => {
                return Err(InvokeError::Arguments(format!(
                    "got multiple values for argument '{name}'"
                )));
            }
            (Some(v), None) | (None, Some(v)) => v,
            (None, None) => return Ok(None),
        };
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| InvokeError::Arguments(format!("argument '{name}': {e}")))
    }

    /// Parameter that must be supplied.
    pub fn required<T: DeserializeOwned>(&mut self, pos: usize, name: &str) -> Result<T, InvokeError> {
        self.optional(pos, name)?.ok_or_else(|| {
            InvokeError::Arguments(format!("missing required argument '{name}'"))
        })
    }

    /// Parameter with a default.
    pub fn or<T: DeserializeOwned>(&mut self, pos: usize, name: &str, default: T) -> Result<T, InvokeError> {
        Ok(self.optional(pos, name)?.unwrap_or(default))
    }

    /// Reject anything no parameter consumed.
    pub fn finish(self) -> Result<(), InvokeError> {
        if self.positional.iter().any(Option::is_some) {
            let accepted = self.positional.iter().filter(|v| v.is_none()).count();
            return Err(InvokeError::Arguments(format!(
                "takes {accepted} positional arguments but {} were given",
                self.positional.len()
            )));
        }
        if let Some(name) = self.keyword.keys().next() {
            return Err(InvokeError::Arguments(format!(
                "got an unexpected keyword argument '{name}'"
            )));
        }
        Ok(())
    }
}

/// Boxed future of one operation.
pub type OpFuture = Pin<Box<dyn Future<Output = Result<Value, InvokeError>> + Send>>;

type Operation<C> = Box<dyn Fn(Arc<C>, Args) -> OpFuture + Send + Sync>;

/// Table from method name to operation over a shared client `C`.
pub struct Registry<C> {
    ops: HashMap<&'static str, Operation<C>>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }
}

impl<C: Send + Sync + 'static> Registry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `op` under `name`, replacing any previous entry.
    pub fn register<F, Fut>(&mut self, name: &'static str, op: F) -> &mut Self
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, InvokeError>> + Send + 'static,
    {
        self.ops
            .insert(name, Box::new(move |client, args| Box::pin(op(client, args))));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.ops.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run `invocation` against `client`.
    pub async fn invoke(&self, client: Arc<C>, invocation: Invocation) -> Result<Value, InvokeError> {
        let Some(op) = self.ops.get(invocation.method.as_str()) else {
            return Err(InvokeError::UnknownMethod {
                method: invocation.method,
                detail: "no such operation".to_owned(),
            });
        };
        op(client, Args::new(invocation.args, invocation.kwargs)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(positional: Value, keyword: Value) -> Args {
        let Value::Array(positional) = positional else { panic!("expected array") };
        let Value::Object(keyword) = keyword else { panic!("expected object") };
        Args::new(positional, keyword)
    }

    #[test]
    fn binds_positional_and_keyword() {
        let mut a = args(json!(["query"]), json!({ "limit": 5 }));
        let q: String = a.required(0, "q").unwrap();
        let limit: u32 = a.or(1, "limit", 10).unwrap();
        let offset: u32 = a.or(2, "offset", 0).unwrap();
        assert_eq!((q.as_str(), limit, offset), ("query", 5, 0));
        a.finish().unwrap();
    }

    #[test]
    fn null_means_absent() {
        let mut a = args(json!([null]), json!({}));
        let market: Option<String> = a.optional(0, "market").unwrap();
        assert!(market.is_none());
        a.finish().unwrap();
    }

    #[test]
    fn rejects_missing_duplicate_and_mistyped() {
        let mut a = args(json!([]), json!({}));
        let err = a.required::<String>(0, "q").unwrap_err();
        assert_eq!(err.to_string(), "missing required argument 'q'");

        let mut a = args(json!(["x"]), json!({ "q": "y" }));
        assert!(a.required::<String>(0, "q").is_err());

        let mut a = args(json!([]), json!({ "limit": "ten" }));
        let err = a.or::<u32>(0, "limit", 10).unwrap_err();
        assert!(err.to_string().starts_with("argument 'limit'"));
    }

    #[test]
    fn rejects_leftover_arguments() {
        let mut a = args(json!(["q", 1, 2]), json!({}));
        let _: String = a.required(0, "q").unwrap();
        let err = a.finish().unwrap_err();
        assert_eq!(err.to_string(), "takes 1 positional arguments but 3 were given");

        let mut a = args(json!([]), json!({ "q": "x", "bogus": 1 }));
        let _: String = a.required(0, "q").unwrap();
        let err = a.finish().unwrap_err();
        assert_eq!(err.to_string(), "got an unexpected keyword argument 'bogus'");
    }

    #[test]
    fn error_messages_and_statuses() {
        let unknown = InvokeError::UnknownMethod {
            method: "nope".into(),
            detail: "no such operation".into(),
        };
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(unknown.message("nope"), "Invalid method 'nope': no such operation");

        let bad = InvokeError::arguments("missing required argument 'q'");
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            bad.message("search"),
            "Incorrect arguments or non-callable method 'search': missing required argument 'q'"
        );

        let upstream = InvokeError::from(SpotifyError::NotAuthenticated);
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.message("search"), "not authenticated");
    }

    #[tokio::test]
    async fn registry_dispatches_by_name() {
        let mut registry: Registry<String> = Registry::new();
        registry.register("echo", |prefix: Arc<String>, mut a: Args| async move {
            let word: String = a.required(0, "word")?;
            a.finish()?;
            Ok::<_, InvokeError>(json!(format!("{prefix}{word}")))
        });
        assert_eq!(registry.names(), ["echo"]);

        let client = Arc::new("> ".to_owned());
        let inv = Invocation::new("echo", vec![json!("hi")], Map::new());
        assert_eq!(registry.invoke(client.clone(), inv).await.unwrap(), json!("> hi"));

        let inv = Invocation::new("missing", vec![], Map::new());
        let err = registry.invoke(client, inv).await.unwrap_err();
        assert!(matches!(err, InvokeError::UnknownMethod { .. }));
    }
}
