//! Wire contract between [`ProxyClient`](crate::ProxyClient) and the proxy
//! service.
//!
//! Request: `POST /proxy/<method>` with body
//!
//! ```json
//! { "args": ["query"], "kwargs": { "limit": 5 } }
//! ```
//!
//! | Status | Body                                                              |
//! |--------|-------------------------------------------------------------------|
//! | 200    | `{ "result": <any JSON> }`                                        |
//! | 400    | `{ "error": "Invalid method '<name>': <detail>" }`                |
//! | 400    | `{ "error": "Incorrect arguments or non-callable method '<name>': <detail>" }` |
//! | 500    | `{ "error": "<detail>" }`                                         |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path prefix of the invoke route.
pub const ROUTE_PREFIX: &str = "/proxy";

/// One forwarded call: a method name plus its arguments. The method name
/// travels in the URL path, the arguments in the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(skip)]
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl Invocation {
    pub fn new(method: impl Into<String>, args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self {
            method: method.into(),
            args,
            kwargs,
        }
    }

    /// Request path for this invocation.
    pub fn path(&self) -> String {
        format!("{ROUTE_PREFIX}/{}", self.method)
    }
}

/// Decoded reply body.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Result(Value),
    Error(String),
}

impl Reply {
    /// Success body.
    pub fn ok(result: Value) -> Value {
        serde_json::json!({ "result": result })
    }

    /// Failure body.
    pub fn err(message: impl Into<String>) -> Value {
        serde_json::json!({ "error": message.into() })
    }

    /// Interpret a reply body. Anything without a `result` key is an error.
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(mut map) => {
                if let Some(result) = map.remove("result") {
                    return Self::Result(result);
                }
                match map.remove("error") {
                    Some(Value::String(message)) => Self::Error(message),
                    Some(other) => Self::Error(other.to_string()),
                    None => Self::Error(Value::Object(map).to_string()),
                }
            }
            Value::String(text) => Self::Error(text),
            other => Self::Error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_omits_method_and_defaults_missing_fields() {
        let inv = Invocation::new("search", vec![json!("query")], Map::new());
        assert_eq!(serde_json::to_value(&inv).unwrap(), json!({"args": ["query"], "kwargs": {}}));
        assert_eq!(inv.path(), "/proxy/search");

        let parsed: Invocation = serde_json::from_value(json!({"kwargs": {"limit": 5}})).unwrap();
        assert!(parsed.args.is_empty());
        assert_eq!(parsed.kwargs["limit"], 5);
    }

    #[test]
    fn reply_decoding() {
        assert_eq!(Reply::from_body(json!({"result": null})), Reply::Result(Value::Null));
        assert_eq!(
            Reply::from_body(json!({"error": "boom"})),
            Reply::Error("boom".into())
        );
        assert_eq!(
            Reply::from_body(json!("Internal Server Error")),
            Reply::Error("Internal Server Error".into())
        );
        assert!(matches!(Reply::from_body(json!({})), Reply::Error(_)));
    }
}
