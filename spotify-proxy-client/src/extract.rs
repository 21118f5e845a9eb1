//! Schema-driven field extraction and collection lookup.
//!
//! Responses nest their records in a handful of known shapes:
//!
//! | Path              | Returned by                                      |
//! |-------------------|--------------------------------------------------|
//! | `items`           | any paged endpoint (`/me/tracks`, `/albums/{id}/tracks`, ...) |
//! | `item`            | single-item wrappers (currently playing)         |
//! | `tracks.items`    | search, album objects, playlist objects          |
//! | `artists.items`   | search, followed artists                         |
//! | `albums.items`    | search                                           |
//! | `playlists.items` | search                                           |
//! | `shows.items`, `episodes.items`, `audiobooks.items` | search         |
//!
//! The list is closed and ranked: the first path that resolves wins.
//! Neither function here fails; missing data becomes `null` and
//! unrecognized shapes pass through untouched.

use crate::schema::FieldSchema;
use serde_json::{Map, Value};

/// Ranked candidate paths to the record collection of a response.
pub const COLLECTION_PATHS: &[&[&str]] = &[
    &["items"],
    &["item"],
    &["tracks", "items"],
    &["artists", "items"],
    &["albums", "items"],
    &["playlists", "items"],
    &["shows", "items"],
    &["episodes", "items"],
    &["audiobooks", "items"],
];

/// Find the records of one response page.
///
/// Returns the resolved value and the path used to reach it, or the
/// response itself with an empty path when no candidate path resolves.
pub fn locate(response: &Value) -> (&Value, &'static [&'static str]) {
    for path in COLLECTION_PATHS {
        if let Some(found) = resolve(response, path) {
            return (found, path);
        }
    }
    (response, &[])
}

/// Follow `path` through nested objects. Every step must land on an
/// object holding the next key; a `null` at the end does not count.
pub fn resolve<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |node, key| node.as_object()?.get(*key))
        .filter(|found| !found.is_null())
}

/// Keep only the fields `schema` asks for.
///
/// - Arrays map element-wise; length and order are preserved and
///   elements that are not objects come back unchanged.
/// - Objects produce one key per non-excluded schema entry, `null` when
///   the field is missing. A field whose value wraps a collection is
///   unwrapped before its sub-schema applies.
/// - Anything else is returned as-is.
pub fn extract(data: &Value, schema: &FieldSchema) -> Value {
    match data {
        Value::Array(items) => Value::Array(items.iter().map(|item| extract(item, schema)).collect()),
        Value::Object(map) => match schema.children() {
            Some(children) => Value::Object(extract_fields(map, children)),
            None => data.clone(),
        },
        other => other.clone(),
    }
}

fn extract_fields(
    map: &Map<String, Value>,
    children: &std::collections::BTreeMap<String, FieldSchema>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, sub) in children {
        if matches!(sub, FieldSchema::Exclude) {
            continue;
        }
        let value = map.get(key).map_or(&Value::Null, unwrap_collection);
        let kept = match sub {
            FieldSchema::Node(_) if value.is_object() || value.is_array() => extract(value, sub),
            _ => value.clone(),
        };
        out.insert(key.clone(), kept);
    }
    out
}

/// Descend through wrappers until the value no longer wraps a collection,
/// so extracting an already extracted value changes nothing.
fn unwrap_collection(mut value: &Value) -> &Value {
    while value.is_object() {
        let (found, path) = locate(value);
        if path.is_empty() {
            break;
        }
        value = found;
    }
    value
}
