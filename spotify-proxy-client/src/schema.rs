//! Field-selection schemas.
//!
//! A schema is a tree whose leaves say "keep this field" (`true`) or "drop
//! it" (`false`) and whose inner nodes say "keep this field and descend".
//! The JSON form is accepted directly:
//!
//! ```json
//! { "id": true, "name": true, "album": { "name": true, "release_date": true } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which fields to keep from a response node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSchema", into = "RawSchema")]
pub enum FieldSchema {
    /// Keep the field as-is.
    Include,
    /// Never emit the field.
    Exclude,
    /// Keep the field and apply the nested schema to its value.
    Node(BTreeMap<String, FieldSchema>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSchema {
    Flag(bool),
    Node(BTreeMap<String, FieldSchema>),
}

impl From<RawSchema> for FieldSchema {
    fn from(raw: RawSchema) -> Self {
        match raw {
            RawSchema::Flag(true) => Self::Include,
            RawSchema::Flag(false) => Self::Exclude,
            RawSchema::Node(children) => Self::Node(children),
        }
    }
}

impl From<FieldSchema> for RawSchema {
    fn from(schema: FieldSchema) -> Self {
        match schema {
            FieldSchema::Include => Self::Flag(true),
            FieldSchema::Exclude => Self::Flag(false),
            FieldSchema::Node(children) => Self::Node(children),
        }
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::node()
    }
}

impl FieldSchema {
    /// An empty node. Extraction through it yields `{}`.
    pub fn node() -> Self {
        Self::Node(BTreeMap::new())
    }

    /// A node keeping exactly `names` as leaves.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(Self::node(), |schema, name| schema.field(name))
    }

    /// Keep `name` as a leaf.
    #[must_use]
    pub fn field(self, name: impl Into<String>) -> Self {
        self.with(name.into(), Self::Include)
    }

    /// Mark `name` as excluded.
    #[must_use]
    pub fn exclude(self, name: impl Into<String>) -> Self {
        self.with(name.into(), Self::Exclude)
    }

    /// Keep `name` and descend into it with `child`.
    #[must_use]
    pub fn child(self, name: impl Into<String>, child: FieldSchema) -> Self {
        self.with(name.into(), child)
    }

    fn with(self, name: String, value: FieldSchema) -> Self {
        let mut children = match self {
            Self::Node(children) => children,
            Self::Include | Self::Exclude => BTreeMap::new(),
        };
        children.insert(name, value);
        Self::Node(children)
    }

    /// Children of a node; leaves have none.
    pub fn children(&self) -> Option<&BTreeMap<String, FieldSchema>> {
        match self {
            Self::Node(children) => Some(children),
            Self::Include | Self::Exclude => None,
        }
    }

    /// True when no child is itself a node.
    pub fn is_flat(&self) -> bool {
        self.children()
            .is_none_or(|c| c.values().all(|s| !matches!(s, Self::Node(_))))
    }
}
