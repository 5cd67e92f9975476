//! Node in the graph store.

use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value};

/// Predicate under which the store keeps a node's type tags.
pub const TYPE_PREDICATE: &str = "dgraph.type";

/// Store-assigned node identifier, e.g. `"0x1f"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Hex rendering used by the store for numeric identifiers.
    pub fn from_u64(n: u64) -> Self {
        Self(format!("{n:#x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Uid {
    fn from(v: &str) -> Self { Self(v.to_owned()) }
}

impl From<String> for Uid {
    fn from(v: String) -> Self { Self(v) }
}

/// A node as returned by a traversal: uid, type tags, scalar properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub uid: Uid,
    pub types: Vec<String>,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(uid: impl Into<Uid>) -> Self {
        Self {
            uid: uid.into(),
            types: Vec::new(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn has_type(&self, ty: &str) -> bool {
        self.types.iter().any(|t| t == ty)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Keep only the named properties. Uid and type tags are never dropped.
    pub fn project(mut self, fields: &[String]) -> Self {
        self.properties.retain(|k, _| fields.iter().any(|f| f == k));
        self
    }

    /// Plain JSON object in the shape the store returns it:
    /// `{"uid": .., "dgraph.type": [..], <props>}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::with_capacity(self.properties.len() + 2);
        obj.insert("uid".into(), serde_json::Value::String(self.uid.0.clone()));
        obj.insert(
            TYPE_PREDICATE.into(),
            serde_json::Value::Array(
                self.types.iter().cloned().map(serde_json::Value::String).collect(),
            ),
        );
        for (k, v) in &self.properties {
            obj.insert(k.clone(), v.to_json());
        }
        serde_json::Value::Object(obj)
    }
}
