//! Dynamic record value threaded through the pipeline stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A `BTreeMap` backs `Map` (not `HashMap`) so canonical-JSON hashing in the
/// deduplicator gets deterministic key ordering without a separate sort step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Best-effort string rendering used by the deduplicator's field-key and
    /// similarity comparisons.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::List(items) => items.iter().map(Value::to_display_string).collect::<Vec<_>>().join(","),
            Value::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Canonical JSON: `BTreeMap` already sorts keys, so `serde_json`'s
    /// serialization of this type is deterministic by construction.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
