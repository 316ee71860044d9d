//! Hierarchical, dotted-key configuration access.
//!
//! [`ConfigNode`] is a read-only view over a tree of tables, arrays and
//! scalars. Keys are dotted paths (`video.codec.name`); numerically indexed
//! blocks (`inputs.0`, `inputs.1`) may be written either as tables keyed by
//! index or as arrays, and both are addressed the same way.
//!
//! Getters never fail: a missing scalar reads as the empty string and a
//! missing list as an empty vector. Components that require a field check for
//! emptiness and report [`Error::Config`] with the exact dotted path.

use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Immutable view over a dotted hierarchical key space.
///
/// The only mutation is [`ConfigNode::overlay`], used to inject per-start
/// values into a clone before it is handed to another component.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    root: Value,
}

impl Default for ConfigNode {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConfigNode {
    /// Wrap an existing value tree. Non-container values produce an empty node.
    pub fn new(root: Value) -> Self {
        match root {
            Value::Object(_) | Value::Array(_) => Self { root },
            _ => Self::empty(),
        }
    }

    /// A node with no keys.
    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let parsed: toml::Value = toml::from_str(s).map_err(|e| Error::parse("toml", e))?;
        let root = serde_json::to_value(parsed).map_err(|e| Error::parse("toml", e))?;
        Ok(Self::new(root))
    }

    /// Parse a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(s).map_err(|e| Error::parse("json", e))?;
        Ok(Self::new(root))
    }

    /// Build a node from `(dotted key, value)` pairs.
    ///
    /// ```
    /// use livecam_core::ConfigNode;
    ///
    /// let node = ConfigNode::from_pairs([
    ///     ("inputs.0.file", "/dev/video0"),
    ///     ("video.codec.name", "h264"),
    /// ]);
    /// assert_eq!(node.get_str("inputs.0.file"), "/dev/video0");
    /// assert_eq!(node.next_keys(), vec!["inputs", "video"]);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut node = Self::empty();
        for (key, value) in pairs {
            node.overlay(key.as_ref(), value);
        }
        node
    }

    /// The underlying value tree.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Whether any value (scalar or block) lives at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).map_or(false, |v| !v.is_null())
    }

    /// Scalar at `key` rendered as a string, or `""` when missing or not a
    /// scalar.
    pub fn get_str(&self, key: &str) -> String {
        self.lookup(key).and_then(scalar_to_string).unwrap_or_default()
    }

    /// Scalar at `key`, or `default` when missing or empty.
    pub fn get_str_or(&self, key: &str, default: &str) -> String {
        let val = self.get_str(key);
        if val.is_empty() {
            default.to_string()
        } else {
            val
        }
    }

    /// List at `key`.
    ///
    /// Arrays yield their scalar elements; a plain string is split on
    /// whitespace. Missing keys yield an empty list.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(scalar_to_string)
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Descend into the block at `key`.
    ///
    /// Returns `None` when the path does not exist or does not name a block;
    /// absence is not an error.
    pub fn sub(&self, key: &str) -> Option<ConfigNode> {
        match self.lookup(key)? {
            v @ (Value::Object(_) | Value::Array(_)) => Some(Self { root: v.clone() }),
            _ => None,
        }
    }

    /// Immediate child keys that are themselves blocks.
    ///
    /// Keys are deduplicated by construction. Numeric keys sort numerically
    /// and come before non-numeric keys, which sort lexically.
    pub fn next_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match &self.root {
            Value::Object(map) => map
                .iter()
                .filter(|(_, v)| is_block(v))
                .map(|(k, _)| k.clone())
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter(|(_, v)| is_block(v))
                .map(|(i, _)| i.to_string())
                .collect(),
            _ => Vec::new(),
        };
        keys.sort_by(|a, b| index_order(a, b));
        keys
    }

    /// Set `key` to `value`, creating intermediate tables as needed.
    ///
    /// Scalars found on the way are replaced by tables. Array segments accept
    /// an existing index or the index one past the end; any other segment
    /// turns the array into an index-keyed table.
    pub fn overlay(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let segments: Vec<&str> = key.split('.').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            self.root = value;
            return;
        };

        let mut cursor = &mut self.root;
        for seg in parents {
            cursor = child_mut(cursor, seg);
        }
        set_child(cursor, last, value);
    }

    /// Deserialize this node into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.root.clone()).map_err(|e| Error::parse("settings", e))
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut cursor = &self.root;
        for seg in key.split('.').filter(|s| !s.is_empty()) {
            cursor = match cursor {
                Value::Object(map) => map.get(seg)?,
                Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(cursor)
    }
}

fn is_block(v: &Value) -> bool {
    matches!(v, Value::Object(_) | Value::Array(_))
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn index_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn array_to_map(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v))
        .collect()
}

fn array_index(cursor: &Value, seg: &str) -> Option<usize> {
    match cursor {
        Value::Array(items) => seg.parse::<usize>().ok().filter(|i| *i <= items.len()),
        _ => None,
    }
}

fn ensure_object(v: &mut Value) -> &mut Map<String, Value> {
    if !v.is_object() {
        let map = match std::mem::take(v) {
            Value::Array(items) => array_to_map(items),
            _ => Map::new(),
        };
        *v = Value::Object(map);
    }
    match v {
        Value::Object(map) => map,
        _ => unreachable!("value was converted to an object"),
    }
}

/// Step into (creating if needed) the block named `seg` under `cursor`.
fn child_mut<'a>(cursor: &'a mut Value, seg: &str) -> &'a mut Value {
    let slot = match (array_index(cursor, seg), cursor) {
        (Some(i), Value::Array(items)) => {
            if i == items.len() {
                items.push(Value::Object(Map::new()));
            }
            &mut items[i]
        }
        (_, cursor) => ensure_object(cursor)
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
    };
    if !is_block(slot) {
        *slot = Value::Object(Map::new());
    }
    slot
}

fn set_child(cursor: &mut Value, seg: &str, value: Value) {
    match (array_index(cursor, seg), cursor) {
        (Some(i), Value::Array(items)) => {
            if i == items.len() {
                items.push(value);
            } else {
                items[i] = value;
            }
        }
        (_, cursor) => {
            ensure_object(cursor).insert(seg.to_string(), value);
        }
    }
}
