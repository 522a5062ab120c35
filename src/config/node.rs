//! Dynamically typed configuration tree.
//!
//! Every config format (YAML, TOML, JSON, override strings, environment
//! variables) is converted into a [`Node`] before merging, so the merge and
//! resolution passes only ever deal with one representation.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Keyed children of a [`Node::Mapping`].
pub type Mapping = BTreeMap<String, Node>;

static NULL: Node = Node::Null;

/// A configuration value without a fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    /// An unsigned integer above `i64::MAX`. Shares [`Kind::Integer`].
    UInteger(u64),
    Float(f64),
    String(String),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

/// The variant tag of a [`Node`].
///
/// Two nodes are only merged into each other when their kinds are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Sequence,
    Mapping,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Sequence => "sequence",
            Kind::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

impl Node {
    /// Creates an empty mapping node.
    pub fn mapping() -> Self {
        Node::Mapping(Mapping::new())
    }

    pub fn kind(&self) -> Kind {
        match self {
            Node::Null => Kind::Null,
            Node::Bool(_) => Kind::Bool,
            Node::Integer(_) | Node::UInteger(_) => Kind::Integer,
            Node::Float(_) => Kind::Float,
            Node::String(_) => Kind::String,
            Node::Sequence(_) => Kind::Sequence,
            Node::Mapping(_) => Kind::Mapping,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Node::Integer(i) => u64::try_from(*i).ok(),
            Node::UInteger(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Float(f) => Some(*f),
            Node::Integer(i) => Some(*i as f64),
            Node::UInteger(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key on a mapping node. Returns `None` for other kinds.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Parses a YAML document. An empty document yields [`Node::Null`].
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str::<serde_yaml::Value>(s).map(Node::from)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<toml::Table>(s).map(|table| Node::from(toml::Value::Table(table)))
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<serde_json::Value>(s).map(Node::from)
    }

    /// Binds the tree to a strongly typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_yaml::Error> {
        let value = serde_yaml::to_value(self)?;
        serde_yaml::from_value(value)
    }
}

impl Index<&str> for Node {
    type Output = Node;

    fn index(&self, key: &str) -> &Node {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Node {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        self.as_sequence()
            .and_then(|seq| seq.get(index))
            .unwrap_or(&NULL)
    }
}

impl From<serde_yaml::Value> for Node {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Node::UInteger(u)
                } else {
                    n.as_f64().map(Node::Float).unwrap_or(Node::Null)
                }
            }
            Value::String(s) => Node::String(s),
            Value::Sequence(seq) => Node::Sequence(seq.into_iter().map(Node::from).collect()),
            Value::Mapping(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (yaml_key_to_string(k), Node::from(v)))
                    .collect(),
            ),
            Value::Tagged(tagged) => Node::from(tagged.value),
        }
    }
}

/// YAML allows non-string keys; they are flattened to their textual form.
fn yaml_key_to_string(key: serde_yaml::Value) -> String {
    use serde_yaml::Value;

    match key {
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<toml::Value> for Node {
    fn from(value: toml::Value) -> Self {
        use toml::Value;

        match value {
            Value::String(s) => Node::String(s),
            Value::Integer(i) => Node::Integer(i),
            Value::Float(f) => Node::Float(f),
            Value::Boolean(b) => Node::Bool(b),
            Value::Datetime(dt) => Node::String(dt.to_string()),
            Value::Array(arr) => Node::Sequence(arr.into_iter().map(Node::from).collect()),
            Value::Table(table) => Node::Mapping(
                table.into_iter().map(|(k, v)| (k, Node::from(v))).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Node::UInteger(u)
                } else {
                    n.as_f64().map(Node::Float).unwrap_or(Node::Null)
                }
            }
            Value::String(s) => Node::String(s),
            Value::Array(arr) => Node::Sequence(arr.into_iter().map(Node::from).collect()),
            Value::Object(map) => Node::Mapping(
                map.into_iter().map(|(k, v)| (k, Node::from(v))).collect(),
            ),
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Integer(i)
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Float(f)
    }
}

impl From<Vec<Node>> for Node {
    fn from(seq: Vec<Node>) -> Self {
        Node::Sequence(seq)
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Self {
        Node::Mapping(map)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_yaml::Value::deserialize(deserializer).map(Node::from)
    }
}

/// Coerces a raw string to the most specific scalar: boolean, number, or
/// string (fallback).
///
/// Numbers follow the YAML loader, so `1e-3`, `+1`, `0x1f`, `.inf` and
/// `.nan` type the same way they would in a config file.
pub(crate) fn coerce_scalar(s: &str) -> Node {
    if s.eq_ignore_ascii_case("true") {
        return Node::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Node::Bool(false);
    }

    if looks_like_number(s) {
        let parsed = serde_yaml::from_str::<serde_yaml::Value>(s);
        if let Ok(value @ serde_yaml::Value::Number(_)) = parsed {
            return Node::from(value);
        }
    }

    Node::String(s.to_string())
}

fn looks_like_number(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
        && !s.contains(char::is_whitespace)
}
