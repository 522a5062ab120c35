//! Layered configuration sources.
//!
//! Layers are merged with replacement semantics: mappings merge recursively,
//! every other value (including sequences) is replaced, and new keys are
//! added. Shape-guarded overrides are applied separately, see
//! [`overlay`](super::overlay).

use super::node::{Mapping, Node};
use super::ConfigError;

/// A value a source contributes at `path` below the config root.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Node,
}

impl ConfigEntry {
    pub fn root(map: Mapping) -> Self {
        Self {
            path: Vec::new(),
            value: Node::Mapping(map),
        }
    }

    pub fn at_path(path: Vec<String>, value: Node) -> Self {
        Self { path, value }
    }
}

/// Something that contributes a configuration layer.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Merges `value` into `map` at `path`, creating intermediate mappings.
pub fn merge_at_path(map: &mut Mapping, path: &[String], value: Node) {
    let Some((first, rest)) = path.split_first() else {
        if let Node::Mapping(layer) = value {
            deep_merge(map, layer);
        }
        return;
    };

    if rest.is_empty() {
        match (map.get_mut(first), value) {
            (Some(Node::Mapping(base)), Node::Mapping(layer)) => deep_merge(base, layer),
            (_, value) => {
                map.insert(first.clone(), value);
            }
        }
        return;
    }

    if !matches!(map.get(first), Some(Node::Mapping(_))) {
        map.insert(first.clone(), Node::mapping());
    }

    if let Some(Node::Mapping(nested)) = map.get_mut(first) {
        merge_at_path(nested, rest, value);
    }
}

/// Recursively merges `layer` into `base`; `layer` wins on conflicts.
pub fn deep_merge(base: &mut Mapping, layer: Mapping) {
    for (key, value) in layer {
        match (base.get_mut(&key), value) {
            (Some(Node::Mapping(base_map)), Node::Mapping(layer_map)) => {
                deep_merge(base_map, layer_map);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
