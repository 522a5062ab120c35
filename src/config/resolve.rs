//! Variable reference resolution for configuration values.
//!
//! Supports `${section.field}` syntax for cross-referencing values within config.
//! Use `$${...}` to escape and produce a literal `${...}`. References resolve
//! against the tree after overrides have been applied.

use std::collections::HashMap;

use super::node::{Mapping, Node};
use super::ConfigError;

/// Resolves all `${path.to.field}` references in the configuration mapping.
///
/// A referenced string is itself resolved before it is substituted, so chains
/// of references work. Returns an error if a circular reference is detected or
/// a referenced path doesn't exist.
pub fn resolve_references(map: &mut Mapping) -> Result<(), ConfigError> {
    let snapshot = map.clone();
    let mut resolver = Resolver {
        root: &snapshot,
        resolved: HashMap::new(),
        in_progress: Vec::new(),
    };

    for value in map.values_mut() {
        resolver.resolve_value(value)?;
    }
    Ok(())
}

struct Resolver<'a> {
    root: &'a Mapping,
    /// Fully expanded text per reference path.
    resolved: HashMap<String, String>,
    /// Reference paths currently being expanded, innermost last.
    in_progress: Vec<String>,
}

impl Resolver<'_> {
    fn resolve_value(&mut self, value: &mut Node) -> Result<(), ConfigError> {
        match value {
            Node::String(s) => {
                if s.contains('$') {
                    *s = self.expand(s)?;
                }
            }
            Node::Mapping(map) => {
                for item in map.values_mut() {
                    self.resolve_value(item)?;
                }
            }
            Node::Sequence(seq) => {
                for item in seq.iter_mut() {
                    self.resolve_value(item)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Expands every `${...}` in `s` in a single scan. `$$` becomes a literal
    /// `$` and is never scanned again.
    fn expand(&mut self, s: &str) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(s.len());
        let mut chars = s.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '$' {
                result.push(ch);
                continue;
            }

            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let path =
                        consume_until(&mut chars, '}').ok_or(ConfigError::UnclosedReference)?;
                    result.push_str(&self.reference(&path)?);
                }
                _ => result.push('$'),
            }
        }

        Ok(result)
    }

    fn reference(&mut self, path: &str) -> Result<String, ConfigError> {
        if let Some(text) = self.resolved.get(path) {
            return Ok(text.clone());
        }
        if self.in_progress.iter().any(|p| p == path) {
            return Err(ConfigError::CircularReference);
        }

        let root = self.root;
        let text = match lookup_path(root, path)? {
            Node::String(s) => {
                self.in_progress.push(path.to_string());
                let expanded = self.expand(s);
                self.in_progress.pop();
                expanded?
            }
            other => scalar_to_string(other, path)?,
        };

        self.resolved.insert(path.to_string(), text.clone());
        Ok(text)
    }
}

fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None
}

/// Looks up a dotted path; numeric segments index into sequences.
fn lookup_path<'a>(root: &'a Mapping, path: &str) -> Result<&'a Node, ConfigError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidReferencePath(path.to_string()));
    }

    let not_found = || ConfigError::ReferenceNotFound(path.to_string());

    let mut current = root.get(parts[0]).ok_or_else(not_found)?;
    for part in &parts[1..] {
        current = match current {
            Node::Mapping(map) => map.get(*part),
            Node::Sequence(seq) => part.parse::<usize>().ok().and_then(|i| seq.get(i)),
            _ => None,
        }
        .ok_or_else(not_found)?;
    }

    Ok(current)
}

fn scalar_to_string(value: &Node, path: &str) -> Result<String, ConfigError> {
    match value {
        Node::String(s) => Ok(s.clone()),
        Node::Integer(i) => Ok(i.to_string()),
        Node::UInteger(u) => Ok(u.to_string()),
        Node::Float(f) => Ok(f.to_string()),
        Node::Bool(b) => Ok(b.to_string()),
        Node::Null => Ok(String::new()),
        Node::Sequence(_) | Node::Mapping(_) => {
            Err(ConfigError::NonScalarReference(path.to_string()))
        }
    }
}
