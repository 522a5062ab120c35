//! Shape-preserving overlay of override trees onto a base tree.
//!
//! An override only replaces values whose path already exists in the base
//! and whose [`Kind`] matches. Unknown keys, out-of-range sequence indices and
//! kind mismatches are dropped, so overrides can change values but never the
//! shape of the configuration. Sequences never grow.

use std::fmt;

use super::node::{Kind, Mapping, Node};

/// An override entry that was not applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedOverride {
    /// Path of the entry in `a.b[0].c` form.
    pub path: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The key does not exist in the base mapping.
    UnknownKey,
    /// The index is past the end of the base sequence.
    OutOfRange { len: usize },
    KindMismatch { base: Kind, overrides: Kind },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::UnknownKey => f.write_str("key does not exist in base configuration"),
            DropReason::OutOfRange { len } => {
                write!(f, "index is out of range for sequence of length {len}")
            }
            DropReason::KindMismatch { base, overrides } => {
                write!(f, "expected {base}, got {overrides}")
            }
        }
    }
}

impl fmt::Display for DroppedOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Applies `overrides` onto `base` in place.
pub fn override_node(base: &mut Node, overrides: &Node) {
    Walker::silent().node(base, overrides);
}

/// Same as [`override_node`], additionally returning every dropped entry.
pub fn override_node_reporting(base: &mut Node, overrides: &Node) -> Vec<DroppedOverride> {
    let mut walker = Walker::reporting();
    walker.node(base, overrides);
    walker.dropped.unwrap_or_default()
}

/// Applies `overrides` onto the `base` mapping. A missing side is a no-op.
pub fn override_mapping(base: Option<&mut Mapping>, overrides: Option<&Mapping>) {
    if let (Some(base), Some(overrides)) = (base, overrides) {
        Walker::silent().mapping(base, overrides);
    }
}

/// Applies `overrides` onto the `base` sequence positionally. A missing side is a no-op.
pub fn override_sequence(base: Option<&mut Vec<Node>>, overrides: Option<&[Node]>) {
    if let (Some(base), Some(overrides)) = (base, overrides) {
        Walker::silent().sequence(base, overrides);
    }
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

struct Walker<'a> {
    path: Vec<Segment<'a>>,
    dropped: Option<Vec<DroppedOverride>>,
}

impl<'a> Walker<'a> {
    fn silent() -> Self {
        Self {
            path: Vec::new(),
            dropped: None,
        }
    }

    fn reporting() -> Self {
        Self {
            path: Vec::new(),
            dropped: Some(Vec::new()),
        }
    }

    fn node(&mut self, base: &mut Node, overrides: &'a Node) {
        let (base_kind, override_kind) = (base.kind(), overrides.kind());
        if base_kind != override_kind {
            self.drop_entry(DropReason::KindMismatch {
                base: base_kind,
                overrides: override_kind,
            });
            return;
        }

        match (base, overrides) {
            (Node::Mapping(base), Node::Mapping(overrides)) => self.mapping(base, overrides),
            (Node::Sequence(base), Node::Sequence(overrides)) => self.sequence(base, overrides),
            (base, overrides) => *base = overrides.clone(),
        }
    }

    fn mapping(&mut self, base: &mut Mapping, overrides: &'a Mapping) {
        for (key, value) in overrides {
            self.path.push(Segment::Key(key));
            match base.get_mut(key.as_str()) {
                Some(existing) => self.node(existing, value),
                None => self.drop_entry(DropReason::UnknownKey),
            }
            self.path.pop();
        }
    }

    fn sequence(&mut self, base: &mut [Node], overrides: &'a [Node]) {
        let len = base.len();
        for (index, value) in overrides.iter().enumerate() {
            // Holes left by the override parser
            if value.is_null() {
                continue;
            }

            self.path.push(Segment::Index(index));
            match base.get_mut(index) {
                Some(existing) => self.node(existing, value),
                None => self.drop_entry(DropReason::OutOfRange { len }),
            }
            self.path.pop();
        }
    }

    fn drop_entry(&mut self, reason: DropReason) {
        if let Some(dropped) = self.dropped.as_mut() {
            dropped.push(DroppedOverride {
                path: render_path(&self.path),
                reason,
            });
        }
    }
}

fn render_path(path: &[Segment<'_>]) -> String {
    if path.is_empty() {
        return "(root)".to_string();
    }

    let mut out = String::new();
    for segment in path {
        match segment {
            Segment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                for ch in key.chars() {
                    if matches!(ch, '.' | '[' | ']' | ',' | '=' | '\\') {
                        out.push('\\');
                    }
                    out.push(ch);
                }
            }
            Segment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Node {
        Node::from_yaml_str(s).unwrap()
    }

    #[test]
    fn test_leaf_replacement() {
        let mut base = yaml("a: x");
        override_node(&mut base, &yaml("a: y"));
        assert_eq!(base, yaml("a: y"));
    }

    #[test]
    fn test_mismatched_kind_is_dropped() {
        let mut base = yaml("a: x");
        override_node(&mut base, &yaml("a: false"));
        assert_eq!(base, yaml("a: x"));
    }

    #[test]
    fn test_integer_and_float_are_different_kinds() {
        let mut base = yaml("port: 80\nratio: 0.5");
        override_node(&mut base, &yaml("port: 1.5\nratio: 2"));
        assert_eq!(base, yaml("port: 80\nratio: 0.5"));
    }

    #[test]
    fn test_sequence_overwrite_without_growth() {
        let mut base = yaml("[p, q]");
        override_node(&mut base, &yaml("[r, s, t]"));
        assert_eq!(base, yaml("[r, s]"));
    }

    #[test]
    fn test_nested_mapping_recursion() {
        let mut base = yaml("m: {k: v1, other: keep}");
        override_node(&mut base, &yaml("m: {k: v2}"));
        assert_eq!(base, yaml("m: {k: v2, other: keep}"));
    }

    #[test]
    fn test_unknown_key_is_dropped() {
        let mut base = yaml("a: 1");
        override_node(&mut base, &yaml("b: 2"));
        assert_eq!(base, yaml("a: 1"));
    }

    #[test]
    fn test_mapping_inside_sequence() {
        let mut base = yaml(
            r#"
            servers:
              - port: 1949
                common:
                  enabled: true
              - port: 1950
            "#,
        );
        let overrides = yaml(
            r#"
            servers:
              - port: 2008
                common:
                  enabled: false
            "#,
        );
        override_node(&mut base, &overrides);

        assert_eq!(base["servers"][0]["port"], Node::Integer(2008));
        assert_eq!(base["servers"][0]["common"]["enabled"], Node::Bool(false));
        assert_eq!(base["servers"][1]["port"], Node::Integer(1950));
    }

    #[test]
    fn test_null_sequence_slots_are_skipped() {
        let mut base = yaml("[a, b, c]");
        override_node(&mut base, &yaml("[~, ~, z]"));
        assert_eq!(base, yaml("[a, b, z]"));
    }

    #[test]
    fn test_container_kind_mismatch_keeps_base() {
        let mut base = yaml("list: [1, 2]\nmap: {a: 1}");
        override_node(&mut base, &yaml("list: {a: 1}\nmap: [1]"));
        assert_eq!(base, yaml("list: [1, 2]\nmap: {a: 1}"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let overrides = yaml("a: {b: [9, 8, 7]}\nc: new\nd: 4");
        let mut once = yaml("a: {b: [1, 2]}\nc: old\nd: x");
        override_node(&mut once, &overrides);

        let mut twice = once.clone();
        override_node(&mut twice, &overrides);

        assert_eq!(once, twice);
        assert_eq!(once, yaml("a: {b: [9, 8]}\nc: new\nd: x"));
    }

    #[test]
    fn test_absent_inputs_are_noops() {
        let mut base = yaml("a: 1");
        let expected = base.clone();

        override_mapping(base.as_mapping_mut(), None);
        assert_eq!(base, expected);

        override_mapping(None, yaml("a: 2").as_mapping());

        let mut seq = vec![Node::from("p")];
        override_sequence(Some(&mut seq), None);
        override_sequence(None, Some(&[Node::from("r")]));
        assert_eq!(seq, vec![Node::from("p")]);
    }

    #[test]
    fn test_override_mapping_with_both_sides() {
        let mut base = yaml("a: 1\nb: two");
        let overrides = yaml("a: 3\nb: 4");
        override_mapping(base.as_mapping_mut(), overrides.as_mapping());
        assert_eq!(base, yaml("a: 3\nb: two"));
    }

    #[test]
    fn test_override_sequence_with_both_sides() {
        let mut base = vec![Node::from("p"), Node::from("q")];
        let overrides = [Node::from("r"), Node::Integer(1)];
        override_sequence(Some(&mut base), Some(&overrides));
        assert_eq!(base, vec![Node::from("r"), Node::from("q")]);
    }

    #[test]
    fn test_top_level_mismatch_is_noop() {
        let mut base = yaml("a: 1");
        override_node(&mut base, &yaml("[1, 2]"));
        assert_eq!(base, yaml("a: 1"));

        let mut null_base = Node::Null;
        override_node(&mut null_base, &yaml("a: 1"));
        assert!(null_base.is_null());
    }

    #[test]
    fn test_override_is_not_mutated() {
        let overrides = yaml("a: {b: 2}");
        let snapshot = overrides.clone();
        let mut base = yaml("a: {b: 1}");
        override_node(&mut base, &overrides);
        assert_eq!(overrides, snapshot);
    }

    #[test]
    fn test_reporting_lists_dropped_entries() {
        let mut base = yaml("a: x\nlist: [1, 2]\nm: {k: v}");
        let overrides = yaml("a: false\nlist: [3, 4, 5]\nm: {k: w, extra: 1}\nzz: 1");
        let dropped = override_node_reporting(&mut base, &overrides);

        assert_eq!(
            dropped,
            vec![
                DroppedOverride {
                    path: "a".into(),
                    reason: DropReason::KindMismatch {
                        base: Kind::String,
                        overrides: Kind::Bool,
                    },
                },
                DroppedOverride {
                    path: "list[2]".into(),
                    reason: DropReason::OutOfRange { len: 2 },
                },
                DroppedOverride {
                    path: "m.extra".into(),
                    reason: DropReason::UnknownKey,
                },
                DroppedOverride {
                    path: "zz".into(),
                    reason: DropReason::UnknownKey,
                },
            ]
        );
        assert_eq!(base, yaml("a: x\nlist: [3, 4]\nm: {k: w}"));
    }

    #[test]
    fn test_reporting_root_and_escaped_paths() {
        let mut base = yaml("a: 1");
        let dropped = override_node_reporting(&mut base, &yaml("[1]"));
        assert_eq!(dropped[0].path, "(root)");

        let mut base = yaml("a: 1");
        let dropped = override_node_reporting(&mut base, &yaml("\"x.y\": 1"));
        assert_eq!(dropped[0].path, "x\\.y");
        assert_eq!(dropped[0].to_string(), "x\\.y: key does not exist in base configuration");
    }
}
