//! Parser for flattened command-line overrides.
//!
//! The grammar follows the `--set` convention popularised by Helm:
//!
//! ```text
//! servers[0].port=2008,servers[0].common.enabled=false,name="1.10"
//! ```
//!
//! - `,` separates assignments, `=` separates key from value
//! - `.` walks into a mapping, `[n]` walks into a sequence
//! - `\` escapes the next character
//! - values are typed: `null`, booleans, integers and decimals are coerced,
//!   quoted values always stay strings

use thiserror::Error;

use super::node::{coerce_scalar, Mapping, Node};

/// Largest sequence index an override may reference.
pub const MAX_INDEX: usize = 65_536;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OverrideParseError {
    #[error("override '{0}' is missing '=<value>'")]
    MissingValue(String),

    #[error("override '{0}' has an empty key")]
    EmptyKey(String),

    #[error("override key '{0}' has an empty segment")]
    EmptySegment(String),

    #[error("override key '{0}' must start with a name, not an index")]
    IndexWithoutName(String),

    #[error("override key '{0}' has an unclosed index (missing ']')")]
    UnclosedIndex(String),

    #[error("override key '{key}' has an invalid index '{index}'")]
    InvalidIndex { key: String, index: String },

    #[error("override key '{key}' index {index} exceeds the maximum of {MAX_INDEX}")]
    IndexTooLarge { key: String, index: usize },

    #[error("override key '{key}' has unexpected character '{ch}' after an index")]
    UnexpectedCharacter { key: String, ch: char },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Parses an override string into a mapping node.
///
/// Sequences are materialized with `Null` slots up to the highest index an
/// assignment references, so positional merging lines up with the base tree.
pub fn parse_overrides(input: &str) -> Result<Node, OverrideParseError> {
    let mut root = Node::mapping();

    for assignment in split_unescaped(input, ',') {
        if assignment.trim().is_empty() {
            continue;
        }

        let (key, raw_value) = split_once_unescaped(assignment, '=')
            .ok_or_else(|| OverrideParseError::MissingValue(assignment.to_string()))?;

        let segments = parse_key(key)?;
        assign(&mut root, &segments, parse_value(raw_value));
    }

    Ok(root)
}

/// Splits on `delim` occurrences that are not preceded by a backslash.
/// Escapes are kept in the returned slices.
fn split_unescaped(input: &str, delim: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, ch) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delim {
            parts.push(&input[start..i]);
            start = i + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn split_once_unescaped(input: &str, delim: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, ch) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delim {
            return Some((&input[..i], &input[i + ch.len_utf8()..]));
        }
    }
    None
}

fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            // A trailing backslash is kept literally
            out.push(chars.next().unwrap_or('\\'));
        } else {
            out.push(ch);
        }
    }
    out
}

fn parse_key(key: &str) -> Result<Vec<Segment>, OverrideParseError> {
    let mut segments = Vec::new();
    let mut name = String::new();
    let mut after_index = false;
    let mut chars = key.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if after_index {
                    after_index = false;
                    continue;
                }
                if name.is_empty() {
                    return Err(OverrideParseError::EmptySegment(key.to_string()));
                }
                segments.push(Segment::Key(std::mem::take(&mut name)));
            }
            '[' => {
                if !after_index {
                    if name.is_empty() {
                        return Err(if segments.is_empty() {
                            OverrideParseError::IndexWithoutName(key.to_string())
                        } else {
                            OverrideParseError::EmptySegment(key.to_string())
                        });
                    }
                    segments.push(Segment::Key(std::mem::take(&mut name)));
                }

                let mut digits = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    if ch == ']' {
                        closed = true;
                        break;
                    }
                    digits.push(ch);
                }
                if !closed {
                    return Err(OverrideParseError::UnclosedIndex(key.to_string()));
                }

                let index = parse_index(key, &digits)?;
                segments.push(Segment::Index(index));
                after_index = true;
            }
            _ if after_index => {
                return Err(OverrideParseError::UnexpectedCharacter {
                    key: key.to_string(),
                    ch,
                });
            }
            '\\' => name.push(chars.next().unwrap_or('\\')),
            _ => name.push(ch),
        }
    }

    if !after_index {
        if name.is_empty() {
            return Err(if segments.is_empty() {
                OverrideParseError::EmptyKey(key.to_string())
            } else {
                OverrideParseError::EmptySegment(key.to_string())
            });
        }
        segments.push(Segment::Key(name));
    }

    Ok(segments)
}

fn parse_index(key: &str, digits: &str) -> Result<usize, OverrideParseError> {
    let invalid = || OverrideParseError::InvalidIndex {
        key: key.to_string(),
        index: digits.to_string(),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let index: usize = digits.parse().map_err(|_| invalid())?;
    if index > MAX_INDEX {
        return Err(OverrideParseError::IndexTooLarge {
            key: key.to_string(),
            index,
        });
    }
    Ok(index)
}

fn parse_value(raw: &str) -> Node {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Node::String(unescape(&raw[1..raw.len() - 1]));
        }
    }

    let value = unescape(raw);
    if value == "null" {
        return Node::Null;
    }
    coerce_scalar(&value)
}

/// Writes `value` at `segments` below `target`, creating containers as
/// needed. A container of the wrong shape is replaced.
fn assign(target: &mut Node, segments: &[Segment], value: Node) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    match head {
        Segment::Key(key) => {
            if !matches!(target, Node::Mapping(_)) {
                *target = Node::Mapping(Mapping::new());
            }
            if let Node::Mapping(map) = target {
                let slot = map.entry(key.clone()).or_insert(Node::Null);
                assign(slot, rest, value);
            }
        }
        Segment::Index(index) => {
            if !matches!(target, Node::Sequence(_)) {
                *target = Node::Sequence(Vec::new());
            }
            if let Node::Sequence(seq) = target {
                if seq.len() <= *index {
                    seq.resize(index + 1, Node::Null);
                }
                assign(&mut seq[*index], rest, value);
            }
        }
    }
}
