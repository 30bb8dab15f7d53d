//! Node path handling for schema and artifact addressing.
//!
//! Paths are segment lists joined with `.`. A literal separator inside a
//! label is slash-escaped before joining (`.` becomes `/.`, `/` becomes
//! `//`) so encoded paths always parse back to the original segments.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Segment separator used in encoded paths.
pub const SEPARATOR: char = '.';

/// Escape character used for literal separators inside labels.
const ESCAPE: char = '/';

/// Path of a node within one schema forest.
///
/// One segment for a root field, two for a child field. The encoded form is
/// what unit descriptors and legacy result keys carry; components compare
/// paths structurally, never by substring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// Path of a root field.
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            segments: vec![label.into()],
        }
    }

    /// Path of a child beneath this path.
    pub fn child(&self, label: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(label.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment: the node's own label.
    pub fn leaf(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// True for a single-segment (root field) path.
    pub fn is_root(&self) -> bool {
        self.segments.len() == 1
    }

    /// Encode as a separator-joined string with escaped labels.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            out.push_str(&escape_label(segment));
        }
        out
    }

    /// Parse an encoded path back into segments.
    pub fn decode(encoded: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = encoded.chars();
        while let Some(c) = chars.next() {
            match c {
                ESCAPE => match chars.next() {
                    Some(next) => current.push(next),
                    None => current.push(ESCAPE),
                },
                SEPARATOR => {
                    segments.push(std::mem::take(&mut current));
                }
                other => current.push(other),
            }
        }
        segments.push(current);
        Self { segments }
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Ok(NodePath::decode(&encoded))
    }
}

fn escape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            ESCAPE => {
                out.push(ESCAPE);
                out.push(ESCAPE);
            }
            SEPARATOR => {
                out.push(ESCAPE);
                out.push(SEPARATOR);
            }
            other => out.push(other),
        }
    }
    out
}

/// Normalize a label for case-insensitive matching (legacy result routing,
/// child artifact lookup).
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
