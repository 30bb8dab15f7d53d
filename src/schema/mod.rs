//! Schema model: the authored field hierarchy a compilation starts from.
//!
//! The schema is a two-tier forest: root fields, each optionally decomposed
//! into child fields. Depth is bounded by the types themselves; a child
//! cannot carry further children (composite-of-composite is unsupported).
//! Schemas are frozen before planning starts and treated as read-only for
//! the duration of one compilation.

pub mod path;

use serde::{Deserialize, Serialize};

pub use path::NodePath;

/// Placeholder label for nodes whose entire fallback chain is empty.
pub const UNNAMED_FIELD: &str = "Unnamed Field";

/// A validation constraint authored on a field.
///
/// `Required` is never countable for generation planning: no message,
/// validator, or test units are planned for it. All other kinds generate a
/// {message, validator, test set} unit triple. This split is given business
/// policy, not derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Constraint {
    Required,
    Range { min: f64, max: f64 },
    Length { min: usize, max: usize },
    Pattern { regex: String },
    OneOf { values: Vec<String> },
}

impl Constraint {
    /// Stable kind string used for unit tagging and artifact keying.
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::Required => "required",
            Constraint::Range { .. } => "range",
            Constraint::Length { .. } => "length",
            Constraint::Pattern { .. } => "pattern",
            Constraint::OneOf { .. } => "oneOf",
        }
    }

    /// Whether this constraint generates its own content/validator/test units.
    pub fn is_countable(&self) -> bool {
        !matches!(self, Constraint::Required)
    }
}

/// A top-level field in the schema. Receives the full six-step set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootField {
    /// Raw name, unique within the forest. Used to build node paths.
    pub name: String,
    /// Explicit display label, when the author set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Variable name the field binds to in the dialogue runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    /// Field type tag, e.g. "date", "number", "text".
    pub field_type: String,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub children: Vec<ChildField>,
}

/// A decomposition of a root field (e.g. day/month/year of a date).
/// Receives only the start/no-match/no-input steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildField {
    /// Raw name, unique within its sibling set.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    pub field_type: String,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl RootField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            variable: None,
            field_type: field_type.into(),
            constraints: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Path of this root field.
    pub fn path(&self) -> NodePath {
        NodePath::root(self.name.clone())
    }

    /// Resolved display label: explicit label, else variable, else raw name,
    /// else a fixed placeholder.
    pub fn resolved_label(&self) -> String {
        resolve_label(self.label.as_deref(), self.variable.as_deref(), &self.name)
    }

    /// Find a child by normalized (case-insensitive) name.
    pub fn find_child(&self, name: &str) -> Option<&ChildField> {
        let wanted = path::normalize_label(name);
        self.children
            .iter()
            .find(|child| path::normalize_label(&child.name) == wanted)
    }
}

impl ChildField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            variable: None,
            field_type: field_type.into(),
            constraints: Vec::new(),
        }
    }

    /// Path of this child beneath its parent root.
    pub fn path(&self, parent: &RootField) -> NodePath {
        parent.path().child(self.name.clone())
    }

    pub fn resolved_label(&self) -> String {
        resolve_label(self.label.as_deref(), self.variable.as_deref(), &self.name)
    }
}

fn resolve_label(label: Option<&str>, variable: Option<&str>, name: &str) -> String {
    for candidate in [label, variable, Some(name)].into_iter().flatten() {
        if !candidate.trim().is_empty() {
            return candidate.to_string();
        }
    }
    UNNAMED_FIELD.to_string()
}
