//! Shared identifier types for one compilation run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one compilation run.
///
/// Scopes every translation key synthesized during assembly, so two
/// compilations of the same schema never collide in a shared table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompilationId(String);

impl CompilationId {
    /// Generate a fresh compilation id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an externally supplied id (e.g. from a persisted run).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompilationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fresh unique identifier for runtime nodes, escalations, and tasks.
///
/// Identifiers are generated once during assembly and are stable for the
/// lifetime of the compiled tree; they are not content-derived.
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}
