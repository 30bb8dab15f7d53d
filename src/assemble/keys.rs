//! Translation key synthesis and the key→text table.
//!
//! Keys are fresh per task, but uniqueness is verified explicitly at
//! insertion time rather than assumed from the identifier generator: a
//! collision means the synthesis scheme is broken, and assembly aborts.

use super::TaskTemplate;
use crate::error::CompileError;
use crate::plan::StepType;
use crate::types::CompilationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Flat key→localized-text table produced by one compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable {
    entries: BTreeMap<String, String>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, failing on collision. Two distinct tasks resolving to
    /// the same key is a contract violation, never a data-quality issue.
    pub fn insert_unique(
        &mut self,
        key: String,
        text: String,
    ) -> Result<(), CompileError> {
        if self.entries.contains_key(&key) {
            return Err(CompileError::DuplicateTranslationKey(key));
        }
        self.entries.insert(key, text);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Synthesizes translation keys scoped to one compilation.
///
/// Key shape: `<namespace>.<compilationId>.<stepType>.<templateKind>.<suffix>.text`.
#[derive(Debug, Clone)]
pub struct KeyFactory {
    namespace: String,
    compilation_id: CompilationId,
}

impl KeyFactory {
    pub fn new(namespace: impl Into<String>, compilation_id: CompilationId) -> Self {
        Self {
            namespace: namespace.into(),
            compilation_id,
        }
    }

    /// Synthesize a fresh key for one task.
    pub fn synthesize(&self, step_type: StepType, template: TaskTemplate) -> String {
        format!(
            "{}.{}.{}.{}.{}.text",
            self.namespace,
            self.compilation_id,
            step_type.as_str(),
            template.as_str(),
            Uuid::new_v4().simple()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_keys_carry_scope_and_suffix() {
        let factory = KeyFactory::new("runtime", CompilationId::from_string("c1"));
        let key = factory.synthesize(StepType::Start, TaskTemplate::Ask);
        assert!(key.starts_with("runtime.c1.start.ask."));
        assert!(key.ends_with(".text"));
    }

    #[test]
    fn consecutive_keys_differ() {
        let factory = KeyFactory::new("runtime", CompilationId::generate());
        let a = factory.synthesize(StepType::Success, TaskTemplate::Say);
        let b = factory.synthesize(StepType::Success, TaskTemplate::Say);
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_insertion_is_fatal() {
        let mut table = TranslationTable::new();
        table
            .insert_unique("k".to_string(), "text".to_string())
            .unwrap();
        let err = table
            .insert_unique("k".to_string(), "other".to_string())
            .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateTranslationKey(_)));
        // The original entry survives.
        assert_eq!(table.get("k"), Some("text"));
    }
}
