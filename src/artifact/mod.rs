//! Artifact store: generation results indexed by node path and kind.
//!
//! The store is independent of tree shape and insensitive to result arrival
//! order, which is what lets a partial re-plan merge cleanly: re-inserting
//! a result for the same key overwrites the previous entry.

use crate::generate::{
    ConstraintCopy, EscalationGroup, GeneratedPayload, GenerationResult, TestCaseSpec,
    ValidatorArtifact,
};
use crate::plan::{StepType, UnitKind};
use crate::schema::NodePath;
use std::collections::HashMap;
use tracing::warn;

/// Generated artifacts for one constraint kind on one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintArtifacts {
    pub copy: Option<ConstraintCopy>,
    pub validator: Option<ValidatorArtifact>,
    pub tests: Option<Vec<TestCaseSpec>>,
}

/// Generated artifacts for one node.
#[derive(Debug, Clone, Default)]
pub struct NodeArtifacts {
    steps: HashMap<StepType, Vec<EscalationGroup>>,
    constraints: HashMap<String, ConstraintArtifacts>,
}

impl NodeArtifacts {
    /// Escalation groups generated for one step type, if any.
    pub fn step(&self, step_type: StepType) -> Option<&[EscalationGroup]> {
        self.steps.get(&step_type).map(Vec::as_slice)
    }

    pub fn constraint(&self, kind: &str) -> Option<&ConstraintArtifacts> {
        self.constraints.get(kind)
    }
}

/// Index of generation results, keyed first by node path, then by artifact
/// category.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    nodes: HashMap<NodePath, NodeArtifacts>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a result list into a store. Later entries for the same
    /// `(path, category)` key win.
    pub fn build(results: &[GenerationResult]) -> Self {
        let mut store = Self::new();
        for result in results {
            store.insert(result);
        }
        store
    }

    /// Route one result into the nested structure. Idempotent for identical
    /// results; last-write-wins for conflicting ones.
    ///
    /// A payload whose shape does not match its unit's category is dropped
    /// with a warning; absence is not an error at assembly time.
    pub fn insert(&mut self, result: &GenerationResult) {
        let node = self.nodes.entry(result.unit.path.clone()).or_default();
        match (&result.unit.kind, &result.payload) {
            (UnitKind::Step { step_type }, GeneratedPayload::Prompts(groups)) => {
                node.steps.insert(*step_type, groups.clone());
            }
            (UnitKind::ConstraintMessage { kind }, GeneratedPayload::ConstraintCopy(copy)) => {
                node.constraints.entry(kind.clone()).or_default().copy = Some(copy.clone());
            }
            (UnitKind::ValidatorCode { kind }, GeneratedPayload::Validator(validator)) => {
                node.constraints.entry(kind.clone()).or_default().validator =
                    Some(validator.clone());
            }
            (UnitKind::TestSet { kind }, GeneratedPayload::TestSet(cases)) => {
                node.constraints.entry(kind.clone()).or_default().tests = Some(cases.clone());
            }
            (kind, _) => {
                warn!(unit = %result.unit, category = %kind, "Dropping payload with mismatched shape");
            }
        }
    }

    /// Insert escalation groups for a step directly (legacy flat-format
    /// adapter path).
    pub(crate) fn insert_prompts(
        &mut self,
        path: NodePath,
        step_type: StepType,
        groups: Vec<EscalationGroup>,
    ) {
        self.nodes
            .entry(path)
            .or_default()
            .steps
            .insert(step_type, groups);
    }

    pub fn node(&self, path: &NodePath) -> Option<&NodeArtifacts> {
        self.nodes.get(path)
    }

    /// Iterate all indexed nodes (order unspecified).
    pub fn iter(&self) -> impl Iterator<Item = (&NodePath, &NodeArtifacts)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
