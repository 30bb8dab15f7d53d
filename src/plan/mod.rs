//! Plan builder: computes the ordered generation unit list for a schema.
//!
//! Planning is a pure function of the schema forest: same input, same unit
//! list. The orchestrator executes units strictly in plan order, so the
//! order emitted here is the order the external generator sees.

use crate::error::CompileError;
use crate::schema::{NodePath, RootField};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Conversational step types a node can carry.
///
/// Root fields receive all six; child fields receive only the first three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepType {
    Start,
    NoMatch,
    NoInput,
    Confirmation,
    NotConfirmed,
    Success,
}

impl StepType {
    /// Step set for a root field, in materialization order.
    pub const ROOT_STEPS: [StepType; 6] = [
        StepType::Start,
        StepType::NoMatch,
        StepType::NoInput,
        StepType::Confirmation,
        StepType::NotConfirmed,
        StepType::Success,
    ];

    /// Step set for a child field, in materialization order.
    pub const CHILD_STEPS: [StepType; 3] = [StepType::Start, StepType::NoMatch, StepType::NoInput];

    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            StepType::Start => "start",
            StepType::NoMatch => "noMatch",
            StepType::NoInput => "noInput",
            StepType::Confirmation => "confirmation",
            StepType::NotConfirmed => "notConfirmed",
            StepType::Success => "success",
        }
    }

    pub fn is_legal_for_child(self) -> bool {
        Self::CHILD_STEPS.contains(&self)
    }
}

/// What a single unit of work asks the generator to produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UnitKind {
    /// Prompt content for one step of the node.
    Step { step_type: StepType },
    /// Violation message copy for one constraint kind.
    ConstraintMessage { kind: String },
    /// Validator code for one constraint kind.
    ValidatorCode { kind: String },
    /// Test cases exercising the validator for one constraint kind.
    TestSet { kind: String },
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Step { step_type } => f.write_str(step_type.as_str()),
            UnitKind::ConstraintMessage { kind } => write!(f, "constraintMessage({kind})"),
            UnitKind::ValidatorCode { kind } => write!(f, "validatorCode({kind})"),
            UnitKind::TestSet { kind } => write!(f, "testSet({kind})"),
        }
    }
}

/// One planned generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitOfWork {
    pub path: NodePath,
    pub kind: UnitKind,
}

impl UnitOfWork {
    pub fn step(path: NodePath, step_type: StepType) -> Self {
        Self {
            path,
            kind: UnitKind::Step { step_type },
        }
    }
}

impl std::fmt::Display for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.path, self.kind)
    }
}

/// Ordered unit list for one compilation, with summary metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPlan {
    pub plan_id: String,
    pub units: Vec<UnitOfWork>,
    pub total_units: usize,
}

impl GenerationPlan {
    pub fn new(units: Vec<UnitOfWork>) -> Self {
        let plan_id = format!("plan-{}", chrono::Utc::now().timestamp_millis());
        Self {
            plan_id,
            total_units: units.len(),
            units,
        }
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.plan_id.trim().is_empty() {
            return Err(CompileError::ConfigError(
                "Generation plan id cannot be empty".to_string(),
            ));
        }
        if self.total_units != self.units.len() {
            return Err(CompileError::ConfigError(format!(
                "Generation plan total_units mismatch: expected {}, got {}",
                self.units.len(),
                self.total_units
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Dirty sets for partial re-planning after a localized edit.
///
/// `constraints` holds node paths whose constraint set changed; the partial
/// plan re-emits the unit triples for every countable constraint at those
/// paths.
#[derive(Debug, Clone, Default)]
pub struct DirtySet {
    pub roots: HashSet<String>,
    pub children: HashSet<NodePath>,
    pub constraints: HashSet<NodePath>,
}

impl DirtySet {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.children.is_empty() && self.constraints.is_empty()
    }
}

/// Build the full unit list for a schema forest.
///
/// Per root: six step units, then a {message, validator, test set} triple
/// per countable constraint; per child: three step units plus the same
/// triple per countable child constraint. Children are never recursed
/// further; the schema types bound the depth.
pub fn build_plan(fields: &[RootField]) -> GenerationPlan {
    GenerationPlan::new(plan_units(fields))
}

/// Build only the units affected by the given dirty sets.
pub fn build_partial_plan(fields: &[RootField], dirty: &DirtySet) -> GenerationPlan {
    GenerationPlan::new(partial_plan_units(fields, dirty))
}

fn plan_units(fields: &[RootField]) -> Vec<UnitOfWork> {
    let everything = DirtySet {
        roots: fields.iter().map(|f| f.name.clone()).collect(),
        children: fields
            .iter()
            .flat_map(|f| f.children.iter().map(move |c| c.path(f)))
            .collect(),
        constraints: fields
            .iter()
            .flat_map(|f| {
                std::iter::once(f.path()).chain(f.children.iter().map(move |c| c.path(f)))
            })
            .collect(),
    };
    partial_plan_units(fields, &everything)
}

fn partial_plan_units(fields: &[RootField], dirty: &DirtySet) -> Vec<UnitOfWork> {
    let mut units = Vec::new();
    for field in fields {
        let path = field.path();
        if dirty.roots.contains(&field.name) {
            for step_type in StepType::ROOT_STEPS {
                units.push(UnitOfWork::step(path.clone(), step_type));
            }
        }
        if dirty.constraints.contains(&path) {
            push_constraint_units(&mut units, &path, field.constraints.iter());
        }
        for child in &field.children {
            let child_path = child.path(field);
            if dirty.children.contains(&child_path) {
                for step_type in StepType::CHILD_STEPS {
                    units.push(UnitOfWork::step(child_path.clone(), step_type));
                }
            }
            if dirty.constraints.contains(&child_path) {
                push_constraint_units(&mut units, &child_path, child.constraints.iter());
            }
        }
    }
    units
}

fn push_constraint_units<'a>(
    units: &mut Vec<UnitOfWork>,
    path: &NodePath,
    constraints: impl Iterator<Item = &'a crate::schema::Constraint>,
) {
    for constraint in constraints.filter(|c| c.is_countable()) {
        let kind = constraint.kind().to_string();
        units.push(UnitOfWork {
            path: path.clone(),
            kind: UnitKind::ConstraintMessage { kind: kind.clone() },
        });
        units.push(UnitOfWork {
            path: path.clone(),
            kind: UnitKind::ValidatorCode { kind: kind.clone() },
        });
        units.push(UnitOfWork {
            path: path.clone(),
            kind: UnitKind::TestSet { kind },
        });
    }
}
