//! Tree assembler: schema + artifact store → runtime dialogue tree plus
//! translation table.
//!
//! Assembly never fails on missing content: a node with constraints but
//! zero generated steps is a structurally valid (if low-quality) output.
//! The fatal errors are contract violations only — a duplicate translation
//! key, or an illegal step type reaching a child node.

pub mod keys;
pub mod legacy;

use crate::artifact::{ArtifactStore, ConstraintArtifacts, NodeArtifacts};
use crate::error::CompileError;
use crate::generate::{ConstraintCopy, EscalationGroup, TestCaseSpec, ValidatorArtifact};
use crate::plan::StepType;
use crate::schema::path::normalize_label;
use crate::schema::{ChildField, Constraint, NodePath, RootField};
use crate::types::{fresh_id, CompilationId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub use keys::{KeyFactory, TranslationTable};
pub use legacy::FlatStepResult;

/// Executable task template inside an escalation.
///
/// Steps that await user input produce `Ask` tasks; terminal announcements
/// produce `Say` tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskTemplate {
    Ask,
    Say,
}

impl TaskTemplate {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskTemplate::Ask => "ask",
            TaskTemplate::Say => "say",
        }
    }

    /// Template used for tasks of a given step type.
    pub fn for_step(step_type: StepType) -> Self {
        match step_type {
            StepType::NotConfirmed | StepType::Success => TaskTemplate::Say,
            _ => TaskTemplate::Ask,
        }
    }
}

/// One task parameter; `value` is a translation key for text parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParameter {
    pub parameter_id: String,
    pub value: String,
}

/// One executable unit inside an escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub template: TaskTemplate,
    pub parameters: Vec<TaskParameter>,
}

impl Task {
    /// The translation key this task's text parameter references.
    pub fn text_key(&self) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.parameter_id == "text")
            .map(|p| p.value.as_str())
    }
}

/// One attempt-group of alternative phrasings for a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub id: String,
    pub tasks: Vec<Task>,
}

/// One conversational step of a node. Always present for every legal step
/// type of the node's tier, even with an empty escalation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub step_type: StepType,
    pub escalations: Vec<Escalation>,
}

/// An authored constraint enriched with whatever artifacts generation
/// produced for its kind. Missing artifacts leave the authored fields as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConstraint {
    pub constraint: Constraint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<ConstraintCopy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<TestCaseSpec>>,
}

/// One node of the compiled dialogue tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeNode {
    pub id: String,
    pub label: String,
    pub field_type: String,
    pub constraints: Vec<RuntimeConstraint>,
    pub steps: Vec<Step>,
    pub children: Vec<RuntimeNode>,
}

impl RuntimeNode {
    pub fn step(&self, step_type: StepType) -> Option<&Step> {
        self.steps.iter().find(|s| s.step_type == step_type)
    }
}

/// Durable output of one compilation: the runtime tree plus its
/// translation table. Never mutated by the compiler after being returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledDialogue {
    pub compilation_id: CompilationId,
    pub nodes: Vec<RuntimeNode>,
    pub translations: TranslationTable,
}

/// Assembles runtime trees from a schema forest and an artifact store.
pub struct TreeAssembler {
    namespace: String,
}

impl TreeAssembler {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Assemble with a fresh compilation id.
    pub fn assemble(
        &self,
        fields: &[RootField],
        store: &ArtifactStore,
    ) -> Result<CompiledDialogue, CompileError> {
        self.assemble_with_id(fields, store, CompilationId::generate())
    }

    /// Assemble under an explicit compilation id (resumed or replayed runs).
    #[instrument(skip(self, fields, store), fields(compilation_id = %compilation_id))]
    pub fn assemble_with_id(
        &self,
        fields: &[RootField],
        store: &ArtifactStore,
        compilation_id: CompilationId,
    ) -> Result<CompiledDialogue, CompileError> {
        let factory = KeyFactory::new(&self.namespace, compilation_id.clone());
        let mut table = TranslationTable::new();
        let mut nodes = Vec::with_capacity(fields.len());
        for field in fields {
            nodes.push(build_root_node(field, store, &factory, &mut table)?);
        }
        info!(
            node_count = nodes.len(),
            translation_count = table.len(),
            "Assembly completed"
        );
        Ok(CompiledDialogue {
            compilation_id,
            nodes,
            translations: table,
        })
    }

    /// Assemble one root field from legacy flat results: demultiplex into a
    /// store, then run the one assembly path. Assembly logic is never
    /// duplicated per input format.
    pub fn assemble_flat(
        &self,
        field: &RootField,
        results: &[FlatStepResult],
    ) -> Result<CompiledDialogue, CompileError> {
        let store = legacy::demux_flat_results(field, results);
        self.assemble(std::slice::from_ref(field), &store)
    }
}

fn build_root_node(
    field: &RootField,
    store: &ArtifactStore,
    factory: &KeyFactory,
    table: &mut TranslationTable,
) -> Result<RuntimeNode, CompileError> {
    let path = field.path();
    let artifacts = lookup_artifacts(store, &path);
    let steps = build_steps(&path, &StepType::ROOT_STEPS, artifacts, factory, table)?;
    let constraints = enrich_constraints(&field.constraints, artifacts);

    let mut children = Vec::with_capacity(field.children.len());
    for child in &field.children {
        children.push(build_child_node(child, field, store, factory, table)?);
    }

    Ok(RuntimeNode {
        id: fresh_id(),
        label: field.resolved_label(),
        field_type: field.field_type.clone(),
        constraints,
        steps,
        children,
    })
}

fn build_child_node(
    child: &ChildField,
    parent: &RootField,
    store: &ArtifactStore,
    factory: &KeyFactory,
    table: &mut TranslationTable,
) -> Result<RuntimeNode, CompileError> {
    let path = child.path(parent);
    let artifacts = lookup_artifacts(store, &path);
    // Children never materialize confirmation/notConfirmed/success, even
    // when artifacts exist for them.
    let steps = build_steps(&path, &StepType::CHILD_STEPS, artifacts, factory, table)?;
    let constraints = enrich_constraints(&child.constraints, artifacts);

    Ok(RuntimeNode {
        id: fresh_id(),
        label: child.resolved_label(),
        field_type: child.field_type.clone(),
        constraints,
        steps,
        children: Vec::new(),
    })
}

/// Exact path lookup, then a case-insensitive fallback on the same
/// segment count. Two children with different labels never share content;
/// a child's content is never confused with the root's.
fn lookup_artifacts<'a>(store: &'a ArtifactStore, path: &NodePath) -> Option<&'a NodeArtifacts> {
    if let Some(node) = store.node(path) {
        return Some(node);
    }
    let wanted: Vec<String> = path.segments().iter().map(|s| normalize_label(s)).collect();
    store
        .iter()
        .filter(|(candidate, _)| {
            candidate.segments().len() == wanted.len()
                && candidate
                    .segments()
                    .iter()
                    .map(|s| normalize_label(s))
                    .eq(wanted.iter().cloned())
        })
        // Deterministic pick when several candidates normalize equal.
        .min_by(|(a, _), (b, _)| a.encode().cmp(&b.encode()))
        .map(|(_, node)| node)
}

fn build_steps(
    path: &NodePath,
    legal: &[StepType],
    artifacts: Option<&NodeArtifacts>,
    factory: &KeyFactory,
    table: &mut TranslationTable,
) -> Result<Vec<Step>, CompileError> {
    let mut steps = Vec::with_capacity(legal.len());
    for &step_type in legal {
        if !path.is_root() && !step_type.is_legal_for_child() {
            return Err(CompileError::IllegalChildStep {
                path: path.clone(),
                step_type,
            });
        }
        let groups: &[EscalationGroup] = artifacts
            .and_then(|a| a.step(step_type))
            .unwrap_or_default();
        let mut escalations = Vec::with_capacity(groups.len());
        for group in groups {
            escalations.push(build_escalation(step_type, group, factory, table)?);
        }
        if escalations.is_empty() {
            debug!(%path, step = step_type.as_str(), "Emitting empty step");
        }
        steps.push(Step {
            step_type,
            escalations,
        });
    }
    Ok(steps)
}

fn build_escalation(
    step_type: StepType,
    group: &EscalationGroup,
    factory: &KeyFactory,
    table: &mut TranslationTable,
) -> Result<Escalation, CompileError> {
    let template = TaskTemplate::for_step(step_type);
    let mut tasks = Vec::with_capacity(group.len());
    for message in group {
        let key = factory.synthesize(step_type, template);
        table.insert_unique(key.clone(), message.clone())?;
        tasks.push(Task {
            id: fresh_id(),
            template,
            parameters: vec![TaskParameter {
                parameter_id: "text".to_string(),
                value: key,
            }],
        });
    }
    Ok(Escalation {
        id: fresh_id(),
        tasks,
    })
}

fn enrich_constraints(
    constraints: &[Constraint],
    artifacts: Option<&NodeArtifacts>,
) -> Vec<RuntimeConstraint> {
    constraints
        .iter()
        .map(|constraint| {
            let found: Option<&ConstraintArtifacts> =
                artifacts.and_then(|a| a.constraint(constraint.kind()));
            RuntimeConstraint {
                constraint: constraint.clone(),
                copy: found.and_then(|f| f.copy.clone()),
                validator: found.and_then(|f| f.validator.clone()),
                tests: found.and_then(|f| f.tests.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GeneratedPayload, GenerationResult};
    use crate::plan::UnitOfWork;
    use crate::schema::Constraint;

    fn prompt(path: NodePath, step_type: StepType, groups: Vec<Vec<&str>>) -> GenerationResult {
        GenerationResult {
            unit: UnitOfWork::step(path, step_type),
            payload: GeneratedPayload::Prompts(
                groups
                    .into_iter()
                    .map(|g| g.into_iter().map(str::to_string).collect())
                    .collect(),
            ),
        }
    }

    fn birth_date_schema() -> Vec<RootField> {
        let mut root = RootField::new("Birth Date", "date");
        let mut day = ChildField::new("Day", "number");
        day.constraints.push(Constraint::Range { min: 1.0, max: 31.0 });
        root.children.push(day);
        vec![root]
    }

    #[test]
    fn root_gets_six_steps_child_gets_three() {
        let schema = birth_date_schema();
        let root_path = NodePath::root("Birth Date");
        let day_path = root_path.child("Day");
        let store = ArtifactStore::build(&[
            prompt(root_path.clone(), StepType::Start, vec![vec!["When were you born?"]]),
            prompt(root_path.clone(), StepType::NoMatch, vec![vec!["Sorry, a date please."]]),
            prompt(day_path.clone(), StepType::Start, vec![vec!["Which day?"]]),
            prompt(day_path.clone(), StepType::NoMatch, vec![vec!["A day, 1 to 31."]]),
            prompt(day_path.clone(), StepType::NoInput, vec![vec!["Still there?"]]),
            // Present in input, but children never get a success step.
            prompt(day_path.clone(), StepType::Success, vec![vec!["Got the day."]]),
        ]);

        let assembler = TreeAssembler::new("runtime");
        let dialogue = assembler.assemble(&schema, &store).unwrap();

        let root = &dialogue.nodes[0];
        assert_eq!(root.steps.len(), 6);
        let populated = root
            .steps
            .iter()
            .filter(|s| !s.escalations.is_empty())
            .count();
        assert_eq!(populated, 2);

        let child = &root.children[0];
        assert_eq!(child.steps.len(), 3);
        assert!(child.step(StepType::Success).is_none());
        assert!(child.step(StepType::Confirmation).is_none());
        assert!(!child.step(StepType::Start).unwrap().escalations.is_empty());
        assert!(!child.step(StepType::NoMatch).unwrap().escalations.is_empty());
    }

    #[test]
    fn empty_store_yields_all_empty_steps_without_error() {
        let schema = vec![RootField::new("Name", "text")];
        let store = ArtifactStore::new();
        let dialogue = TreeAssembler::new("runtime")
            .assemble(&schema, &store)
            .unwrap();
        let root = &dialogue.nodes[0];
        assert_eq!(root.steps.len(), 6);
        assert!(root.steps.iter().all(|s| s.escalations.is_empty()));
        assert!(root.constraints.is_empty());
        assert!(dialogue.translations.is_empty());
    }

    #[test]
    fn every_task_key_resolves_in_the_table() {
        let schema = birth_date_schema();
        let root_path = NodePath::root("Birth Date");
        let store = ArtifactStore::build(&[prompt(
            root_path,
            StepType::Start,
            vec![vec!["When were you born?", "Your birth date?"], vec!["Date of birth?"]],
        )]);

        let dialogue = TreeAssembler::new("runtime").assemble(&schema, &store).unwrap();
        let start = dialogue.nodes[0].step(StepType::Start).unwrap();
        assert_eq!(start.escalations.len(), 2);
        assert_eq!(start.escalations[0].tasks.len(), 2);

        let mut seen = std::collections::HashSet::new();
        for escalation in &start.escalations {
            for task in &escalation.tasks {
                let key = task.text_key().unwrap();
                assert!(dialogue.translations.contains_key(key));
                assert!(seen.insert(key.to_string()), "shared key between tasks");
            }
        }
        assert_eq!(dialogue.translations.len(), 3);
    }

    #[test]
    fn task_templates_split_ask_and_say() {
        let schema = vec![RootField::new("Amount", "number")];
        let path = NodePath::root("Amount");
        let store = ArtifactStore::build(&[
            prompt(path.clone(), StepType::Start, vec![vec!["How much?"]]),
            prompt(path.clone(), StepType::Success, vec![vec!["All set."]]),
        ]);
        let dialogue = TreeAssembler::new("runtime").assemble(&schema, &store).unwrap();
        let root = &dialogue.nodes[0];
        let ask = &root.step(StepType::Start).unwrap().escalations[0].tasks[0];
        let say = &root.step(StepType::Success).unwrap().escalations[0].tasks[0];
        assert_eq!(ask.template, TaskTemplate::Ask);
        assert_eq!(say.template, TaskTemplate::Say);
    }

    #[test]
    fn child_artifacts_match_case_insensitively() {
        let schema = birth_date_schema();
        // Store keyed with a differently cased child label.
        let store = ArtifactStore::build(&[prompt(
            NodePath::root("Birth Date").child("DAY"),
            StepType::Start,
            vec![vec!["Which day?"]],
        )]);
        let dialogue = TreeAssembler::new("runtime").assemble(&schema, &store).unwrap();
        let child = &dialogue.nodes[0].children[0];
        assert!(!child.step(StepType::Start).unwrap().escalations.is_empty());
    }

    #[test]
    fn constraint_enrichment_merges_generated_artifacts() {
        let schema = birth_date_schema();
        let day_path = NodePath::root("Birth Date").child("Day");
        let results = [GenerationResult {
            unit: UnitOfWork {
                path: day_path,
                kind: crate::plan::UnitKind::ConstraintMessage {
                    kind: "range".to_string(),
                },
            },
            payload: GeneratedPayload::ConstraintCopy(ConstraintCopy {
                label: "Day of month".to_string(),
                payoff: "So we can pin the exact date".to_string(),
                ..Default::default()
            }),
        }];
        let store = ArtifactStore::build(&results);
        let dialogue = TreeAssembler::new("runtime").assemble(&schema, &store).unwrap();
        let constraint = &dialogue.nodes[0].children[0].constraints[0];
        assert_eq!(constraint.copy.as_ref().unwrap().label, "Day of month");
        assert!(constraint.validator.is_none());
    }

    #[test]
    fn reassembly_is_structurally_identical() {
        let schema = birth_date_schema();
        let root_path = NodePath::root("Birth Date");
        let store = ArtifactStore::build(&[
            prompt(root_path.clone(), StepType::Start, vec![vec!["a", "b"]]),
            prompt(root_path.child("Day"), StepType::NoInput, vec![vec!["c"]]),
        ]);

        let assembler = TreeAssembler::new("runtime");
        let first = assembler.assemble(&schema, &store).unwrap();
        let second = assembler.assemble(&schema, &store).unwrap();

        fn shape(node: &RuntimeNode) -> Vec<(StepType, Vec<usize>)> {
            node.steps
                .iter()
                .map(|s| {
                    (
                        s.step_type,
                        s.escalations.iter().map(|e| e.tasks.len()).collect(),
                    )
                })
                .collect()
        }

        assert_eq!(first.nodes.len(), second.nodes.len());
        assert_eq!(shape(&first.nodes[0]), shape(&second.nodes[0]));
        assert_eq!(
            shape(&first.nodes[0].children[0]),
            shape(&second.nodes[0].children[0])
        );
        assert_eq!(first.nodes[0].label, second.nodes[0].label);
        assert_eq!(first.translations.len(), second.translations.len());
        // Identifiers are fresh per assembly.
        assert_ne!(first.nodes[0].id, second.nodes[0].id);
    }
}
