//! Property-based tests for planning and assembly invariants.

use parley::artifact::ArtifactStore;
use parley::assemble::{RuntimeNode, TreeAssembler};
use parley::generate::{GeneratedPayload, GenerationResult};
use parley::plan::{build_plan, StepType, UnitKind};
use parley::schema::{ChildField, Constraint, RootField};
use proptest::prelude::*;
use std::collections::HashSet;

fn constraint_strategy() -> impl Strategy<Value = Constraint> {
    prop_oneof![
        Just(Constraint::Required),
        (0.0..100.0f64, 100.0..200.0f64).prop_map(|(min, max)| Constraint::Range { min, max }),
        (0usize..5, 5usize..20).prop_map(|(min, max)| Constraint::Length { min, max }),
        "[a-z]{1,8}".prop_map(|regex| Constraint::Pattern { regex }),
    ]
}

/// Random two-tier schema forests. Root names include the path separator to
/// exercise label escaping.
fn schema_strategy() -> impl Strategy<Value = Vec<RootField>> {
    prop::collection::vec(
        (
            prop::collection::vec(constraint_strategy(), 0..4),
            prop::collection::vec(prop::collection::vec(constraint_strategy(), 0..3), 0..3),
        ),
        0..4,
    )
    .prop_map(|roots| {
        roots
            .into_iter()
            .enumerate()
            .map(|(i, (constraints, children))| {
                let mut root = RootField::new(format!("field.{i}"), "text");
                root.constraints = constraints;
                root.children = children
                    .into_iter()
                    .enumerate()
                    .map(|(j, child_constraints)| {
                        let mut child = ChildField::new(format!("part {j}"), "number");
                        child.constraints = child_constraints;
                        child
                    })
                    .collect();
                root
            })
            .collect()
    })
}

fn countable(constraints: &[Constraint]) -> usize {
    constraints.iter().filter(|c| c.is_countable()).count()
}

/// Simulate a complete generation run without a generator: one payload per
/// planned unit, in plan order.
fn simulate_results(fields: &[RootField]) -> Vec<GenerationResult> {
    build_plan(fields)
        .units
        .into_iter()
        .enumerate()
        .map(|(i, unit)| {
            let payload = match &unit.kind {
                UnitKind::Step { step_type } => GeneratedPayload::Prompts(vec![
                    vec![format!("{} v1 #{i}", step_type.as_str()), format!("alt #{i}")],
                    vec![format!("escalated #{i}")],
                ]),
                UnitKind::ConstraintMessage { .. } => {
                    GeneratedPayload::ConstraintCopy(Default::default())
                }
                UnitKind::ValidatorCode { .. } => GeneratedPayload::Validator(Default::default()),
                UnitKind::TestSet { .. } => GeneratedPayload::TestSet(Vec::new()),
            };
            GenerationResult { unit, payload }
        })
        .collect()
}

fn visit<'a>(nodes: &'a [RuntimeNode], f: &mut impl FnMut(&'a RuntimeNode, bool)) {
    for node in nodes {
        f(node, true);
        for child in &node.children {
            f(child, false);
        }
    }
}

#[test]
fn plan_unit_count_matches_formula() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&schema_strategy(), |fields| {
            let plan = build_plan(&fields);
            let expected: usize = fields
                .iter()
                .map(|root| {
                    6 + 3 * countable(&root.constraints)
                        + root
                            .children
                            .iter()
                            .map(|c| 3 + 3 * countable(&c.constraints))
                            .sum::<usize>()
                })
                .sum();
            assert_eq!(plan.total_units, expected);
            Ok(())
        })
        .unwrap();
}

#[test]
fn children_never_get_confirmation_or_success_steps() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&schema_strategy(), |fields| {
            let store = ArtifactStore::build(&simulate_results(&fields));
            let dialogue = TreeAssembler::new("runtime").assemble(&fields, &store).unwrap();
            visit(&dialogue.nodes, &mut |node, is_root| {
                let step_types: Vec<StepType> =
                    node.steps.iter().map(|s| s.step_type).collect();
                if is_root {
                    assert_eq!(step_types, StepType::ROOT_STEPS.to_vec());
                } else {
                    assert_eq!(step_types, StepType::CHILD_STEPS.to_vec());
                }
            });
            Ok(())
        })
        .unwrap();
}

#[test]
fn translation_keys_are_globally_unique_and_resolvable() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&schema_strategy(), |fields| {
            let store = ArtifactStore::build(&simulate_results(&fields));
            let dialogue = TreeAssembler::new("runtime").assemble(&fields, &store).unwrap();

            let mut seen = HashSet::new();
            let mut task_count = 0usize;
            visit(&dialogue.nodes, &mut |node, _| {
                for step in &node.steps {
                    for escalation in &step.escalations {
                        for task in &escalation.tasks {
                            task_count += 1;
                            let key = task.text_key().expect("text parameter present");
                            assert!(dialogue.translations.contains_key(key));
                            assert!(seen.insert(key.to_string()), "duplicate key {key}");
                        }
                    }
                }
            });
            assert_eq!(task_count, dialogue.translations.len());
            Ok(())
        })
        .unwrap();
}

#[test]
fn reassembly_is_shape_deterministic() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&schema_strategy(), |fields| {
            let store = ArtifactStore::build(&simulate_results(&fields));
            let assembler = TreeAssembler::new("runtime");
            let first = assembler.assemble(&fields, &store).unwrap();
            let second = assembler.assemble(&fields, &store).unwrap();

            fn shape(nodes: &[RuntimeNode]) -> Vec<(String, Vec<(StepType, Vec<usize>)>, usize)> {
                nodes
                    .iter()
                    .map(|n| {
                        (
                            n.label.clone(),
                            n.steps
                                .iter()
                                .map(|s| {
                                    (
                                        s.step_type,
                                        s.escalations.iter().map(|e| e.tasks.len()).collect(),
                                    )
                                })
                                .collect(),
                            n.children.len(),
                        )
                    })
                    .collect()
            }

            assert_eq!(shape(&first.nodes), shape(&second.nodes));
            for (a, b) in first.nodes.iter().zip(&second.nodes) {
                assert_eq!(shape(&a.children), shape(&b.children));
            }
            assert_eq!(first.translations.len(), second.translations.len());
            Ok(())
        })
        .unwrap();
}
