//! Legacy flat-result adapter.
//!
//! Older generation surfaces deliver results as a flat `{stepKey, payload}`
//! list: a direct step name for the root node (`startPrompt`,
//! `noMatchPrompts`, ...) or an encoded child-scoped key
//! `subData_<stepName>_<childLabel>_<ordinal>`. This adapter demultiplexes
//! that list into a regular [`ArtifactStore`], so the assembler has a
//! single input shape.
//!
//! Schemas are allowed to evolve after generation started: a child-scoped
//! key whose label matches no schema child is dropped, never an error.

use crate::artifact::ArtifactStore;
use crate::generate::EscalationGroup;
use crate::plan::StepType;
use crate::schema::RootField;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// One entry of the legacy flat result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatStepResult {
    pub step_key: String,
    pub payload: Value,
}

const SUB_DATA_PREFIX: &str = "subData_";

const DIRECT_STEP_KEYS: [(&str, StepType); 5] = [
    ("startPrompt", StepType::Start),
    ("noMatchPrompts", StepType::NoMatch),
    ("noInputPrompts", StepType::NoInput),
    ("confirmationPrompts", StepType::Confirmation),
    ("successPrompts", StepType::Success),
];

/// Demultiplex a flat result list into a store scoped to one root field.
pub fn demux_flat_results(field: &RootField, results: &[FlatStepResult]) -> ArtifactStore {
    let mut store = ArtifactStore::new();
    let root_path = field.path();

    for result in results {
        if let Some(rest) = result.step_key.strip_prefix(SUB_DATA_PREFIX) {
            let Some((step_type, child_label)) = parse_child_key(rest) else {
                warn!(step_key = %result.step_key, "Unparseable child-scoped step key; skipping");
                continue;
            };
            // Child names match case-insensitively; the store is keyed by
            // the schema child's canonical name so a root-level result is
            // never confused with a same-named sub-node result.
            let Some(child) = field.find_child(child_label) else {
                debug!(
                    step_key = %result.step_key,
                    child = child_label,
                    "Child not present in schema; dropping result"
                );
                continue;
            };
            if let Some(groups) = coerce_groups(&result.payload) {
                store.insert_prompts(child.path(field), step_type, groups);
            }
        } else if let Some(step_type) = direct_step_type(&result.step_key) {
            if let Some(groups) = coerce_groups(&result.payload) {
                store.insert_prompts(root_path.clone(), step_type, groups);
            }
        } else {
            warn!(step_key = %result.step_key, "Unknown step key; skipping");
        }
    }
    store
}

fn direct_step_type(key: &str) -> Option<StepType> {
    DIRECT_STEP_KEYS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, step_type)| *step_type)
}

/// Parse `<stepName>_<childLabel>_<ordinal>` (prefix already stripped).
/// The trailing ordinal is mandatory; the label may itself contain
/// underscores, so the step name is matched as a prefix and the ordinal
/// stripped from the end.
fn parse_child_key(rest: &str) -> Option<(StepType, &str)> {
    let (step_name, step_type) = DIRECT_STEP_KEYS
        .iter()
        .find(|(name, _)| {
            rest.strip_prefix(name)
                .is_some_and(|after| after.starts_with('_'))
        })
        .map(|(name, step_type)| (*name, *step_type))?;
    let after_step = &rest[step_name.len() + 1..];
    let (label, ordinal) = after_step.rsplit_once('_')?;
    if label.is_empty() || ordinal.parse::<u32>().is_err() {
        return None;
    }
    Some((step_type, label))
}

/// Coerce a loosely typed legacy payload into escalation groups.
///
/// Accepted shapes: array of arrays of strings (explicit groups), array of
/// strings (one escalation per phrasing), or a bare string. Anything else
/// is skipped.
fn coerce_groups(payload: &Value) -> Option<Vec<EscalationGroup>> {
    match payload {
        Value::String(s) => Some(vec![vec![s.clone()]]),
        Value::Array(items) => {
            let mut groups = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => groups.push(vec![s.clone()]),
                    Value::Array(inner) => {
                        let phrasings: Vec<String> = inner
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect();
                        groups.push(phrasings);
                    }
                    _ => {
                        warn!("Skipping non-string legacy prompt entry");
                    }
                }
            }
            Some(groups)
        }
        _ => {
            warn!("Skipping legacy payload with unsupported shape");
            None
        }
    }
}
