//! Content generation: the external collaborator boundary and the
//! sequential orchestrator that drives it.
//!
//! The transport behind [`ContentGenerator`] (prompt wording, HTTP, auth)
//! is out of scope; the compiler only calls and awaits it, one unit at a
//! time.

pub mod orchestrator;

use crate::error::GenerateError;
use crate::plan::UnitOfWork;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use orchestrator::{GenerationRun, RunReport, RunState};

/// One escalation attempt-group: alternative phrasings tried in sequence.
pub type EscalationGroup = Vec<String>;

/// Generated copy for one constraint kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintCopy {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub payoff: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
}

/// One generated test case for a constraint validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseSpec {
    pub input: serde_json::Value,
    pub should_pass: bool,
}

/// Generated validator code, keyed by target language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorArtifact {
    pub code: BTreeMap<String, String>,
    #[serde(default)]
    pub test_cases: Vec<TestCaseSpec>,
}

/// Payload returned by the generator; shape varies by unit kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum GeneratedPayload {
    /// Ordered escalation groups for a step unit.
    Prompts(Vec<EscalationGroup>),
    /// Copy for a constraint-message unit.
    ConstraintCopy(ConstraintCopy),
    /// Code for a validator unit.
    Validator(ValidatorArtifact),
    /// Cases for a test-set unit.
    TestSet(Vec<TestCaseSpec>),
}

/// One completed unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub unit: UnitOfWork,
    pub payload: GeneratedPayload,
}

/// External content-generation collaborator.
///
/// Implementations may fail with transport or validation errors; the
/// orchestrator never retries implicitly.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, unit: &UnitOfWork) -> Result<GeneratedPayload, GenerateError>;
}
