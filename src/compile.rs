//! Single compile entry point: plan, run, aggregate, assemble.
//!
//! Callers that need resumable control (retry a failed unit, merge a
//! partial re-plan) drive [`GenerationRun`] themselves; this facade covers
//! the straight-through case.

use crate::artifact::ArtifactStore;
use crate::assemble::{CompiledDialogue, TreeAssembler};
use crate::config::ParleyConfig;
use crate::error::CompileError;
use crate::generate::{ContentGenerator, GenerationRun, RunReport};
use crate::plan::build_plan;
use crate::schema::RootField;
use tracing::info;

/// Compiles schema forests into runtime dialogue trees.
pub struct Compiler {
    config: ParleyConfig,
}

impl Compiler {
    pub fn new(config: ParleyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// Plan, drive the generator to completion, and assemble.
    ///
    /// Generation failures surface with the failed unit's identity; the
    /// caller can resume by driving a [`GenerationRun`] directly instead.
    pub async fn compile<G: ContentGenerator + ?Sized>(
        &self,
        fields: &[RootField],
        generator: &G,
    ) -> Result<CompiledDialogue, CompileError> {
        let plan = build_plan(fields);
        let mut run = GenerationRun::new(plan)?;
        let report = run.run_to_completion(generator).await?;
        self.log_report(&report);
        self.assemble_results(fields, &run)
    }

    /// Assemble from a finished (or partially finished) run. Missing
    /// results degrade to empty steps; they never fail assembly.
    pub fn assemble_results(
        &self,
        fields: &[RootField],
        run: &GenerationRun,
    ) -> Result<CompiledDialogue, CompileError> {
        let store = ArtifactStore::build(run.results());
        TreeAssembler::new(&self.config.key_namespace).assemble(fields, &store)
    }

    fn log_report(&self, report: &RunReport) {
        info!(
            plan_id = %report.plan_id,
            total_units = report.total_units,
            attempts = report.attempts,
            "Generation run finished"
        );
    }
}
