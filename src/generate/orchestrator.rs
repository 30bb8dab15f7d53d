//! Generation orchestrator: a sequential, resumable state machine over a
//! generation plan.
//!
//! At most one unit is in flight at a time, and unit i+1 never starts
//! before unit i succeeded. Later units may depend on structural decisions
//! made by earlier ones; the ordering is the only protection, so it is
//! strict. Failure pins the cursor: the failed unit is re-attempted on the
//! next call, and already-succeeded units are never re-run.

use crate::error::{CompileError, GenerateError};
use crate::generate::{ContentGenerator, GenerationResult};
use crate::plan::{GenerationPlan, UnitOfWork};
use tracing::{debug, info, warn};

/// Orchestrator state, advanced one unit per `run_next_step` call.
#[derive(Debug, Clone)]
pub enum RunState {
    /// No unit attempted yet.
    Idle,
    /// The unit at this index is the next to run (or currently in flight).
    Running(usize),
    /// The unit at this index failed; the cursor did not advance.
    Failed { index: usize, error: GenerateError },
    /// Every unit in the plan produced a result.
    Done,
}

impl RunState {
    pub fn is_done(&self) -> bool {
        matches!(self, RunState::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunState::Failed { .. })
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub plan_id: String,
    pub total_units: usize,
    pub attempts: usize,
}

/// Sequential executor for one generation plan.
///
/// Owns the plan and the accumulated results for the duration of one
/// compilation run; results are appended in plan order.
pub struct GenerationRun {
    plan: GenerationPlan,
    results: Vec<GenerationResult>,
    state: RunState,
    attempts: usize,
}

impl GenerationRun {
    pub fn new(plan: GenerationPlan) -> Result<Self, CompileError> {
        plan.validate()?;
        let state = if plan.is_empty() {
            RunState::Done
        } else {
            RunState::Idle
        };
        Ok(Self {
            plan,
            results: Vec::new(),
            state,
            attempts: 0,
        })
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn plan(&self) -> &GenerationPlan {
        &self.plan
    }

    /// Results accumulated so far, in plan order.
    pub fn results(&self) -> &[GenerationResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<GenerationResult> {
        self.results
    }

    /// The unit the next `run_next_step` call will attempt.
    pub fn current_unit(&self) -> Option<&UnitOfWork> {
        self.plan.units.get(self.cursor())
    }

    /// Identity of the failed unit, for precise caller-side retry surfaces.
    pub fn failed_unit(&self) -> Option<(&UnitOfWork, &GenerateError)> {
        match &self.state {
            RunState::Failed { index, error } => {
                self.plan.units.get(*index).map(|unit| (unit, error))
            }
            _ => None,
        }
    }

    fn cursor(&self) -> usize {
        match &self.state {
            RunState::Idle => 0,
            RunState::Running(index) => *index,
            RunState::Failed { index, .. } => *index,
            RunState::Done => self.plan.units.len(),
        }
    }

    /// Attempt the unit at the cursor. On success the cursor advances; on
    /// failure it stays, so the same unit is re-attempted on the next call.
    pub async fn run_next_step<G: ContentGenerator + ?Sized>(
        &mut self,
        generator: &G,
    ) -> &RunState {
        if self.state.is_done() {
            return &self.state;
        }
        let index = self.cursor();
        // Cursor is always in bounds when not Done.
        let unit = self.plan.units[index].clone();
        self.state = RunState::Running(index);
        self.attempts += 1;

        debug!(plan_id = %self.plan.plan_id, %unit, index, "Generation unit started");
        match generator.generate(&unit).await {
            Ok(payload) => {
                self.results.push(GenerationResult { unit, payload });
                let next = index + 1;
                self.state = if next >= self.plan.units.len() {
                    info!(
                        plan_id = %self.plan.plan_id,
                        total_units = self.plan.total_units,
                        attempts = self.attempts,
                        "Generation run completed"
                    );
                    RunState::Done
                } else {
                    RunState::Running(next)
                };
            }
            Err(error) => {
                warn!(plan_id = %self.plan.plan_id, %unit, index, %error, "Generation unit failed");
                self.state = RunState::Failed { index, error };
            }
        }
        &self.state
    }

    /// Clear the failure flag and re-attempt the failed unit.
    ///
    /// Errors when the run is not in a failed state. Earlier successes are
    /// untouched.
    pub async fn retry<G: ContentGenerator + ?Sized>(
        &mut self,
        generator: &G,
    ) -> Result<&RunState, CompileError> {
        let index = match &self.state {
            RunState::Failed { index, .. } => *index,
            RunState::Done => return Err(CompileError::RunAlreadyDone),
            _ => return Err(CompileError::NothingToRetry),
        };
        self.state = RunState::Running(index);
        Ok(self.run_next_step(generator).await)
    }

    /// Drive the run until done or the first failure.
    ///
    /// There is no retry cap here; a bounded-retry policy belongs to the
    /// caller, who can `retry()` and call this again.
    pub async fn run_to_completion<G: ContentGenerator + ?Sized>(
        &mut self,
        generator: &G,
    ) -> Result<RunReport, CompileError> {
        loop {
            let state = self.run_next_step(generator).await.clone();
            match state {
                RunState::Done => {
                    return Ok(RunReport {
                        plan_id: self.plan.plan_id.clone(),
                        total_units: self.plan.total_units,
                        attempts: self.attempts,
                    });
                }
                RunState::Failed { index, error } => {
                    let unit = self.plan.units[index].clone();
                    return Err(CompileError::GenerationFailed {
                        unit,
                        source: error,
                    });
                }
                _ => {}
            }
        }
    }
}
