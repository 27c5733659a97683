//! Persists and transitions the single [`WorkflowState`] record at
//! `state.json` (spec.md §4.1).
//!
//! The phase DAG is a small, fixed graph, so it is encoded as an explicit
//! `Phase::legal_transition` match in `voicecast-core` rather than a generic
//! graph library — the same reasoning the teacher applies to its own fixed
//! memory-tier transitions.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use voicecast_core::atomic_io::{read_json_opt, write_json_atomic};
use voicecast_core::model::{Phase, PhaseMeta, WorkflowState};
use voicecast_core::PipelineError;

pub struct StateStore {
    state_file: std::path::PathBuf,
    data_dir: std::path::PathBuf,
}

impl StateStore {
    pub fn new(data_dir: impl Into<std::path::PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            state_file: data_dir.join("state.json"),
            data_dir,
        }
    }

    /// Create `state.json` with phase `setup` if absent; fail if present.
    pub fn init(&self) -> Result<WorkflowState, PipelineError> {
        if self.state_file.exists() {
            return Err(PipelineError::Config(format!(
                "state already initialised at {}",
                self.state_file.display()
            )));
        }
        let state = WorkflowState::new(self.data_dir.clone());
        self.persist(&state)?;
        info!(path = %self.state_file.display(), "initialised workflow state");
        Ok(state)
    }

    /// Current record; missing file is treated as a fresh `setup`-phase
    /// state rather than an error (spec.md §4.1).
    pub fn load(&self) -> Result<WorkflowState, PipelineError> {
        let loaded: Option<WorkflowState> = read_json_opt(&self.state_file)
            .map_err(|e| PipelineError::Config(format!("reading {}: {e:#}", self.state_file.display())))?;
        Ok(loaded.unwrap_or_else(|| WorkflowState::new(self.data_dir.clone())))
    }

    pub fn get_phase(&self) -> Result<Phase, PipelineError> {
        Ok(self.load()?.current_phase)
    }

    /// Atomically transition to `to_phase`, rejecting illegal transitions.
    pub fn transition(
        &self,
        to_phase: Phase,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<WorkflowState, PipelineError> {
        let mut state = self.load()?;
        let from = state.current_phase;

        if !Phase::legal_transition(from, to_phase) {
            return Err(PipelineError::Phase {
                current_phase: from.as_str().to_string(),
                required_phase: to_phase.as_str().to_string(),
            });
        }

        let now = Utc::now();
        let entry = state.phases.entry(to_phase.as_str().to_string()).or_default();
        if entry.started_at.is_none() {
            entry.started_at = Some(now);
        }
        entry.metadata.extend(metadata);

        state.current_phase = to_phase;
        state.last_update = now;
        state.preprocessing_complete = state.phases.contains_key(Phase::Analysis.as_str())
            || to_phase >= Phase::Analysis;
        state.ready_for_generation = to_phase >= Phase::Generation;

        self.persist(&state)?;
        info!(from = from.as_str(), to = to_phase.as_str(), "workflow phase transition");
        Ok(state)
    }

    /// Mark `phase` complete (sets `completed_at`), merging `metadata` into
    /// its `PhaseMeta` without changing `current_phase`.
    pub fn mark_complete(
        &self,
        phase: Phase,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<WorkflowState, PipelineError> {
        let mut state = self.load()?;
        let entry: &mut PhaseMeta = state.phases.entry(phase.as_str().to_string()).or_default();
        entry.completed_at = Some(Utc::now());
        entry.metadata.extend(metadata);
        state.last_update = Utc::now();
        self.persist(&state)?;
        Ok(state)
    }

    /// Whether `stage` may run given `current` — the current phase or any
    /// strictly earlier phase (idempotent re-run rule, spec.md §4.1).
    pub fn may_run(&self, stage: Phase) -> Result<bool, PipelineError> {
        Ok(Phase::may_run(self.get_phase()?, stage))
    }

    /// Require that `stage` may run, returning a typed `PhaseError`
    /// otherwise (spec.md §4.1, §7).
    pub fn require_phase(&self, stage: Phase) -> Result<WorkflowState, PipelineError> {
        let state = self.load()?;
        if !Phase::may_run(state.current_phase, stage) {
            warn!(current = state.current_phase.as_str(), required = stage.as_str(), "stage invoked out of order");
            return Err(PipelineError::Phase {
                current_phase: state.current_phase.as_str().to_string(),
                required_phase: stage.as_str().to_string(),
            });
        }
        Ok(state)
    }

    fn persist(&self, state: &WorkflowState) -> Result<(), PipelineError> {
        write_json_atomic(&self.state_file, state)
            .with_context(|| format!("writing {}", self.state_file.display()))
            .map_err(PipelineError::from)
    }
}

pub fn state_store_for(data_dir: impl AsRef<Path>) -> StateStore {
    StateStore::new(data_dir.as_ref().to_path_buf())
}
