use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Preprocessing,
    Analysis,
    Validation,
    LinkedIn,
    Generation,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Preprocessing => "preprocessing",
            Phase::Analysis => "analysis",
            Phase::Validation => "validation",
            Phase::LinkedIn => "linkedin",
            Phase::Generation => "generation",
            Phase::Complete => "complete",
        }
    }

    /// Is `from -> self` a legal transition under the DAG in spec.md §4.1?
    ///
    /// `setup -> preprocessing -> analysis -> (validation <-> analysis) ->
    /// (linkedin) -> generation -> complete`, with linkedin reachable as a
    /// sidestep from analysis or validation since it is an optional branch.
    pub fn legal_transition(from: Phase, to: Phase) -> bool {
        use Phase::*;
        if from == to {
            return true; // idempotent re-run of the current phase
        }
        matches!(
            (from, to),
            (Setup, Preprocessing)
                | (Preprocessing, Analysis)
                | (Analysis, Validation)
                | (Validation, Analysis)
                | (Analysis, LinkedIn)
                | (Validation, LinkedIn)
                | (LinkedIn, Analysis)
                | (LinkedIn, Validation)
                | (Analysis, Generation)
                | (Validation, Generation)
                | (LinkedIn, Generation)
                | (Generation, Complete)
        )
    }

    /// A stage may run if the current phase is its own phase or strictly
    /// earlier in the canonical ordering (idempotent re-run rule, §4.1).
    pub fn may_run(current: Phase, stage: Phase) -> bool {
        current <= stage
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhaseMeta {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub current_phase: Phase,
    #[serde(default)]
    pub phases: BTreeMap<String, PhaseMeta>,
    pub preprocessing_complete: bool,
    pub ready_for_generation: bool,
    pub last_update: DateTime<Utc>,
    pub data_dir: std::path::PathBuf,
}

impl WorkflowState {
    pub fn new(data_dir: std::path::PathBuf) -> Self {
        Self {
            current_phase: Phase::Setup,
            phases: BTreeMap::new(),
            preprocessing_complete: false,
            ready_for_generation: false,
            last_update: Utc::now(),
            data_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_happy_path_is_legal() {
        assert!(Phase::legal_transition(Phase::Setup, Phase::Preprocessing));
        assert!(Phase::legal_transition(Phase::Preprocessing, Phase::Analysis));
        assert!(Phase::legal_transition(Phase::Analysis, Phase::Validation));
        assert!(Phase::legal_transition(Phase::Validation, Phase::Generation));
        assert!(Phase::legal_transition(Phase::Generation, Phase::Complete));
    }

    #[test]
    fn validation_can_sidestep_back_to_analysis() {
        assert!(Phase::legal_transition(Phase::Validation, Phase::Analysis));
    }

    #[test]
    fn skipping_stages_is_illegal() {
        assert!(!Phase::legal_transition(Phase::Setup, Phase::Analysis));
        assert!(!Phase::legal_transition(Phase::Setup, Phase::Complete));
    }

    #[test]
    fn re_running_the_current_phase_is_legal() {
        assert!(Phase::legal_transition(Phase::Analysis, Phase::Analysis));
    }

    #[test]
    fn may_run_allows_current_or_earlier_stage() {
        assert!(Phase::may_run(Phase::Analysis, Phase::Analysis));
        assert!(Phase::may_run(Phase::Setup, Phase::Analysis));
        assert!(!Phase::may_run(Phase::Analysis, Phase::Preprocessing));
    }
}
