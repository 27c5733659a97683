//! Typed pipeline errors.
//!
//! Every stage returns `Result<T, PipelineError>` at its public boundary.
//! Internally, stages are free to use `anyhow::Result` and convert at the
//! edge via `?` (the `External` variant wraps any `anyhow::Error`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing data directory, unreadable artefact, bad configuration value.
    /// Exit 2. Not retried.
    #[error("config error: {0}")]
    Config(String),

    /// A stage was invoked out of order relative to `WorkflowState`.
    /// Exit 3. Not retried.
    #[error("phase error: current phase is '{current_phase}', this stage requires '{required_phase}' or later")]
    Phase {
        current_phase: String,
        required_phase: String,
    },

    /// A JSON artefact failed schema validation.
    /// Exit 4. Not retried.
    #[error("schema error at {field_path}: {message}")]
    Schema { field_path: String, message: String },

    /// Ingesting a batch would leave a cluster below the required coverage
    /// ratio while the caller claims the cluster is done.
    /// Exit 5. Not retried.
    #[error("coverage error: {have}/{required} members analysed (required for completion)")]
    Coverage { have: usize, required: usize },

    /// Transient or per-item external failure (HTTP, subprocess) that has
    /// already exhausted its retry budget, or a structural failure from a
    /// downstream crate that doesn't need its own variant.
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl PipelineError {
    /// Process exit code per spec.md §7.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 2,
            PipelineError::Phase { .. } => 3,
            PipelineError::Schema { .. } => 4,
            PipelineError::Coverage { .. } => 5,
            PipelineError::External(_) => 1,
        }
    }
}
