//! The on-disk layout of a voicecast data directory (spec.md §6).
//!
//! Every stage receives a [`DataPaths`] rather than looking up
//! `VOICECAST_DATA` itself — keeps stages testable against a `tempfile`
//! directory without touching the environment.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve from `VOICECAST_DATA`, defaulting to `~/Documents/voicecast`.
    pub fn from_env() -> Self {
        if let Ok(custom) = std::env::var("VOICECAST_DATA") {
            return Self::new(custom);
        }
        let home = dirs_home();
        Self::new(home.join("Documents").join("voicecast"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn raw_samples_dir(&self) -> PathBuf {
        self.root.join("raw_samples")
    }

    pub fn filtered_samples_dir(&self) -> PathBuf {
        self.root.join("filtered_samples")
    }

    pub fn enriched_samples_dir(&self) -> PathBuf {
        self.root.join("enriched_samples")
    }

    pub fn embeddings_dir(&self) -> PathBuf {
        self.root.join("embeddings")
    }

    pub fn embedding_matrix_file(&self) -> PathBuf {
        self.embeddings_dir().join("matrix.vec")
    }

    pub fn embedding_index_file(&self) -> PathBuf {
        self.embeddings_dir().join("index.json")
    }

    pub fn clusters_file(&self) -> PathBuf {
        self.root.join("clusters.json")
    }

    pub fn batches_dir(&self) -> PathBuf {
        self.root.join("batches")
    }

    pub fn batch_file(&self, n: u32) -> PathBuf {
        self.batches_dir().join(format!("batch_{n:03}.json"))
    }

    pub fn persona_registry_file(&self) -> PathBuf {
        self.root.join("persona_registry.json")
    }

    pub fn linkedin_persona_file(&self) -> PathBuf {
        self.root.join("linkedin_persona.json")
    }

    pub fn validation_set_dir(&self) -> PathBuf {
        self.root.join("validation_set")
    }

    pub fn validation_pairs_file(&self) -> PathBuf {
        self.root.join("validation_pairs.json")
    }

    pub fn validation_results_file(&self) -> PathBuf {
        self.root.join("validation_results.json")
    }

    pub fn validation_report_file(&self) -> PathBuf {
        self.root.join("validation_report.json")
    }

    pub fn validation_feedback_file(&self) -> PathBuf {
        self.root.join("validation_feedback.json")
    }

    pub fn openrouter_model_file(&self) -> PathBuf {
        self.root.join("openrouter_model.json")
    }
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
