//! Lists and persists the OpenRouter model used by the validator (spec.md
//! §4.9: "model listing and selection are explicit CLI steps ... to avoid
//! silently using an unavailable model"). The choice is persisted to a
//! sibling file next to the validation artefacts, not baked into
//! [`voicecast_config::ValidationConfig`], so switching models never
//! requires a config edit.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use voicecast_core::atomic_io::{read_json_opt, write_json_atomic};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedModel {
    pub model_id: String,
}

/// Delegates to the llm crate's OpenRouter catalogue lookup (falls back to
/// its built-in model list when the API is unreachable).
pub async fn list_models() -> Result<Vec<String>> {
    voicecast_llm::list_openrouter_models().await
}

pub fn load_selected_model(path: &Path) -> Result<Option<SelectedModel>> {
    read_json_opt(path)
}

pub fn persist_selected_model(path: &Path, model_id: &str) -> Result<()> {
    write_json_atomic(path, &SelectedModel { model_id: model_id.to_string() })
}
