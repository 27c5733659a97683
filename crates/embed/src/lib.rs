//! Maps enriched message bodies to fixed-dimension float vectors with a
//! deterministic, offline sentence encoder (spec.md §4.4).
//!
//! Implemented with `fastembed` (ONNX, runs fully offline/local), default
//! model `BAAI/bge-small-en-v1.5` (384-dim). The model identifier and a hash
//! of its configuration are persisted in `index.json`'s header; if the
//! stored model id disagrees with the configured one, the whole matrix is
//! regenerated from scratch — no partial updates, per the spec's contract.
//! The dense matrix is written as raw little-endian `f32`, row-major,
//! directly via `f32::to_le_bytes` since the file format is an explicit flat
//! binary contract, not a Rust-specific serialization.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use voicecast_config::EmbedConfig;
use voicecast_core::atomic_io::{read_bytes, read_json_opt, write_bytes_atomic, write_json_atomic};
use voicecast_core::ids::MessageId;

fn schema_version_v1() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    pub model_id: String,
    pub model_hash: String,
    pub dimension: usize,
    pub ids: Vec<MessageId>,
    #[serde(default = "schema_version_v1")]
    pub schema_version: u32,
}

pub struct EmbeddingMatrix {
    pub index: EmbeddingIndex,
    pub rows: Vec<Vec<f32>>,
}

impl EmbeddingMatrix {
    /// Every embedding id appears exactly once in the index, at the same
    /// position as its vector row (spec.md §8 invariant 3).
    pub fn row_for(&self, id: &MessageId) -> Option<&[f32]> {
        let pos = self.index.ids.iter().position(|i| i == id)?;
        self.rows.get(pos).map(Vec::as_slice)
    }
}

fn model_hash(model_id: &str, dimension: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model_id.as_bytes());
    hasher.update(dimension.to_le_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn resolve_model(model_id: &str) -> Result<EmbeddingModel> {
    match model_id {
        "BAAI/bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "BAAI/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        other => anyhow::bail!("unsupported embedding model id: {other}"),
    }
}

/// Re-embeds `messages` (id, quote-stripped body) from scratch and writes
/// both artefacts (`matrix.vec`, `index.json`) atomically.
pub fn embed_and_persist(
    messages: &[(MessageId, String)],
    cfg: &EmbedConfig,
    matrix_path: &Path,
    index_path: &Path,
) -> Result<EmbeddingMatrix> {
    let matrix = embed_messages(messages, cfg)?;
    persist(&matrix, matrix_path, index_path)?;
    Ok(matrix)
}

pub fn embed_messages(messages: &[(MessageId, String)], cfg: &EmbedConfig) -> Result<EmbeddingMatrix> {
    let model = resolve_model(&cfg.model_id)?;
    let init_options = InitOptions::new(model).with_show_download_progress(false);
    let encoder = TextEmbedding::try_new(init_options)
        .with_context(|| format!("loading embedding model {}", cfg.model_id))?;

    let texts: Vec<String> = messages.iter().map(|(_, body)| body.clone()).collect();
    let embeddings = encoder
        .embed(texts, Some(cfg.batch_size))
        .context("running sentence encoder")?;

    let ids: Vec<MessageId> = messages.iter().map(|(id, _)| id.clone()).collect();
    info!(count = ids.len(), model = %cfg.model_id, "embedded messages");

    Ok(EmbeddingMatrix {
        index: EmbeddingIndex {
            model_id: cfg.model_id.clone(),
            model_hash: model_hash(&cfg.model_id, cfg.dimension),
            dimension: cfg.dimension,
            ids,
            schema_version: 1,
        },
        rows: embeddings,
    })
}

/// Loads the persisted matrix, regenerating it from scratch if the model
/// identifier in `index.json` disagrees with `cfg.model_id` (spec.md §4.4).
pub fn load_or_regenerate(
    messages: &[(MessageId, String)],
    cfg: &EmbedConfig,
    matrix_path: &Path,
    index_path: &Path,
) -> Result<EmbeddingMatrix> {
    if let Some(index) = read_json_opt::<EmbeddingIndex>(index_path)? {
        if index.model_id == cfg.model_id && index.dimension == cfg.dimension {
            let rows = load_matrix_rows(matrix_path, index.dimension, index.ids.len())?;
            return Ok(EmbeddingMatrix { index, rows });
        }
        info!(old_model = %index.model_id, new_model = %cfg.model_id, "embedding model changed, regenerating matrix");
    }
    embed_and_persist(messages, cfg, matrix_path, index_path)
}

fn persist(matrix: &EmbeddingMatrix, matrix_path: &Path, index_path: &Path) -> Result<()> {
    let mut bytes = Vec::with_capacity(matrix.rows.len() * matrix.index.dimension * 4);
    for row in &matrix.rows {
        for value in row {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    write_bytes_atomic(matrix_path, &bytes)?;
    write_json_atomic(index_path, &matrix.index)?;
    Ok(())
}

fn load_matrix_rows(matrix_path: &Path, dimension: usize, row_count: usize) -> Result<Vec<Vec<f32>>> {
    let bytes = read_bytes(matrix_path)?;
    let expected = row_count * dimension * 4;
    anyhow::ensure!(
        bytes.len() == expected,
        "matrix.vec has {} bytes, expected {} for {} rows of dimension {}",
        bytes.len(),
        expected,
        row_count,
        dimension
    );
    let mut rows = Vec::with_capacity(row_count);
    for row_idx in 0..row_count {
        let mut row = Vec::with_capacity(dimension);
        for col_idx in 0..dimension {
            let offset = (row_idx * dimension + col_idx) * 4;
            let bytes4: [u8; 4] = bytes[offset..offset + 4].try_into().unwrap();
            row.push(f32::from_le_bytes(bytes4));
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_bytes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let matrix_path = dir.path().join("matrix.vec");
        let index_path = dir.path().join("index.json");

        let index = EmbeddingIndex {
            model_id: "BAAI/bge-small-en-v1.5".to_string(),
            model_hash: model_hash("BAAI/bge-small-en-v1.5", 3),
            dimension: 3,
            ids: vec![MessageId::from("a"), MessageId::from("b")],
            schema_version: 1,
        };
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let matrix = EmbeddingMatrix { index, rows };
        persist(&matrix, &matrix_path, &index_path).unwrap();

        let loaded_index: EmbeddingIndex = voicecast_core::atomic_io::read_json(&index_path).unwrap();
        let loaded_rows = load_matrix_rows(&matrix_path, loaded_index.dimension, loaded_index.ids.len()).unwrap();
        assert_eq!(loaded_rows, matrix.rows);
    }

    #[test]
    fn row_count_matches_index_length() {
        let index = EmbeddingIndex {
            model_id: "m".to_string(),
            model_hash: "h".to_string(),
            dimension: 2,
            ids: vec![MessageId::from("a"), MessageId::from("b")],
            schema_version: 1,
        };
        let rows = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        let matrix = EmbeddingMatrix { index, rows };
        assert_eq!(matrix.rows.len(), matrix.index.ids.len());
        assert!(matrix.row_for(&MessageId::from("a")).is_some());
        assert!(matrix.row_for(&MessageId::from("missing")).is_none());
    }
}
