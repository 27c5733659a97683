//! Write-temp-then-rename persistence for single-writer JSON artefacts.
//!
//! Every stage that owns an artefact (state.json, persona_registry.json,
//! clusters.json, ...) writes it through [`write_json_atomic`] so that a
//! crash mid-write never corrupts the previous, valid artefact: the new
//! content lands in a `.tmp` sibling, is `fsync`'d, then renamed over the
//! original. A crash before the rename leaves the original untouched; a
//! crash after leaves a consistent new file. Mirrors the crash-safety
//! contract of `MemoryEventLog::overwrite` in the teacher codebase this
//! workspace was grown from.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory for {}", path.display()))?;
    }

    let tmp_path = tmp_sibling(path);
    let write_result: Result<()> = (|| {
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        let rendered = serde_json::to_string_pretty(value)?;
        file.write_all(rendered.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} into place at {}", tmp_path.display(), path.display()))?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing JSON from {}", path.display()))?;
    Ok(value)
}

pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(read_json(path)?))
}

/// Same write-temp-then-rename contract as [`write_json_atomic`], for the one
/// artefact that is not JSON: the embedding matrix's flat little-endian
/// `f32` bytes (spec.md §4.4 — "a flat binary contract, not a Rust-specific
/// serialization").
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory for {}", path.display()))?;
    }

    let tmp_path = tmp_sibling(path);
    let write_result: Result<()> = (|| {
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} into place at {}", tmp_path.display(), path.display()))?;
    Ok(())
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact.json".to_string());
    path.with_file_name(format!("{filename}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn round_trips_and_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.json");

        write_json_atomic(&path, &Sample { value: 7 }).unwrap();
        let loaded: Sample = read_json(&path).unwrap();
        assert_eq!(loaded, Sample { value: 7 });
        assert!(!path.with_file_name("artifact.json.tmp").exists());
    }

    #[test]
    fn missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let loaded: Option<Sample> = read_json_opt(&path).unwrap();
        assert!(loaded.is_none());
    }
}
