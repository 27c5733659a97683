//! `RawMessageSource`: the seam between the pipeline and the Gmail/LinkedIn
//! scrapers explicitly out of scope for this repository (spec.md §2, Non-goal
//! 1). Two implementations live here — an in-memory mock for tests, and a
//! JSON-file-backed reader for whatever an external scraper/MCP server drops
//! onto disk — plus the holdout split that produces `validation_set/`.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use voicecast_core::atomic_io::{read_json, write_json_atomic};
use voicecast_core::ids::MessageId;
use voicecast_core::model::{RawEmail, RawLinkedInPost};

/// Delivers raw messages. Implementations are expected to be cheap/local —
/// the actual network fetch against Gmail/LinkedIn happens upstream of this
/// trait, outside this repository's scope.
pub trait RawMessageSource {
    fn fetch_emails(&self) -> Result<Vec<RawEmail>>;
    fn fetch_linkedin_posts(&self) -> Result<Vec<RawLinkedInPost>>;
}

/// An in-memory source for tests and local experimentation.
#[derive(Debug, Clone, Default)]
pub struct MockMessageSource {
    pub emails: Vec<RawEmail>,
    pub linkedin_posts: Vec<RawLinkedInPost>,
}

impl RawMessageSource for MockMessageSource {
    fn fetch_emails(&self) -> Result<Vec<RawEmail>> {
        Ok(self.emails.clone())
    }

    fn fetch_linkedin_posts(&self) -> Result<Vec<RawLinkedInPost>> {
        Ok(self.linkedin_posts.clone())
    }
}

/// Reads one JSON array per message kind from a directory populated by an
/// external scraper: `emails.json` (`Vec<RawEmail>`) and `linkedin_posts.json`
/// (`Vec<RawLinkedInPost>`). Either file may be absent, in which case that
/// kind yields an empty set.
pub struct JsonFileMessageSource {
    pub emails_path: std::path::PathBuf,
    pub linkedin_posts_path: std::path::PathBuf,
}

impl JsonFileMessageSource {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            emails_path: dir.join("emails.json"),
            linkedin_posts_path: dir.join("linkedin_posts.json"),
        }
    }
}

impl RawMessageSource for JsonFileMessageSource {
    fn fetch_emails(&self) -> Result<Vec<RawEmail>> {
        if !self.emails_path.exists() {
            return Ok(Vec::new());
        }
        read_json(&self.emails_path).with_context(|| format!("reading {}", self.emails_path.display()))
    }

    fn fetch_linkedin_posts(&self) -> Result<Vec<RawLinkedInPost>> {
        if !self.linkedin_posts_path.exists() {
            return Ok(Vec::new());
        }
        read_json(&self.linkedin_posts_path)
            .with_context(|| format!("reading {}", self.linkedin_posts_path.display()))
    }
}

/// The result of splitting a fetched corpus into a training set (persisted
/// to `raw_samples/`) and a held-out validation set (`validation_set/`),
/// disjoint by message id (spec.md §8 invariant 8).
pub struct HoldoutSplit {
    pub training: Vec<RawEmail>,
    pub held_out: Vec<RawEmail>,
}

/// Splits `emails` by a fixed random seed so the split is reproducible
/// across runs given the same corpus and ratio, moving `ratio` of the
/// corpus into the held-out set. Disjoint by construction: every email is
/// assigned to exactly one side by index.
pub fn holdout_split(emails: Vec<RawEmail>, ratio: f64, seed: u64) -> HoldoutSplit {
    let mut indices: Vec<usize> = (0..emails.len()).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let held_out_count = ((emails.len() as f64) * ratio).round() as usize;
    let held_out_indices: HashSet<usize> = indices.into_iter().take(held_out_count).collect();

    let mut training = Vec::with_capacity(emails.len() - held_out_count);
    let mut held_out = Vec::with_capacity(held_out_count);
    for (idx, email) in emails.into_iter().enumerate() {
        if held_out_indices.contains(&idx) {
            held_out.push(email);
        } else {
            training.push(email);
        }
    }

    info!(training = training.len(), held_out = held_out.len(), "split corpus for holdout validation");
    HoldoutSplit { training, held_out }
}

/// Persists the two sides of a [`HoldoutSplit`] to `raw_samples/emails.json`
/// and `validation_set/emails.json` respectively.
pub fn persist_split(split: &HoldoutSplit, raw_samples_dir: &Path, validation_set_dir: &Path) -> Result<()> {
    write_json_atomic(&raw_samples_dir.join("emails.json"), &split.training)?;
    write_json_atomic(&validation_set_dir.join("emails.json"), &split.held_out)?;
    Ok(())
}

/// Every id in `held_out` is absent from `training` (spec.md §8 invariant 8).
pub fn assert_disjoint(training: &[RawEmail], held_out: &[RawEmail]) -> bool {
    let training_ids: HashSet<&MessageId> = training.iter().map(|e| &e.id).collect();
    held_out.iter().all(|e| !training_ids.contains(&e.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn email(n: u32) -> RawEmail {
        RawEmail {
            id: MessageId::from(format!("email-{n}")),
            sender: "me@example.com".to_string(),
            to: vec!["a@example.com".to_string()],
            cc: vec![],
            subject: format!("subject {n}"),
            body: format!("body {n}"),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            thread_id: None,
            headers: Default::default(),
        }
    }

    #[test]
    fn holdout_split_is_disjoint_and_roughly_the_right_size() {
        let emails: Vec<RawEmail> = (0..100).map(email).collect();
        let split = holdout_split(emails, 0.15, 42);
        assert_eq!(split.training.len() + split.held_out.len(), 100);
        assert_eq!(split.held_out.len(), 15);
        assert!(assert_disjoint(&split.training, &split.held_out));
    }

    #[test]
    fn holdout_split_is_deterministic_for_a_fixed_seed() {
        let a = holdout_split((0..40).map(email).collect(), 0.15, 7);
        let b = holdout_split((0..40).map(email).collect(), 0.15, 7);
        let ids_a: Vec<&MessageId> = a.held_out.iter().map(|e| &e.id).collect();
        let ids_b: Vec<&MessageId> = b.held_out.iter().map(|e| &e.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn mock_source_round_trips_supplied_messages() {
        let source = MockMessageSource {
            emails: vec![email(1)],
            linkedin_posts: vec![],
        };
        assert_eq!(source.fetch_emails().unwrap().len(), 1);
        assert!(source.fetch_linkedin_posts().unwrap().is_empty());
    }

    #[test]
    fn json_file_source_reads_persisted_split() {
        let dir = tempfile::tempdir().unwrap();
        let emails: Vec<RawEmail> = (0..10).map(email).collect();
        let split = holdout_split(emails, 0.2, 1);
        let raw_dir = dir.path().join("raw_samples");
        let val_dir = dir.path().join("validation_set");
        std::fs::create_dir_all(&raw_dir).unwrap();
        std::fs::create_dir_all(&val_dir).unwrap();
        persist_split(&split, &raw_dir, &val_dir).unwrap();

        let raw_source = JsonFileMessageSource::in_dir(&raw_dir);
        assert_eq!(raw_source.fetch_emails().unwrap().len(), split.training.len());
        let val_source = JsonFileMessageSource::in_dir(&val_dir);
        assert_eq!(val_source.fetch_emails().unwrap().len(), split.held_out.len());
    }
}
