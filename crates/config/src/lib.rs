//! `AppConfig` — every numeric knob `spec.md` calls "configurable", grouped
//! by the stage that reads it, TOML-backed via the same
//! `load_from`/`save_to` shape the teacher's `AppConfig` uses.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Weight of the length score in the weighted-mean quality score (spec.md §4.2).
    pub length_weight: f64,
    pub originality_weight: f64,
    pub vocabulary_weight: f64,
    /// Word count at or below which the length score is 0.
    pub length_floor_words: usize,
    /// Word count at or above which the length score saturates at 1.
    pub length_ceiling_words: usize,
    /// Minimum word count after quote-stripping; below this is a hard rejection.
    /// Aligned with `length_floor_words` so the E1 boundary (19 words
    /// rejected, 20 scored) holds: a body below the length floor never
    /// earns a nonzero length score, so it is rejected outright rather than
    /// scored and maybe accepted on originality/vocabulary alone.
    pub min_body_words: usize,
    /// Recipient count at or above which a message is a broadcast and hard-rejected.
    pub broadcast_threshold: usize,
    /// Minimum weighted quality score for acceptance.
    pub acceptance_threshold: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            length_weight: 0.3,
            originality_weight: 0.4,
            vocabulary_weight: 0.3,
            length_floor_words: 20,
            length_ceiling_words: 60,
            min_body_words: 20,
            broadcast_threshold: 20,
            acceptance_threshold: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub small_group_max: usize,
    pub team_max: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            small_group_max: 5,
            team_max: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// `fastembed` model identifier. Changing this invalidates and
    /// regenerates the whole embedding matrix (spec.md §4.4).
    pub model_id: String,
    pub dimension: usize,
    pub batch_size: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_id: "BAAI/bge-small-en-v1.5".to_string(),
            dimension: 384,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClusterAlgorithmChoice {
    Density,
    Partitional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub algorithm: ClusterAlgorithmChoice,
    pub min_cluster_size: usize,
    pub min_samples: usize,
    /// Explicit `k` for the partitional fallback; `None` lets the clusterer
    /// recommend one from corpus size (spec.md §4.5).
    pub k: Option<usize>,
    pub seed: u64,
    /// Density-based runs with noise ratio above this fall back to partitional.
    pub max_noise_ratio: f64,
    /// Density-based runs with fewer clusters than this fall back to partitional.
    pub min_clusters: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            algorithm: ClusterAlgorithmChoice::Density,
            min_cluster_size: 5,
            min_samples: 5,
            k: None,
            seed: 42,
            max_noise_ratio: 0.30,
            min_clusters: 3,
        }
    }
}

impl Default for ClusterAlgorithmChoice {
    fn default() -> Self {
        ClusterAlgorithmChoice::Density
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Minimum fraction of a cluster's members that must be analysed before
    /// the persona is considered complete (spec.md §3 invariant, §4.6, §4.7).
    pub target_coverage: f64,
    pub representative_sample_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            target_coverage: 0.80,
            representative_sample_size: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInConfig {
    /// Posts with fewer original characters than this (after stripping
    /// reposted payloads) are dropped (spec.md §4.8).
    pub min_original_chars: usize,
    /// Minimum original commentary length for a repost to feed the primary
    /// tone vector rather than only the editorial-voice sub-record.
    pub min_commentary_chars: usize,
    pub example_bank_size: usize,
    pub concurrent_scrapes: usize,
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            min_original_chars: 200,
            min_commentary_chars: 50,
            example_bank_size: 3,
            concurrent_scrapes: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fraction of fetched messages copied into `validation_set` (spec.md §3, §6).
    pub holdout_ratio: f64,
    pub tone_weight: f64,
    pub greeting_weight: f64,
    pub closing_weight: f64,
    pub contraction_weight: f64,
    pub http_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            holdout_ratio: 0.15,
            tone_weight: 0.5,
            greeting_weight: 0.2,
            closing_weight: 0.2,
            contraction_weight: 0.1,
            http_timeout_secs: 60,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub default_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: "anthropic/claude-3.5-sonnet".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserConfig {
    /// The pipeline's own email address — `EmailFilter` rejects anything not
    /// authored by this address (spec.md §4.2).
    pub email_address: String,
    /// Domain(s) considered "internal" for audience classification (spec.md §4.3).
    pub internal_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub user: UserConfig,
    pub filter: FilterConfig,
    pub enrich: EnrichConfig,
    pub embed: EmbedConfig,
    pub cluster: ClusterConfig,
    pub batch: BatchConfig,
    pub linkedin: LinkedInConfig,
    pub validation: ValidationConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(value) = env::var("VOICECAST_USER_EMAIL") {
            if !value.is_empty() {
                config.user.email_address = value;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = AppConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.filter.acceptance_threshold, config.filter.acceptance_threshold);
        assert_eq!(parsed.cluster.seed, config.cluster.seed);
    }

    #[test]
    fn load_from_missing_path_falls_back_to_defaults() {
        let config = AppConfig::load_from("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.batch.target_coverage, 0.80);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.user.email_address = "me@example.com".to_string();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.user.email_address, "me@example.com");
    }
}
