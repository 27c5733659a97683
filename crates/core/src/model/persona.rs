use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{ClusterId, MessageId};
use crate::model::context::RecipientType;
use crate::tone::ToneVector;

fn schema_version_v1() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaExample {
    pub message_id: MessageId,
    pub excerpt: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub tone_vector: ToneVector,
    pub typical_greeting: String,
    pub typical_closing: String,
    pub bullet_usage: f64,
    pub contraction_rate: f64,
    pub average_length_words: f64,
    #[serde(default)]
    pub dominant_recipient_types: Vec<RecipientType>,
    /// 2-4 annotated few-shot examples, highest-confidence first.
    pub examples: Vec<PersonaExample>,
    pub cluster_id: ClusterId,
    pub confidence: f64,
    /// Running count of samples folded into this persona so far — used as
    /// the weight in the weighted-mean merge of a newly submitted batch.
    #[serde(default)]
    pub sample_count: usize,
    #[serde(default = "schema_version_v1")]
    pub schema_version: u32,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl Persona {
    pub const MAX_EXAMPLES: usize = 4;

    /// Re-select the example bank after a merge: highest confidence first,
    /// capped at [`Persona::MAX_EXAMPLES`].
    pub fn reselect_examples(&mut self) {
        self.examples
            .sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        self.examples.truncate(Self::MAX_EXAMPLES);
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ClusterCoverage {
    pub cluster_size: usize,
    pub ingested_count: usize,
}

impl ClusterCoverage {
    pub fn ratio(&self) -> f64 {
        if self.cluster_size == 0 {
            return 0.0;
        }
        self.ingested_count as f64 / self.cluster_size as f64
    }

    pub fn required_count(&self, target_ratio: f64) -> usize {
        (self.cluster_size as f64 * target_ratio).ceil() as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PersonaRegistry {
    pub personas: BTreeMap<String, Persona>,
    /// Message id -> name of the persona it was ingested under.
    pub ingested: BTreeMap<MessageId, String>,
    pub cluster_coverage: BTreeMap<ClusterId, ClusterCoverage>,
    #[serde(default = "schema_version_v1")]
    pub schema_version: u32,
}

impl PersonaRegistry {
    pub fn coverage_for(&self, cluster_id: ClusterId) -> ClusterCoverage {
        self.cluster_coverage.get(&cluster_id).copied().unwrap_or_default()
    }
}

// ── Batch schema (BatchPreparer output contract / BatchIngester input) ──────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralAnalysis {
    pub greeting: Option<String>,
    pub closing: Option<String>,
    pub bullet_usage: bool,
    pub contraction_rate: f64,
    pub length_words: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleAnalysis {
    pub message_id: MessageId,
    pub persona_name: String,
    pub confidence: f64,
    pub tone_vector: ToneVector,
    pub structural: StructuralAnalysis,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFile {
    pub batch_id: String,
    pub cluster_id: ClusterId,
    pub calibration_referenced: bool,
    #[serde(default)]
    pub new_personas: Vec<Persona>,
    pub samples: Vec<SampleAnalysis>,
    /// Caller-asserted "this cluster's coverage is met, advance" signal.
    #[serde(default)]
    pub cluster_complete: bool,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}
