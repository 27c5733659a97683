use serde::{Deserialize, Serialize};

use crate::ids::MessageId;
use crate::tone::ToneVector;

fn schema_version_v1() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInExample {
    pub message_id: MessageId,
    pub text: String,
    pub likes: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EditorialVoice {
    pub sample_count: usize,
    pub average_commentary_length: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInPersona {
    pub tone_vector: ToneVector,
    pub average_sentence_length: f64,
    pub short_sentence_ratio: f64,
    pub emoji_per_post_min: f64,
    pub emoji_per_post_max: f64,
    pub question_rate: f64,
    pub exclamation_rate: f64,
    pub hashtag_frequency: f64,
    pub hashtag_count_min: u32,
    pub hashtag_count_max: u32,
    pub hashtag_placement: String,
    pub hook_style_distribution: std::collections::BTreeMap<String, f64>,
    pub dominant_hook_style: String,
    pub closing_style_distribution: std::collections::BTreeMap<String, f64>,
    pub length_target_chars: f64,
    pub length_min_chars: f64,
    pub length_max_chars: f64,
    pub example_bank: Vec<LinkedInExample>,
    /// Left as empty slots for an optional downstream LLM-refinement pass
    /// that merges them in without overwriting computed fields.
    #[serde(default)]
    pub guardrails: Vec<String>,
    #[serde(default)]
    pub off_limits_topics: Vec<String>,
    #[serde(default)]
    pub signature_phrases: Vec<String>,
    #[serde(default)]
    pub editorial_voice: Option<EditorialVoice>,
    pub confidence: f64,
    pub sample_size: usize,
    #[serde(default = "schema_version_v1")]
    pub schema_version: u32,
}
