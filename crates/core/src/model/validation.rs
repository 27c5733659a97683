use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationPair {
    pub pair_id: String,
    pub source_message_id: MessageId,
    /// The incoming message the user replied to.
    pub context: String,
    /// What the user actually wrote — held out, never echoed back into a
    /// prompt (spec.md §8 invariant 7).
    pub ground_truth_reply: String,
    pub persona_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub pair_id: String,
    pub generated_reply: String,
    pub tone_match: f64,
    pub greeting_match: f64,
    pub closing_match: f64,
    pub contraction_match: f64,
    pub overall: f64,
    pub errored: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFeedback {
    pub pair_id: String,
    pub sounds_like_me: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRecord {
    pub persona_name: String,
    pub field: String,
    pub current_value: String,
    pub suggested_value: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
    pub average_overall: f64,
    pub per_persona_average: std::collections::BTreeMap<String, f64>,
    pub generated_at: DateTime<Utc>,
}
