use serde::{Deserialize, Serialize};

use crate::ids::MessageId;
use crate::model::context::MessageContext;
use crate::model::raw::RawMessage;

/// A [`RawMessage`] that passed the quality gate, carrying the score that
/// got it there. Rejected messages never become a `FilteredMessage`; they
/// are recorded as a [`RejectionRecord`] and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredMessage {
    pub id: MessageId,
    pub raw: RawMessage,
    pub quality_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub id: MessageId,
    pub quality_score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedMessage {
    #[serde(flatten)]
    pub filtered: FilteredMessage,
    pub context: MessageContext,
}
