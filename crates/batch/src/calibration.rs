//! Static calibration anchors and the batch schema contract — the "Reference
//! data" component of spec.md §2, fed to the caller-LLM by [`crate::prepare`].

pub struct Anchor {
    pub score: u8,
    pub description: &'static str,
    pub example: &'static str,
}

pub struct DimensionAnchors {
    pub dimension: &'static str,
    pub anchors: &'static [Anchor],
}

pub const FORMALITY_ANCHORS: DimensionAnchors = DimensionAnchors {
    dimension: "formality",
    anchors: &[
        Anchor { score: 1, description: "extremely casual, texting register", example: "yo quick q, u around?" },
        Anchor { score: 3, description: "casual but complete sentences", example: "Hey John — quick question, got a sec?" },
        Anchor { score: 5, description: "neutral workplace register", example: "Hi John, could you clarify the deadline for this?" },
        Anchor { score: 7, description: "polished professional", example: "Hi John, would you be able to confirm the deadline at your convenience?" },
        Anchor { score: 10, description: "formal business correspondence", example: "Dear Mr. Smith, I am writing to request clarification regarding the submission deadline." },
    ],
};

pub const WARMTH_ANCHORS: DimensionAnchors = DimensionAnchors {
    dimension: "warmth",
    anchors: &[
        Anchor { score: 1, description: "purely transactional, no personal touch", example: "Send the file by 5pm." },
        Anchor { score: 5, description: "friendly but businesslike", example: "Hope you're doing well — could you send the file by 5pm?" },
        Anchor { score: 10, description: "effusive, personable", example: "Hope you had a great weekend! Whenever you get a chance, would love the file by 5pm. Thank you so much!" },
    ],
};

pub const AUTHORITY_ANCHORS: DimensionAnchors = DimensionAnchors {
    dimension: "authority",
    anchors: &[
        Anchor { score: 1, description: "highly deferential, hedged", example: "I could be wrong, but maybe we might want to consider a delay?" },
        Anchor { score: 5, description: "confident but collaborative", example: "I think we should delay the launch by a week." },
        Anchor { score: 10, description: "directive, unhedged", example: "We are delaying the launch by a week." },
    ],
};

pub const DIRECTNESS_ANCHORS: DimensionAnchors = DimensionAnchors {
    dimension: "directness",
    anchors: &[
        Anchor { score: 1, description: "heavily qualified, buries the ask", example: "Not urgent at all, whenever is fine, but if you have a moment, maybe take a look?" },
        Anchor { score: 5, description: "clear but softened", example: "Could you take a look at this when you get a chance?" },
        Anchor { score: 10, description: "blunt, imperative", example: "Review this today." },
    ],
};

pub const ALL_DIMENSIONS: &[DimensionAnchors] = &[FORMALITY_ANCHORS, WARMTH_ANCHORS, AUTHORITY_ANCHORS, DIRECTNESS_ANCHORS];

/// Render the full calibration section for the caller-LLM (spec.md §4.6 item 1).
pub fn render_calibration() -> String {
    let mut out = String::from("## Calibration anchors\n\n");
    for dim in ALL_DIMENSIONS {
        out.push_str(&format!("### {}\n", dim.dimension));
        for anchor in dim.anchors {
            out.push_str(&format!("- {}: {} — \"{}\"\n", anchor.score, anchor.description, anchor.example));
        }
        out.push('\n');
    }
    out
}

/// Render the batch schema contract for the caller-LLM (spec.md §4.6 item 2, §4.7).
pub fn render_schema_contract() -> String {
    r#"## Batch schema contract

Respond with a single JSON object matching:

{
  "batch_id": "string, unique to this batch",
  "cluster_id": integer, matching the cluster shown below,
  "calibration_referenced": true,
  "new_personas": [ { persona template fields: name, tone_vector{formality,warmth,authority,directness} all integers 1-10, typical_greeting, typical_closing, bullet_usage, contraction_rate, average_length_words, dominant_recipient_types, examples[], cluster_id, confidence } ],
  "samples": [ { "message_id": "string", "persona_name": "string", "confidence": 0.0-1.0, "tone_vector": {...}, "structural": {"greeting":..,"closing":..,"bullet_usage":bool,"contraction_rate":f64,"length_words":u32} } ],
  "cluster_complete": boolean — true only once >= 80% of this cluster's members have been analysed across all batches submitted so far
}

Unknown fields are tolerated and preserved. `calibration_referenced` must be `true`.
"#
    .to_string()
}
