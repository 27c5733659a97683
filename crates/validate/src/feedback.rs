//! Phase 2 — interactive feedback capture and suggestion synthesis
//! (spec.md §4.9). Each CLI invocation records one decision; nothing here
//! blocks on stdin, matching the "commands never read stdin" rule (spec.md
//! §6).

use voicecast_core::model::{Persona, SuggestionRecord, UserFeedback, ValidationPair, ValidationResult};

/// Upserts one verdict by `pair_id`, replacing a prior verdict for the same
/// pair rather than accumulating duplicates.
pub fn record_feedback(feedback: &mut Vec<UserFeedback>, pair_id: &str, sounds_like_me: bool, notes: Option<String>) {
    if let Some(existing) = feedback.iter_mut().find(|f| f.pair_id == pair_id) {
        existing.sounds_like_me = sounds_like_me;
        existing.notes = notes;
        return;
    }
    feedback.push(UserFeedback {
        pair_id: pair_id.to_string(),
        sounds_like_me,
        notes,
    });
}

/// Worst-scoring non-errored results first, for `--review`.
pub fn ranked_mismatches(results: &[ValidationResult]) -> Vec<&ValidationResult> {
    let mut ranked: Vec<&ValidationResult> = results.iter().filter(|r| !r.errored).collect();
    ranked.sort_by(|a, b| a.overall.partial_cmp(&b.overall).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Turns `sounds_like_me=false` verdicts into concrete per-field persona
/// edit suggestions (spec.md §4.9 step 2 example: "update typical_greeting
/// from 'Dear' to 'Hi'"). Only pairs with a recorded negative verdict
/// produce suggestions — positive verdicts need no action.
pub fn build_suggestions(
    pairs: &[ValidationPair],
    results: &[ValidationResult],
    feedback: &[UserFeedback],
    personas: &std::collections::BTreeMap<String, Persona>,
) -> Vec<SuggestionRecord> {
    let mut suggestions = Vec::new();

    for verdict in feedback.iter().filter(|f| !f.sounds_like_me) {
        let Some(pair) = pairs.iter().find(|p| p.pair_id == verdict.pair_id) else { continue };
        let Some(result) = results.iter().find(|r| r.pair_id == verdict.pair_id) else { continue };
        let Some(persona) = personas.get(&pair.persona_name) else { continue };

        if result.greeting_match < 1.0 {
            if let Some(observed) = first_nonempty_line(&pair.ground_truth_reply) {
                if !observed.eq_ignore_ascii_case(persona.typical_greeting.trim()) {
                    suggestions.push(SuggestionRecord {
                        persona_name: pair.persona_name.clone(),
                        field: "typical_greeting".to_string(),
                        current_value: persona.typical_greeting.clone(),
                        suggested_value: observed,
                        rationale: format!("pair {} scored {:.2} on greeting match", pair.pair_id, result.greeting_match),
                    });
                }
            }
        }

        if result.closing_match < 1.0 {
            if let Some(observed) = last_nonempty_line(&pair.ground_truth_reply) {
                if !observed.eq_ignore_ascii_case(persona.typical_closing.trim()) {
                    suggestions.push(SuggestionRecord {
                        persona_name: pair.persona_name.clone(),
                        field: "typical_closing".to_string(),
                        current_value: persona.typical_closing.clone(),
                        suggested_value: observed,
                        rationale: format!("pair {} scored {:.2} on closing match", pair.pair_id, result.closing_match),
                    });
                }
            }
        }

        if let Some(notes) = &verdict.notes {
            suggestions.push(SuggestionRecord {
                persona_name: pair.persona_name.clone(),
                field: "(free-text feedback)".to_string(),
                current_value: String::new(),
                suggested_value: notes.clone(),
                rationale: format!("operator note on pair {}", pair.pair_id),
            });
        }
    }

    suggestions
}

fn first_nonempty_line(text: &str) -> Option<String> {
    text.lines().find(|l| !l.trim().is_empty()).map(|l| l.trim().trim_end_matches(',').to_string())
}

fn last_nonempty_line(text: &str) -> Option<String> {
    text.lines().rev().find(|l| !l.trim().is_empty()).map(|l| l.trim().trim_end_matches(',').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicecast_core::ids::ClusterId;
    use voicecast_core::tone::ToneVector;

    fn persona() -> Persona {
        Persona {
            name: "Professional".to_string(),
            tone_vector: ToneVector::new(5, 5, 5, 5).unwrap(),
            typical_greeting: "Dear".to_string(),
            typical_closing: "Sincerely".to_string(),
            bullet_usage: 0.1,
            contraction_rate: 0.1,
            average_length_words: 80.0,
            dominant_recipient_types: vec![],
            examples: vec![],
            cluster_id: ClusterId(0),
            confidence: 0.8,
            sample_count: 10,
            schema_version: 1,
            extra: Default::default(),
        }
    }

    #[test]
    fn record_feedback_replaces_prior_verdict_for_same_pair() {
        let mut feedback = Vec::new();
        record_feedback(&mut feedback, "p1", true, None);
        record_feedback(&mut feedback, "p1", false, Some("nah".to_string()));
        assert_eq!(feedback.len(), 1);
        assert!(!feedback[0].sounds_like_me);
    }

    #[test]
    fn negative_verdict_suggests_observed_greeting() {
        let pairs = vec![ValidationPair {
            pair_id: "p1".to_string(),
            source_message_id: voicecast_core::ids::MessageId::from("m1"),
            context: "ctx".to_string(),
            ground_truth_reply: "Hi Sam,\n\nHere's the update.\n\nBest,\nJordan".to_string(),
            persona_name: "Professional".to_string(),
        }];
        let results = vec![ValidationResult {
            pair_id: "p1".to_string(),
            generated_reply: "Dear Sam, ...".to_string(),
            tone_match: 0.9,
            greeting_match: 0.5,
            closing_match: 0.5,
            contraction_match: 0.8,
            overall: 0.6,
            errored: false,
            error_message: None,
        }];
        let feedback = vec![UserFeedback { pair_id: "p1".to_string(), sounds_like_me: false, notes: None }];
        let mut personas = std::collections::BTreeMap::new();
        personas.insert("Professional".to_string(), persona());

        let suggestions = build_suggestions(&pairs, &results, &feedback, &personas);
        assert!(suggestions.iter().any(|s| s.field == "typical_greeting" && s.suggested_value == "Hi Sam"));
    }
}
