//! Scores a generated reply against its ground truth on four dimensions
//! (spec.md §4.9 step 3): tone match, greeting match, closing match, and
//! the canonical weighted `overall`.

use voicecast_config::ValidationConfig;
use voicecast_core::model::ValidationResult;
use voicecast_core::tone::ToneVector;
use voicecast_linkedin::heuristics;

const CASUAL_GREETINGS: &[&str] = &["hi", "hey", "hello"];
const FORMAL_GREETINGS: &[&str] = &["dear", "greetings", "good morning", "good afternoon"];
const CASUAL_CLOSINGS: &[&str] = &["thanks", "thank you", "cheers", "talk soon", "best"];
const FORMAL_CLOSINGS: &[&str] = &["sincerely", "best regards", "warmly", "respectfully"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GreetingFamily {
    Casual,
    Formal,
}

fn first_line(text: &str) -> String {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").to_lowercase()
}

fn last_line(text: &str) -> String {
    text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").to_lowercase()
}

fn greeting_family(text: &str) -> Option<GreetingFamily> {
    let line = first_line(text);
    if FORMAL_GREETINGS.iter().any(|g| line.contains(g)) {
        return Some(GreetingFamily::Formal);
    }
    if CASUAL_GREETINGS.iter().any(|g| line.contains(g)) {
        return Some(GreetingFamily::Casual);
    }
    None
}

fn closing_family(text: &str) -> Option<GreetingFamily> {
    let line = last_line(text);
    if FORMAL_CLOSINGS.iter().any(|c| line.contains(c)) {
        return Some(GreetingFamily::Formal);
    }
    if CASUAL_CLOSINGS.iter().any(|c| line.contains(c)) {
        return Some(GreetingFamily::Casual);
    }
    None
}

/// 1 if same family, 0.5 if both present but in different families, 0 if
/// either side lacks one (spec.md §4.9 step 3).
fn family_match(a: Option<GreetingFamily>, b: Option<GreetingFamily>) -> f64 {
    match (a, b) {
        (Some(x), Some(y)) if x == y => 1.0,
        (Some(_), Some(_)) => 0.5,
        _ => 0.0,
    }
}

fn contraction_rate(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let contractions = words.iter().filter(|w| w.contains('\'')).count();
    contractions as f64 / words.len() as f64
}

fn tone_from_text(text: &str) -> ToneVector {
    ToneVector::clamped(
        heuristics::formality(text),
        heuristics::warmth(text),
        heuristics::authority(text),
        heuristics::directness(text),
    )
}

/// Scores `generated` against `ground_truth` and combines the four
/// dimensions using `cfg`'s canonical weights (spec.md §4.9 step 3).
pub fn score(pair_id: &str, generated: &str, ground_truth: &str, cfg: &ValidationConfig) -> ValidationResult {
    let tone_generated = tone_from_text(generated);
    let tone_truth = tone_from_text(ground_truth);
    let tone_match = tone_generated.match_score(&tone_truth);

    let greeting_match = family_match(greeting_family(generated), greeting_family(ground_truth));
    let closing_match = family_match(closing_family(generated), closing_family(ground_truth));

    let contraction_match = 1.0 - (contraction_rate(generated) - contraction_rate(ground_truth)).abs().min(1.0);

    let overall = cfg.tone_weight * tone_match
        + cfg.greeting_weight * greeting_match
        + cfg.closing_weight * closing_match
        + cfg.contraction_weight * contraction_match;

    ValidationResult {
        pair_id: pair_id.to_string(),
        generated_reply: generated.to_string(),
        tone_match,
        greeting_match,
        closing_match,
        contraction_match,
        overall: overall.clamp(0.0, 1.0),
        errored: false,
        error_message: None,
    }
}

pub fn errored(pair_id: &str, error_message: String) -> ValidationResult {
    ValidationResult {
        pair_id: pair_id.to_string(),
        generated_reply: String::new(),
        tone_match: 0.0,
        greeting_match: 0.0,
        closing_match: 0.0,
        contraction_match: 0.0,
        overall: 0.0,
        errored: true,
        error_message: Some(error_message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_replies_score_near_perfect() {
        let cfg = ValidationConfig::default();
        let reply = "Hi team,\n\nHere's the update for this week.\n\nThanks,\nJordan";
        let result = score("p1", reply, reply, &cfg);
        assert!(result.overall > 0.95, "expected near 1.0, got {}", result.overall);
    }

    #[test]
    fn mismatched_greeting_family_scores_half() {
        let cfg = ValidationConfig::default();
        let generated = "Dear Sam,\n\nPlease find the update below.\n\nSincerely,\nJordan";
        let truth = "Hey Sam,\n\nHere's the update!\n\nCheers,\nJordan";
        let result = score("p1", generated, truth, &cfg);
        assert_eq!(result.greeting_match, 0.5);
        assert_eq!(result.closing_match, 0.5);
    }

    #[test]
    fn missing_greeting_on_one_side_scores_zero() {
        let cfg = ValidationConfig::default();
        let generated = "Here's the update with no greeting at all.";
        let truth = "Hi Sam,\n\nHere's the update.\n\nBest,\nJordan";
        let result = score("p1", generated, truth, &cfg);
        assert_eq!(result.greeting_match, 0.0);
    }

    #[test]
    fn errored_result_is_excluded_from_scoring_math() {
        let r = errored("p1", "timeout".to_string());
        assert!(r.errored);
        assert_eq!(r.overall, 0.0);
    }
}
