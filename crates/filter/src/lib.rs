//! Rejects low-quality, non-authored, or mass-broadcast email before it
//! enters the pipeline (spec.md §4.2).
//!
//! The weighted quality score follows the teacher's
//! `aigent-memory::scorer::is_core_eligible` shape: named sub-scores,
//! explicit weights, a single weighted sum, threshold compare — there is
//! exactly one scoring function here and it does not need dynamic dispatch.

use std::collections::HashSet;

use voicecast_config::FilterConfig;
use voicecast_core::model::{FilteredMessage, RawEmail, RawMessage, RejectionRecord};

const QUOTE_MARKERS: &[&str] = &[">", "on ", "wrote:", "-----original message-----", "from:"];
const AUTO_REPLY_MARKERS: &[&str] = &["out of office", "auto-reply", "automatic reply", "do not reply"];
const FORWARD_MARKERS: &[&str] = &["fwd:", "fw:", "forwarded message"];

pub enum FilterOutcome {
    Accepted(FilteredMessage),
    Rejected(RejectionRecord),
}

/// Deterministic: identical input yields an identical `FilterOutcome`
/// (spec.md §8 invariant 1).
pub fn filter_email(raw: &RawEmail, user_email: &str, cfg: &FilterConfig) -> FilterOutcome {
    if let Some(reason) = hard_rejection_reason(raw, user_email, cfg) {
        return FilterOutcome::Rejected(RejectionRecord {
            id: raw.id.clone(),
            quality_score: 0.0,
            reason,
        });
    }

    let body_stripped = strip_quotes(&raw.body);
    let score = quality_score(raw, &body_stripped, cfg);

    if score >= cfg.acceptance_threshold {
        FilterOutcome::Accepted(FilteredMessage {
            id: raw.id.clone(),
            raw: RawMessage::Email(raw.clone()),
            quality_score: score,
        })
    } else {
        FilterOutcome::Rejected(RejectionRecord {
            id: raw.id.clone(),
            quality_score: score,
            reason: "low_quality_score".to_string(),
        })
    }
}

fn hard_rejection_reason(raw: &RawEmail, user_email: &str, cfg: &FilterConfig) -> Option<String> {
    if !raw.sender.eq_ignore_ascii_case(user_email) {
        return Some("not_authored_by_user".to_string());
    }

    let lower_subject = raw.subject.to_lowercase();
    for header_value in raw.headers.values() {
        let lower = header_value.to_lowercase();
        if AUTO_REPLY_MARKERS.iter().any(|m| lower.contains(m)) {
            return Some("auto_reply".to_string());
        }
    }
    if AUTO_REPLY_MARKERS.iter().any(|m| lower_subject.contains(m)) {
        return Some("auto_reply".to_string());
    }

    let body_opener = raw.body.lines().find(|l| !l.trim().is_empty()).unwrap_or("").to_lowercase();
    if FORWARD_MARKERS.iter().any(|m| lower_subject.starts_with(m) || body_opener.starts_with(m)) {
        return Some("forward_marker".to_string());
    }

    if raw.recipient_count() > cfg.broadcast_threshold {
        return Some("broadcast_recipient_count".to_string());
    }

    let stripped_word_count = strip_quotes(&raw.body).split_whitespace().count();
    if stripped_word_count < cfg.min_body_words {
        return Some("too_short".to_string());
    }

    None
}

/// Strips quoted/forwarded content: any line starting with a quote marker,
/// or any line at/after the first "On ... wrote:" style attribution line.
///
/// Exposed for `voicecast-embed`, which encodes the same stripped body the
/// quality score was computed against rather than re-deriving it.
pub fn strip_quotes(body: &str) -> String {
    let mut kept = Vec::new();
    let mut in_quote = false;
    for line in body.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        if trimmed.starts_with('>') {
            in_quote = true;
            continue;
        }
        if QUOTE_MARKERS.iter().any(|m| *m != ">" && lower.starts_with(m)) {
            in_quote = true;
            continue;
        }
        if in_quote {
            continue;
        }
        kept.push(line);
    }
    kept.join("\n")
}

fn quoted_ratio(body: &str) -> f64 {
    let total_lines = body.lines().filter(|l| !l.trim().is_empty()).count();
    if total_lines == 0 {
        return 0.0;
    }
    let stripped_lines = strip_quotes(body).lines().filter(|l| !l.trim().is_empty()).count();
    let quoted_lines = total_lines.saturating_sub(stripped_lines);
    quoted_lines as f64 / total_lines as f64
}

fn length_score(word_count: usize, cfg: &FilterConfig) -> f64 {
    if word_count <= cfg.length_floor_words {
        return 0.0;
    }
    if word_count >= cfg.length_ceiling_words {
        return 1.0;
    }
    let span = (cfg.length_ceiling_words - cfg.length_floor_words).max(1) as f64;
    (word_count - cfg.length_floor_words) as f64 / span
}

fn vocabulary_diversity(body: &str) -> f64 {
    let words: Vec<String> = body
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&String> = words.iter().collect();
    (unique.len() as f64 / words.len() as f64).max(0.0)
}

fn quality_score(raw: &RawEmail, body_stripped: &str, cfg: &FilterConfig) -> f64 {
    let word_count = body_stripped.split_whitespace().count();
    let length = length_score(word_count, cfg);
    let originality = 1.0 - quoted_ratio(&raw.body);
    let vocabulary = vocabulary_diversity(body_stripped);

    length * cfg.length_weight + originality * cfg.originality_weight + vocabulary * cfg.vocabulary_weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use voicecast_core::ids::MessageId;

    fn email(body: &str, to: Vec<&str>) -> RawEmail {
        RawEmail {
            id: MessageId::derive(body.as_bytes()),
            sender: "me@example.com".to_string(),
            to: to.into_iter().map(String::from).collect(),
            cc: vec![],
            subject: "Quick question".to_string(),
            body: body.to_string(),
            timestamp: Utc::now(),
            thread_id: None,
            headers: Default::default(),
        }
    }

    fn words(n: usize) -> String {
        std::iter::repeat("lorem ipsum dolor sit amet consectetur adipiscing elit sed")
            .flat_map(|s| s.split_whitespace())
            .take(n)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// E1 (filter boundaries): 19 words rejected as too_short; 20 accepted
    /// (quality computed, not automatically accepted, but should clear the
    /// bar given otherwise-perfect originality/vocabulary).
    #[test]
    fn e1_filter_word_count_boundary() {
        let cfg = FilterConfig::default();
        let raw_19 = email(&words(19), vec!["a@example.com"]);
        match filter_email(&raw_19, "me@example.com", &cfg) {
            FilterOutcome::Rejected(r) => assert_eq!(r.reason, "too_short"),
            FilterOutcome::Accepted(_) => panic!("expected rejection at 19 words"),
        }

        let raw_20 = email(&words(20), vec!["a@example.com"]);
        // 20 words clears the hard-rejection floor; quality is then scored
        // rather than assumed, but otherwise-perfect originality/vocabulary
        // clears the acceptance threshold (spec.md E1: "typically accepted").
        match filter_email(&raw_20, "me@example.com", &cfg) {
            FilterOutcome::Accepted(m) => assert!(m.quality_score >= cfg.acceptance_threshold),
            FilterOutcome::Rejected(r) => panic!("expected acceptance at 20 words, got score {}", r.quality_score),
        }
    }

    #[test]
    fn e2_broadcast_recipient_count_is_hard_rejected() {
        let cfg = FilterConfig::default();
        let many: Vec<String> = (0..22).map(|i| format!("r{i}@example.com")).collect();
        let raw = email(&words(80), many.iter().map(String::as_str).collect());
        match filter_email(&raw, "me@example.com", &cfg) {
            FilterOutcome::Rejected(r) => assert_eq!(r.reason, "broadcast_recipient_count"),
            FilterOutcome::Accepted(_) => panic!("expected rejection for broadcast"),
        }
    }

    #[test]
    fn sender_mismatch_is_hard_rejected() {
        let cfg = FilterConfig::default();
        let raw = email(&words(80), vec!["a@example.com"]);
        match filter_email(&raw, "someone-else@example.com", &cfg) {
            FilterOutcome::Rejected(r) => assert_eq!(r.reason, "not_authored_by_user"),
            FilterOutcome::Accepted(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn auto_reply_subject_is_hard_rejected() {
        let cfg = FilterConfig::default();
        let mut raw = email(&words(80), vec!["a@example.com"]);
        raw.subject = "Out of Office: away until Monday".to_string();
        match filter_email(&raw, "me@example.com", &cfg) {
            FilterOutcome::Rejected(r) => assert_eq!(r.reason, "auto_reply"),
            FilterOutcome::Accepted(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn determinism_same_input_same_outcome() {
        let cfg = FilterConfig::default();
        let raw = email(&words(80), vec!["a@example.com"]);
        let a = filter_email(&raw, "me@example.com", &cfg);
        let b = filter_email(&raw, "me@example.com", &cfg);
        let score = |o: &FilterOutcome| match o {
            FilterOutcome::Accepted(m) => m.quality_score,
            FilterOutcome::Rejected(r) => r.quality_score,
        };
        assert_eq!(score(&a), score(&b));
    }

    #[test]
    fn heavily_quoted_body_scores_lower_originality() {
        let cfg = FilterConfig::default();
        let quoted_body = format!("{}\n> {}", words(30), words(60));
        let raw = email(&quoted_body, vec!["a@example.com"]);
        let original_body = words(90);
        let raw_original = email(&original_body, vec!["a@example.com"]);

        let score_quoted = match filter_email(&raw, "me@example.com", &cfg) {
            FilterOutcome::Accepted(m) => m.quality_score,
            FilterOutcome::Rejected(r) => r.quality_score,
        };
        let score_original = match filter_email(&raw_original, "me@example.com", &cfg) {
            FilterOutcome::Accepted(m) => m.quality_score,
            FilterOutcome::Rejected(r) => r.quality_score,
        };
        assert!(score_original >= score_quoted);
    }

    proptest::proptest! {
        /// Invariant 1 (spec.md §8): filtering is a pure function of the
        /// message and config — the same raw email run through `filter_email`
        /// twice always yields the same outcome, for any body length and
        /// recipient count the generator produces.
        #[test]
        fn determinism_holds_for_arbitrary_bodies(word_count in 0usize..200, recipient_count in 1usize..30) {
            let cfg = FilterConfig::default();
            let recipients: Vec<String> = (0..recipient_count).map(|i| format!("r{i}@example.com")).collect();
            let raw = email(&words(word_count), recipients.iter().map(String::as_str).collect());

            let score = |o: &FilterOutcome| match o {
                FilterOutcome::Accepted(m) => (1u8, m.quality_score),
                FilterOutcome::Rejected(r) => (0u8, r.quality_score),
            };
            let a = filter_email(&raw, "me@example.com", &cfg);
            let b = filter_email(&raw, "me@example.com", &cfg);
            prop_assert_eq!(score(&a), score(&b));
        }
    }
}
