//! Attaches the `MessageContext` record to a [`FilteredMessage`] — recipient
//! class, audience, thread position, time-of-day, structural counts, and an
//! advisory seniority guess (spec.md §4.3).
//!
//! Deterministic, no external calls. The seniority/greeting/closing lexicon
//! classifiers follow the teacher's `aigent-memory::sentiment::infer_valence`
//! shape: small `const &[&str]` word lists, a short negation lookback window
//! where it matters, explicit clamps — not a general NLP dependency.

use chrono::{Datelike, Timelike, Weekday};
use voicecast_config::EnrichConfig;
use voicecast_core::model::{
    Audience, EnrichedMessage, FilteredMessage, MessageContext, RecipientType, Seniority,
    ThreadPosition, TimeOfDay,
};

const REPLY_MARKERS: &[&str] = &["re:", "re :"];
const FORWARD_MARKERS: &[&str] = &["fwd:", "fw:"];
const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "dear", "good morning", "good afternoon", "greetings"];
const CLOSING_WORDS: &[&str] = &[
    "best", "regards", "thanks", "thank you", "cheers", "sincerely", "warmly", "talk soon", "best regards",
];
const EXECUTIVE_TITLES: &[&str] = &["ceo", "cto", "cfo", "coo", "vp", "vice president", "director", "founder", "president", "chief"];
const PEER_TITLES: &[&str] = &["engineer", "manager", "analyst", "designer", "specialist", "associate"];
const NEGATION_WORDS: &[&str] = &["not", "no", "isn't", "isnt"];

/// Deterministic (spec.md §8 invariant — re-running yields identical output).
pub fn enrich(filtered: FilteredMessage, user_domain: &str, cfg: &EnrichConfig) -> EnrichedMessage {
    let context = match &filtered.raw {
        voicecast_core::model::RawMessage::Email(email) => build_context(email, user_domain, cfg),
        voicecast_core::model::RawMessage::LinkedInPost(_) => default_context(),
    };
    EnrichedMessage { filtered, context }
}

fn default_context() -> MessageContext {
    MessageContext {
        recipient_type: RecipientType::Individual,
        audience: Audience::External,
        thread_position: ThreadPosition::Initiating,
        time_of_day: TimeOfDay::Morning,
        is_weekend: false,
        bullet_lines: 0,
        paragraph_count: 1,
        greeting_present: false,
        closing_present: false,
        recipient_seniority: Seniority::Unknown,
    }
}

fn build_context(
    email: &voicecast_core::model::RawEmail,
    user_domain: &str,
    _cfg: &EnrichConfig,
) -> MessageContext {
    let recipient_type = RecipientType::classify(email.recipient_count());
    let audience = classify_audience(email, user_domain);
    let thread_position = classify_thread_position(email);
    let time_of_day = classify_time_of_day(email.timestamp.hour());
    let is_weekend = matches!(email.timestamp.weekday(), Weekday::Sat | Weekday::Sun);

    let body = strip_quoted(&email.body);
    let bullet_lines = count_bullet_lines(&body);
    let paragraph_count = count_paragraphs(&body);
    let greeting_present = has_greeting(&body);
    let closing_present = has_closing(&body);
    let recipient_seniority = infer_seniority(email, user_domain);

    MessageContext {
        recipient_type,
        audience,
        thread_position,
        time_of_day,
        is_weekend,
        bullet_lines,
        paragraph_count,
        greeting_present,
        closing_present,
        recipient_seniority,
    }
}

fn domain_of(address: &str) -> &str {
    address.rsplit('@').next().unwrap_or("").trim()
}

/// Partition To+CC addresses into internal (matching `user_domain`) and
/// external; internal-only, external-only, or mixed (spec.md §4.3).
fn classify_audience(email: &voicecast_core::model::RawEmail, user_domain: &str) -> Audience {
    let addresses = email.to.iter().chain(email.cc.iter());
    let mut has_internal = false;
    let mut has_external = false;
    for address in addresses {
        if domain_of(address).eq_ignore_ascii_case(user_domain) {
            has_internal = true;
        } else {
            has_external = true;
        }
    }
    match (has_internal, has_external) {
        (true, false) => Audience::Internal,
        (false, true) => Audience::External,
        (true, true) => Audience::Mixed,
        // No recipients at all — treat as internal (e.g. a draft/self-note).
        (false, false) => Audience::Internal,
    }
}

fn classify_thread_position(email: &voicecast_core::model::RawEmail) -> ThreadPosition {
    let lower_subject = email.subject.to_lowercase();
    if FORWARD_MARKERS.iter().any(|m| lower_subject.starts_with(m)) {
        return ThreadPosition::Forward;
    }
    if REPLY_MARKERS.iter().any(|m| lower_subject.starts_with(m)) || email.thread_id.is_some() {
        return ThreadPosition::Reply;
    }
    ThreadPosition::Initiating
}

fn classify_time_of_day(hour: u32) -> TimeOfDay {
    match hour {
        5..=11 => TimeOfDay::Morning,
        12..=16 => TimeOfDay::Afternoon,
        17..=21 => TimeOfDay::Evening,
        _ => TimeOfDay::Night,
    }
}

fn strip_quoted(body: &str) -> String {
    body.lines()
        .take_while(|_| true)
        .filter(|l| !l.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn count_bullet_lines(body: &str) -> u32 {
    body.lines()
        .filter(|l| {
            let t = l.trim_start();
            t.starts_with('-') || t.starts_with('*') || t.starts_with('•') || starts_with_numeric_marker(t)
        })
        .count() as u32
}

fn starts_with_numeric_marker(line: &str) -> bool {
    let mut chars = line.chars();
    let digits: String = chars.by_ref().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return false;
    }
    matches!(chars.next(), Some('.') | Some(')'))
}

fn count_paragraphs(body: &str) -> u32 {
    let mut count = 0u32;
    let mut in_paragraph = false;
    for line in body.lines() {
        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            count += 1;
            in_paragraph = true;
        }
    }
    count.max(if body.trim().is_empty() { 0 } else { 1 })
}

fn has_greeting(body: &str) -> bool {
    let first_line = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("").to_lowercase();
    GREETING_WORDS.iter().any(|g| first_line.starts_with(g) || first_line.contains(g))
}

fn has_closing(body: &str) -> bool {
    let non_empty: Vec<&str> = body.lines().filter(|l| !l.trim().is_empty()).collect();
    if non_empty.is_empty() {
        return false;
    }
    // The penultimate non-empty block (or the last, if there's only one).
    let idx = non_empty.len().saturating_sub(2);
    let candidate_a = non_empty[idx].to_lowercase();
    let candidate_b = non_empty[non_empty.len() - 1].to_lowercase();
    CLOSING_WORDS.iter().any(|c| candidate_a.contains(c) || candidate_b.contains(c))
}

/// Advisory heuristic over recipient signature blocks / title tokens in the
/// body. Unknown unless a clear signal is present — downstream must not
/// require this field (spec.md §4.3).
fn infer_seniority(email: &voicecast_core::model::RawEmail, user_domain: &str) -> Seniority {
    let lower_body = email.body.to_lowercase();
    let words: Vec<&str> = lower_body.split_whitespace().collect();

    for (i, word) in words.iter().enumerate() {
        let clean: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
        if EXECUTIVE_TITLES.iter().any(|t| clean == *t) {
            let negated = i > 0 && NEGATION_WORDS.contains(&words[i - 1]);
            if !negated {
                return Seniority::Executive;
            }
        }
    }
    for word in &words {
        let clean: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
        if PEER_TITLES.iter().any(|t| clean == *t) {
            return Seniority::Peer;
        }
    }

    let all_external = email
        .to
        .iter()
        .chain(email.cc.iter())
        .all(|a| !domain_of(a).eq_ignore_ascii_case(user_domain));
    if !email.to.is_empty() && all_external {
        return Seniority::ExternalClient;
    }

    Seniority::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use voicecast_core::ids::MessageId;
    use voicecast_core::model::{FilteredMessage, RawEmail, RawMessage};

    fn filtered_email(to: Vec<&str>, cc: Vec<&str>, body: &str, subject: &str) -> FilteredMessage {
        let raw = RawEmail {
            id: MessageId::derive(body.as_bytes()),
            sender: "me@example.com".to_string(),
            to: to.into_iter().map(String::from).collect(),
            cc: cc.into_iter().map(String::from).collect(),
            subject: subject.to_string(),
            body: body.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            thread_id: None,
            headers: Default::default(),
        };
        FilteredMessage {
            id: raw.id.clone(),
            raw: RawMessage::Email(raw),
            quality_score: 0.9,
        }
    }

    /// E2 (recipient classification).
    #[test]
    fn e2_individual_internal() {
        let cfg = EnrichConfig::default();
        let filtered = filtered_email(vec!["a@example.com"], vec![], "Hello there, how are you doing today?", "Quick check-in");
        let enriched = enrich(filtered, "example.com", &cfg);
        assert_eq!(enriched.context.recipient_type, RecipientType::Individual);
        assert_eq!(enriched.context.audience, Audience::Internal);
    }

    #[test]
    fn e2_team_size_eleven() {
        let cfg = EnrichConfig::default();
        let to: Vec<&str> = (0..8).map(|_| "a@example.com").collect();
        let cc: Vec<&str> = (0..3).map(|_| "b@example.com").collect();
        let filtered = filtered_email(to, cc, "Status update for everyone on the team this week.", "Weekly update");
        let enriched = enrich(filtered, "example.com", &cfg);
        assert_eq!(enriched.context.recipient_type, RecipientType::Team);
    }

    #[test]
    fn e2_broadcast_twenty_two_recipients() {
        let cfg = EnrichConfig::default();
        let to: Vec<String> = (0..22).map(|i| format!("r{i}@example.com")).collect();
        let to_refs: Vec<&str> = to.iter().map(String::as_str).collect();
        let filtered = filtered_email(to_refs, vec![], "Announcement for the whole company.", "Company update");
        let enriched = enrich(filtered, "example.com", &cfg);
        assert_eq!(enriched.context.recipient_type, RecipientType::Broadcast);
    }

    #[test]
    fn mixed_audience_when_internal_and_external_recipients() {
        let cfg = EnrichConfig::default();
        let filtered = filtered_email(vec!["a@example.com", "b@external.com"], vec![], "Joint update for both sides.", "Update");
        let enriched = enrich(filtered, "example.com", &cfg);
        assert_eq!(enriched.context.audience, Audience::Mixed);
    }

    #[test]
    fn reply_subject_is_detected() {
        let cfg = EnrichConfig::default();
        let filtered = filtered_email(vec!["a@example.com"], vec![], "Sounds good, thanks!", "Re: Project status");
        let enriched = enrich(filtered, "example.com", &cfg);
        assert_eq!(enriched.context.thread_position, ThreadPosition::Reply);
    }

    #[test]
    fn greeting_and_closing_detected() {
        let cfg = EnrichConfig::default();
        let body = "Hi Sam,\n\nHere is the update you asked for on the project timeline.\n\nBest,\nJordan";
        let filtered = filtered_email(vec!["a@example.com"], vec![], body, "Project timeline");
        let enriched = enrich(filtered, "example.com", &cfg);
        assert!(enriched.context.greeting_present);
        assert!(enriched.context.closing_present);
    }

    #[test]
    fn executive_title_inferred_from_body() {
        let cfg = EnrichConfig::default();
        let body = "Hi, as the VP of engineering I wanted to flag this for your review.";
        let filtered = filtered_email(vec!["a@example.com"], vec![], body, "Review request");
        let enriched = enrich(filtered, "example.com", &cfg);
        assert_eq!(enriched.context.recipient_seniority, Seniority::Executive);
    }

    proptest::proptest! {
        /// Invariant 2 (spec.md §8): `recipient_type` is a strict function of
        /// the to+cc recipient count, independent of body content — matches
        /// `RecipientType::classify` for any count the generator produces.
        #[test]
        fn recipient_type_is_a_strict_function_of_count(to_count in 0usize..5, cc_count in 0usize..30) {
            let cfg = EnrichConfig::default();
            let to: Vec<String> = (0..to_count).map(|i| format!("to{i}@example.com")).collect();
            let cc: Vec<String> = (0..cc_count).map(|i| format!("cc{i}@example.com")).collect();
            let to_refs: Vec<&str> = to.iter().map(String::as_str).collect();
            let cc_refs: Vec<&str> = cc.iter().map(String::as_str).collect();
            let filtered = filtered_email(to_refs, cc_refs, "Some body text for the message.", "Subject");
            let enriched = enrich(filtered, "example.com", &cfg);
            prop_assert_eq!(enriched.context.recipient_type, RecipientType::classify(to_count + cc_count));
        }
    }
}
