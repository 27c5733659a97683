//! Per-post heuristic scorers feeding [`crate::unify`]. Same texture as
//! `aigent-memory::sentiment::infer_valence`: small `const &[&str]` lexicons,
//! a short negation lookback, explicit clamping — no NLP dependency.

const CONTRACTIONS: &[&str] = &["n't", "'re", "'ve", "'ll", "'d", "'m"];
const HEDGING_WORDS: &[&str] = &["maybe", "perhaps", "might", "could", "possibly", "i think", "i guess", "sort of", "kind of"];
const GRATITUDE_WORDS: &[&str] = &["thank", "thanks", "grateful", "appreciate", "appreciated"];
const SECOND_PERSON: &[&str] = &["you", "your", "you're", "yours", "y'all"];
const IMPERATIVE_STARTERS: &[&str] = &[
    "do", "don't", "try", "start", "stop", "take", "make", "build", "learn", "remember", "consider", "ask", "stay", "focus",
];
const HOOK_QUESTION_MARKERS: &[&str] = &["?"];
const HOOK_CTA_WORDS: &[&str] = &["comment", "share", "follow", "dm me", "let me know", "click", "read more", "sign up"];

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(|c| c == '.' || c == '!' || c == '?')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fraction of words that are contractions, plus a long-word-rate penalty,
/// mapped to a 1-10 formality score (low contraction + long words = formal).
pub fn formality(text: &str) -> f64 {
    let toks = words(text);
    if toks.is_empty() {
        return 5.0;
    }
    let contraction_rate = toks.iter().filter(|w| CONTRACTIONS.iter().any(|c| w.contains(c))).count() as f64 / toks.len() as f64;
    let long_word_rate = toks.iter().filter(|w| w.chars().count() >= 7).count() as f64 / toks.len() as f64;
    let score = 5.0 - contraction_rate * 15.0 + long_word_rate * 10.0;
    score.clamp(1.0, 10.0)
}

/// Second-person pronouns, gratitude lexicon, and exclamations push warmth up.
pub fn warmth(text: &str) -> f64 {
    let toks = words(text);
    if toks.is_empty() {
        return 5.0;
    }
    let pronoun_rate = toks.iter().filter(|w| SECOND_PERSON.contains(&w.as_str())).count() as f64 / toks.len() as f64;
    let gratitude_hits = toks.iter().filter(|w| GRATITUDE_WORDS.iter().any(|g| w.contains(g))).count();
    let exclamations = text.chars().filter(|&c| c == '!').count();
    let score = 5.0 + pronoun_rate * 20.0 + gratitude_hits as f64 * 0.8 + (exclamations as f64 * 0.3).min(1.5);
    score.clamp(1.0, 10.0)
}

/// Declarative-sentence ratio minus hedging rate.
pub fn authority(text: &str) -> f64 {
    let sents = sentences(text);
    if sents.is_empty() {
        return 5.0;
    }
    let declarative_ratio = sents.iter().filter(|s| !s.trim_end().ends_with('?')).count() as f64 / sents.len() as f64;
    let lower = text.to_lowercase();
    let hedge_hits = HEDGING_WORDS.iter().filter(|h| lower.contains(*h)).count();
    let score = 5.0 + (declarative_ratio - 0.5) * 8.0 - hedge_hits as f64 * 1.2;
    score.clamp(1.0, 10.0)
}

/// Imperative-sentence rate and short-sentence rate.
pub fn directness(text: &str) -> f64 {
    let sents = sentences(text);
    if sents.is_empty() {
        return 5.0;
    }
    let imperative_hits = sents
        .iter()
        .filter(|s| {
            s.split_whitespace()
                .next()
                .map(|w| IMPERATIVE_STARTERS.contains(&w.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .count();
    let short_rate = sents.iter().filter(|s| s.split_whitespace().count() <= 8).count() as f64 / sents.len() as f64;
    let score = 5.0 + (imperative_hits as f64 / sents.len() as f64) * 10.0 + short_rate * 5.0;
    score.clamp(1.0, 10.0)
}

pub fn sentence_lengths_words(text: &str) -> Vec<usize> {
    sentences(text).iter().map(|s| s.split_whitespace().count()).collect()
}

pub fn emoji_count(text: &str) -> usize {
    text.chars().filter(|c| is_emoji(*c)).count()
}

fn is_emoji(c: char) -> bool {
    let code = c as u32;
    (0x1F300..=0x1FAFF).contains(&code) || (0x2600..=0x27BF).contains(&code)
}

pub fn hashtags(text: &str) -> Vec<&str> {
    text.split_whitespace().filter(|w| w.starts_with('#') && w.len() > 1).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashtagPlacement {
    Start,
    Inline,
    End,
}

impl HashtagPlacement {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashtagPlacement::Start => "start",
            HashtagPlacement::Inline => "inline",
            HashtagPlacement::End => "end",
        }
    }
}

pub fn hashtag_placement(text: &str) -> Option<HashtagPlacement> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() || hashtags(text).is_empty() {
        return None;
    }
    let first_has = hashtags(lines[0]).len() > 0;
    let last_has = lines.last().map(|l| !hashtags(l).is_empty()).unwrap_or(false);
    if last_has && lines.len() > 1 {
        Some(HashtagPlacement::End)
    } else if first_has {
        Some(HashtagPlacement::Start)
    } else {
        Some(HashtagPlacement::Inline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookStyle {
    Question,
    CallToAction,
    Observation,
}

impl HookStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookStyle::Question => "question",
            HookStyle::CallToAction => "call_to_action",
            HookStyle::Observation => "observation",
        }
    }
}

/// Classify the opening line of a post (spec.md §4.8).
pub fn hook_style(text: &str) -> HookStyle {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").to_lowercase();
    if HOOK_QUESTION_MARKERS.iter().any(|m| first_line.contains(m)) {
        return HookStyle::Question;
    }
    if HOOK_CTA_WORDS.iter().any(|w| first_line.contains(w)) {
        return HookStyle::CallToAction;
    }
    HookStyle::Observation
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClosingStyle {
    Question,
    CallToAction,
    Reflection,
}

impl ClosingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosingStyle::Question => "question",
            ClosingStyle::CallToAction => "call_to_action",
            ClosingStyle::Reflection => "reflection",
        }
    }
}

pub fn closing_style(text: &str) -> ClosingStyle {
    let last_line = text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").to_lowercase();
    if HOOK_CTA_WORDS.iter().any(|w| last_line.contains(w)) {
        return ClosingStyle::CallToAction;
    }
    if last_line.trim_end().ends_with('?') {
        return ClosingStyle::Question;
    }
    ClosingStyle::Reflection
}
