//! `LinkedInUnifier`: engagement-weighted, centroid-based unification of a
//! LinkedIn post corpus into a single persona (spec.md §4.8).
//!
//! Brand consistency matters more than context adaptation here, so unlike
//! `EmailClusterer` there is exactly one output persona, never a registry.

pub mod concurrency;
pub mod heuristics;

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use voicecast_config::LinkedInConfig;
use voicecast_core::model::{EditorialVoice, LinkedInExample, LinkedInPersona, RawLinkedInPost};
use voicecast_core::tone::ToneVector;

/// Pulls the raw post corpus from a [`voicecast_fetch::RawMessageSource`].
/// The bounded worker pool in [`concurrency`] exists for a future scraper
/// that fetches posts one at a time; the in-scope sources (mock, JSON-file)
/// already hand back the whole batch synchronously.
pub fn load_posts(source: &dyn voicecast_fetch::RawMessageSource) -> anyhow::Result<Vec<RawLinkedInPost>> {
    source.fetch_linkedin_posts()
}

struct WeightedPost<'a> {
    post: &'a RawLinkedInPost,
    weight: f64,
}

/// `w = 1 + ln(1 + likes + 2*comments)` (spec.md §4.8): resonant posts
/// influence the persona more, but logarithmically, so a single viral post
/// cannot dominate (E5 scenario).
fn engagement_weight(post: &RawLinkedInPost) -> f64 {
    1.0 + ((1.0 + post.likes as f64 + 2.0 * post.comments as f64).ln())
}

fn dedup_by_url(posts: Vec<&RawLinkedInPost>) -> Vec<&RawLinkedInPost> {
    let mut seen = HashSet::new();
    posts.into_iter().filter(|p| seen.insert(p.url.clone())).collect()
}

/// Builds the single [`LinkedInPersona`] for `posts` (spec.md §4.8).
pub fn unify(posts: &[RawLinkedInPost], cfg: &LinkedInConfig) -> LinkedInPersona {
    let originals: Vec<&RawLinkedInPost> = posts.iter().filter(|p| !p.is_repost).collect();
    let reposts: Vec<&RawLinkedInPost> = posts.iter().filter(|p| p.is_repost).collect();

    let eligible_originals: Vec<&RawLinkedInPost> =
        originals.into_iter().filter(|p| p.text.trim().chars().count() >= cfg.min_original_chars).collect();

    let contributing_reposts: Vec<&RawLinkedInPost> =
        reposts.iter().filter(|p| p.text.trim().chars().count() >= cfg.min_commentary_chars).copied().collect();

    let primary_corpus: Vec<&RawLinkedInPost> = dedup_by_url(eligible_originals.into_iter().chain(contributing_reposts).collect());

    let editorial_voice = if reposts.is_empty() {
        None
    } else {
        let total_len: usize = reposts.iter().map(|p| p.text.trim().chars().count()).sum();
        Some(EditorialVoice {
            sample_count: reposts.len(),
            average_commentary_length: total_len as f64 / reposts.len() as f64,
        })
    };

    if primary_corpus.is_empty() {
        warn!("no LinkedIn posts met the original-length threshold; emitting an empty low-confidence persona");
        return empty_persona(editorial_voice);
    }

    let weighted: Vec<WeightedPost> = primary_corpus.iter().map(|&post| WeightedPost { post, weight: engagement_weight(post) }).collect();
    let total_weight: f64 = weighted.iter().map(|w| w.weight).sum();

    let tone_vector = weighted_tone_vector(&weighted, total_weight);

    let sentence_lengths: Vec<(f64, f64)> = weighted
        .iter()
        .flat_map(|w| heuristics::sentence_lengths_words(&w.post.text).into_iter().map(move |len| (len as f64, w.weight)))
        .collect();
    let average_sentence_length = weighted_mean(&sentence_lengths);
    let short_sentence_ratio = weighted_fraction(&sentence_lengths, |len| len <= 8.0);

    let emoji_counts: Vec<usize> = weighted.iter().map(|w| heuristics::emoji_count(&w.post.text)).collect();
    let emoji_per_post_min = emoji_counts.iter().copied().min().unwrap_or(0) as f64;
    let emoji_per_post_max = emoji_counts.iter().copied().max().unwrap_or(0) as f64;

    let question_points: Vec<(f64, f64)> = weighted.iter().map(|w| (if w.post.text.contains('?') { 1.0 } else { 0.0 }, w.weight)).collect();
    let question_rate = weighted_mean(&question_points);
    let exclamation_points: Vec<(f64, f64)> = weighted.iter().map(|w| (if w.post.text.contains('!') { 1.0 } else { 0.0 }, w.weight)).collect();
    let exclamation_rate = weighted_mean(&exclamation_points);

    let hashtag_counts: Vec<(f64, f64)> = weighted.iter().map(|w| (heuristics::hashtags(&w.post.text).len() as f64, w.weight)).collect();
    let hashtag_frequency = weighted_mean(&hashtag_counts);
    let posts_with_hashtags: Vec<usize> = weighted.iter().map(|w| heuristics::hashtags(&w.post.text).len()).filter(|&n| n > 0).collect();
    let hashtag_count_min = posts_with_hashtags.iter().copied().min().unwrap_or(0) as u32;
    let hashtag_count_max = posts_with_hashtags.iter().copied().max().unwrap_or(0) as u32;
    let hashtag_placement = majority_placement(&weighted);

    let (hook_style_distribution, dominant_hook_style) = hook_distribution(&weighted);
    let closing_style_distribution = closing_distribution(&weighted);

    let lengths: Vec<(f64, f64)> = weighted.iter().map(|w| (w.post.text.chars().count() as f64, w.weight)).collect();
    let length_min_chars = weighted_percentile(&lengths, 0.10);
    let length_target_chars = weighted_percentile(&lengths, 0.50);
    let length_max_chars = weighted_percentile(&lengths, 0.90);

    let example_bank = build_example_bank(&primary_corpus, cfg.example_bank_size);

    let sample_size = primary_corpus.len();
    let confidence = confidence_for(sample_size);
    if confidence < 0.7 {
        warn!(sample_size, confidence, "LinkedIn persona confidence below 0.7");
    }

    LinkedInPersona {
        tone_vector,
        average_sentence_length,
        short_sentence_ratio,
        emoji_per_post_min,
        emoji_per_post_max,
        question_rate,
        exclamation_rate,
        hashtag_frequency,
        hashtag_count_min,
        hashtag_count_max,
        hashtag_placement,
        hook_style_distribution,
        dominant_hook_style,
        closing_style_distribution,
        length_target_chars,
        length_min_chars,
        length_max_chars,
        example_bank,
        guardrails: Vec::new(),
        off_limits_topics: Vec::new(),
        signature_phrases: Vec::new(),
        editorial_voice,
        confidence,
        sample_size,
        schema_version: 1,
    }
}

fn empty_persona(editorial_voice: Option<EditorialVoice>) -> LinkedInPersona {
    LinkedInPersona {
        tone_vector: ToneVector::new(5, 5, 5, 5).unwrap(),
        average_sentence_length: 0.0,
        short_sentence_ratio: 0.0,
        emoji_per_post_min: 0.0,
        emoji_per_post_max: 0.0,
        question_rate: 0.0,
        exclamation_rate: 0.0,
        hashtag_frequency: 0.0,
        hashtag_count_min: 0,
        hashtag_count_max: 0,
        hashtag_placement: "end".to_string(),
        hook_style_distribution: BTreeMap::new(),
        dominant_hook_style: "observation".to_string(),
        closing_style_distribution: BTreeMap::new(),
        length_target_chars: 0.0,
        length_min_chars: 0.0,
        length_max_chars: 0.0,
        example_bank: Vec::new(),
        guardrails: Vec::new(),
        off_limits_topics: Vec::new(),
        signature_phrases: Vec::new(),
        editorial_voice,
        confidence: 0.0,
        sample_size: 0,
        schema_version: 1,
    }
}

fn weighted_tone_vector(weighted: &[WeightedPost], total_weight: f64) -> ToneVector {
    if total_weight <= 0.0 {
        return ToneVector::new(5, 5, 5, 5).unwrap();
    }
    let mut formality = 0.0;
    let mut warmth_sum = 0.0;
    let mut authority_sum = 0.0;
    let mut directness_sum = 0.0;
    for w in weighted {
        formality += heuristics::formality(&w.post.text) * w.weight;
        warmth_sum += heuristics::warmth(&w.post.text) * w.weight;
        authority_sum += heuristics::authority(&w.post.text) * w.weight;
        directness_sum += heuristics::directness(&w.post.text) * w.weight;
    }
    ToneVector::clamped(
        formality / total_weight,
        warmth_sum / total_weight,
        authority_sum / total_weight,
        directness_sum / total_weight,
    )
}

fn weighted_mean(points: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = points.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    points.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight
}

fn weighted_fraction(points: &[(f64, f64)], predicate: impl Fn(f64) -> bool) -> f64 {
    let total_weight: f64 = points.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    points.iter().filter(|(v, _)| predicate(*v)).map(|(_, w)| w).sum::<f64>() / total_weight
}

/// Weighted quantile by cumulative weight: sorts `points` by value, then
/// returns the value at which cumulative weight first reaches `quantile`
/// of the total.
fn weighted_percentile(points: &[(f64, f64)], quantile: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<(f64, f64)> = points.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let total_weight: f64 = sorted.iter().map(|(_, w)| w).sum();
    let target = total_weight * quantile;
    let mut cumulative = 0.0;
    for (value, weight) in &sorted {
        cumulative += weight;
        if cumulative >= target {
            return *value;
        }
    }
    sorted.last().map(|(v, _)| *v).unwrap_or(0.0)
}

fn majority_placement(weighted: &[WeightedPost]) -> String {
    let mut counts: BTreeMap<&'static str, f64> = BTreeMap::new();
    for w in weighted {
        if let Some(placement) = heuristics::hashtag_placement(&w.post.text) {
            *counts.entry(placement.as_str()).or_insert(0.0) += w.weight;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "end".to_string())
}

fn hook_distribution(weighted: &[WeightedPost]) -> (BTreeMap<String, f64>, String) {
    let mut counts: BTreeMap<&'static str, f64> = BTreeMap::new();
    let total_weight: f64 = weighted.iter().map(|w| w.weight).sum();
    for w in weighted {
        *counts.entry(heuristics::hook_style(&w.post.text).as_str()).or_insert(0.0) += w.weight;
    }
    let distribution: BTreeMap<String, f64> = counts
        .iter()
        .map(|(name, weight)| (name.to_string(), if total_weight > 0.0 { weight / total_weight } else { 0.0 }))
        .collect();
    let dominant = counts
        .into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "observation".to_string());
    (distribution, dominant)
}

fn closing_distribution(weighted: &[WeightedPost]) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<&'static str, f64> = BTreeMap::new();
    let total_weight: f64 = weighted.iter().map(|w| w.weight).sum();
    for w in weighted {
        *counts.entry(heuristics::closing_style(&w.post.text).as_str()).or_insert(0.0) += w.weight;
    }
    counts
        .into_iter()
        .map(|(name, weight)| (name.to_string(), if total_weight > 0.0 { weight / total_weight } else { 0.0 }))
        .collect()
}

/// Top post by raw engagement becomes the primary example; ties broken by
/// length (longer wins); up to `cap` retained (spec.md §4.8).
fn build_example_bank(posts: &[&RawLinkedInPost], cap: usize) -> Vec<LinkedInExample> {
    let mut ranked: Vec<&&RawLinkedInPost> = posts.iter().collect();
    ranked.sort_by(|a, b| {
        let engagement_a = a.likes + a.comments;
        let engagement_b = b.likes + b.comments;
        engagement_b
            .cmp(&engagement_a)
            .then_with(|| b.text.chars().count().cmp(&a.text.chars().count()))
    });
    ranked
        .into_iter()
        .take(cap)
        .map(|post| LinkedInExample {
            message_id: post.id.clone(),
            text: post.text.clone(),
            likes: post.likes,
            comments: post.comments,
        })
        .collect()
}

/// `min(1, sample_size/20) * quality_factor` (spec.md §4.8).
fn confidence_for(sample_size: usize) -> f64 {
    let sample_size_term = (sample_size as f64 / 20.0).min(1.0);
    let quality_factor = match sample_size {
        0..=4 => 0.3,
        5..=9 => 0.5,
        10..=14 => 0.7,
        _ => 1.0,
    };
    sample_size_term * quality_factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicecast_core::ids::MessageId;

    fn post(id: &str, text: &str, likes: u64, comments: u64) -> RawLinkedInPost {
        RawLinkedInPost {
            id: MessageId::from(id),
            text: text.to_string(),
            url: format!("https://linkedin.com/posts/{id}"),
            likes,
            comments,
            shares: 0,
            top_comments: vec![],
            tagged_entities: vec![],
            author: "me".to_string(),
            posted_at: chrono::DateTime::UNIX_EPOCH,
            is_repost: false,
            original: None,
        }
    }

    fn long_neutral_text(marker: &str) -> String {
        format!(
            "Here is a reflection on building great teams and shipping good work. {marker} \
             It takes patience, clear communication, and a willingness to learn from mistakes \
             along the way, and I have found that consistency matters more than intensity."
        )
    }

    /// E5: five posts with likes [10,10,10,10,500], one viral outlier with a
    /// higher formality score; log weighting should bound its influence.
    #[test]
    fn e5_log_weighting_bounds_viral_post_influence() {
        let cfg = LinkedInConfig::default();
        let mut posts = Vec::new();
        for i in 0..4 {
            posts.push(post(&format!("p{i}"), &long_neutral_text("casual take"), 10, 0));
        }
        let formal_text = "Dear colleagues, I am writing to share an important organizational observation regarding leadership effectiveness and collaborative workplace dynamics across distributed teams.";
        posts.push(post("viral", formal_text, 500, 0));

        let persona = unify(&posts, &cfg);
        assert!(persona.tone_vector.formality > 5, "expected > 5, got {}", persona.tone_vector.formality);
        assert!(persona.tone_vector.formality < 7, "expected < 7, got {}", persona.tone_vector.formality);
    }

    #[test]
    fn posts_below_original_length_threshold_are_dropped() {
        let cfg = LinkedInConfig::default();
        let posts = vec![post("short", "too short to count", 5, 1)];
        let persona = unify(&posts, &cfg);
        assert_eq!(persona.sample_size, 0);
    }

    #[test]
    fn repost_with_short_commentary_only_feeds_editorial_voice() {
        let cfg = LinkedInConfig::default();
        let mut repost = post("r1", "Love this!", 3, 0);
        repost.is_repost = true;
        let posts = vec![repost];
        let persona = unify(&posts, &cfg);
        assert_eq!(persona.sample_size, 0);
        let editorial = persona.editorial_voice.unwrap();
        assert_eq!(editorial.sample_count, 1);
    }

    #[test]
    fn repost_with_long_commentary_feeds_primary_tone_vector() {
        let cfg = LinkedInConfig::default();
        let mut originals = vec![post("o0", &long_neutral_text("a"), 20, 2), post("o1", &long_neutral_text("b"), 15, 1)];
        let mut repost = post("r1", &long_neutral_text("c"), 25, 3);
        repost.is_repost = true;
        originals.push(repost);
        let persona = unify(&originals, &cfg);
        assert_eq!(persona.sample_size, 3);
    }

    #[test]
    fn confidence_penalizes_small_corpora() {
        assert_eq!(confidence_for(3), 0.3 * (3.0 / 20.0));
        assert_eq!(confidence_for(20), 1.0);
    }

    #[test]
    fn duplicate_urls_are_deduplicated() {
        let cfg = LinkedInConfig::default();
        let mut a = post("dup", &long_neutral_text("x"), 5, 1);
        let mut b = post("dup2", &long_neutral_text("x"), 5, 1);
        b.url = a.url.clone();
        a.id = MessageId::from("a");
        b.id = MessageId::from("b");
        let persona = unify(&[a, b], &cfg);
        assert_eq!(persona.sample_size, 1);
    }

    /// Tone components always land in [1, 10] regardless of input mix
    /// (spec.md §8 invariant 9).
    #[test]
    fn tone_components_always_in_range() {
        let cfg = LinkedInConfig::default();
        let posts = vec![post("a", &long_neutral_text("z"), 1000, 500), post("b", &long_neutral_text("y"), 0, 0)];
        let persona = unify(&posts, &cfg);
        for component in persona.tone_vector.as_array() {
            assert!((1..=10).contains(&component));
        }
    }

    proptest::proptest! {
        /// Invariant 9 (spec.md §8): doubling every post's engagement counts
        /// is near scale-invariant under the log-weighted mean. The `1 +`
        /// offset inside the log means this repo does not hit byte-identical
        /// exactly (spec.md explicitly allows a documented epsilon for that
        /// case) — so this asserts the tone vector moves by at most one
        /// integer step per component rather than not at all.
        #[test]
        fn doubling_engagement_nearly_preserves_tone_vector(
            likes in proptest::collection::vec(0u64..500, 3..8),
            comments in proptest::collection::vec(0u64..200, 3..8),
        ) {
            let cfg = LinkedInConfig::default();
            let n = likes.len().min(comments.len());
            let texts = ["casual take", "another angle", "a third view", "fourth thought", "fifth note", "sixth remark", "seventh idea", "eighth line"];
            let posts: Vec<RawLinkedInPost> = (0..n)
                .map(|i| post(&format!("p{i}"), &long_neutral_text(texts[i % texts.len()]), likes[i], comments[i]))
                .collect();
            let doubled: Vec<RawLinkedInPost> = posts
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let mut d = p.clone();
                    d.id = MessageId::from(format!("d{i}"));
                    d.likes *= 2;
                    d.comments *= 2;
                    d
                })
                .collect();

            let original = unify(&posts, &cfg);
            let scaled = unify(&doubled, &cfg);

            prop_assume!(original.sample_size > 0 && scaled.sample_size > 0);
            for (a, b) in original.tone_vector.as_array().iter().zip(scaled.tone_vector.as_array().iter()) {
                prop_assert!((*a as i32 - *b as i32).abs() <= 1);
            }
        }
    }
}
