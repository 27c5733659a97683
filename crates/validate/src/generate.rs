//! Produces a generated reply for a [`ValidationPair`], either via an
//! external chat-completion call (phase 1a, preferred) or, with no provider
//! key, by composing directly from the persona's structural fields
//! (spec.md §4.9 step 2).

use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::warn;

use voicecast_config::ValidationConfig;
use voicecast_core::model::Persona;
use voicecast_llm::{ChatMessage, LlmRouter};

/// The validator must not have seen the training messages in the same LLM
/// context (spec.md §4.9) — the system prompt carries only the persona
/// profile, never the cluster's source emails.
fn system_prompt(persona: &Persona) -> String {
    format!(
        "You are drafting an email reply in a specific writing voice. Do not mention that you are an AI.\n\
         Voice profile \"{name}\":\n\
         - tone (1-10): formality={formality} warmth={warmth} authority={authority} directness={directness}\n\
         - typical greeting: \"{greeting}\"\n\
         - typical closing: \"{closing}\"\n\
         - bullet usage rate: {bullets:.2}\n\
         - contraction rate: {contractions:.2}\n\
         - average reply length: {length:.0} words\n\
         Write only the reply body, matching this voice.",
        name = persona.name,
        formality = persona.tone_vector.formality,
        warmth = persona.tone_vector.warmth,
        authority = persona.tone_vector.authority,
        directness = persona.tone_vector.directness,
        greeting = persona.typical_greeting,
        closing = persona.typical_closing,
        bullets = persona.bullet_usage,
        contractions = persona.contraction_rate,
        length = persona.average_length_words,
    )
}

/// Calls the external validator LLM with a per-call timeout and bounded
/// retries on transient failure (spec.md §5: 60s canonical timeout, 2
/// retries with exponential backoff; hard errors propagate).
pub async fn generate_reply_llm(
    router: &LlmRouter,
    model: &str,
    persona: &Persona,
    context: &str,
    cfg: &ValidationConfig,
) -> Result<String> {
    let messages = vec![ChatMessage::system(system_prompt(persona)), ChatMessage::user(context)];

    let mut attempt = 0u32;
    loop {
        let call = router.chat_messages(model, &messages);
        let outcome = tokio::time::timeout(Duration::from_secs(cfg.http_timeout_secs), call).await;

        match outcome {
            Ok(Ok(response)) if !response.content.trim().is_empty() => return Ok(response.content),
            Ok(Ok(response)) => {
                return Err(anyhow!("validator LLM returned an empty reply: {:?}", response.finish_reason))
            }
            Ok(Err(err)) if attempt < cfg.max_retries => {
                warn!(attempt, error = %err, "validator LLM call failed, retrying");
            }
            Ok(Err(err)) => return Err(err),
            Err(_) if attempt < cfg.max_retries => {
                warn!(attempt, timeout_secs = cfg.http_timeout_secs, "validator LLM call timed out, retrying");
            }
            Err(_) => return Err(anyhow!("validator LLM call timed out after {} retries", cfg.max_retries)),
        }

        tokio::time::sleep(Duration::from_millis(200 * 2u64.pow(attempt))).await;
        attempt += 1;
    }
}

/// Composes a reply purely from the persona's structural fields when no
/// provider key is configured — deterministic, no network call.
pub fn generate_reply_fallback(persona: &Persona) -> String {
    let body_sentences = (persona.average_length_words / 12.0).round().max(1.0) as usize;
    let mut body = String::new();
    if !persona.typical_greeting.trim().is_empty() {
        body.push_str(persona.typical_greeting.trim());
        body.push_str(",\n\n");
    }
    for i in 0..body_sentences {
        if persona.bullet_usage > 0.3 {
            body.push_str(&format!("- point {}\n", i + 1));
        } else {
            body.push_str("Thanks for the note — here's where things stand. ");
        }
    }
    body.push_str("\n\n");
    if !persona.typical_closing.trim().is_empty() {
        body.push_str(persona.typical_closing.trim());
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicecast_core::ids::ClusterId;
    use voicecast_core::tone::ToneVector;

    fn persona() -> Persona {
        Persona {
            name: "Direct Reports".to_string(),
            tone_vector: ToneVector::new(4, 6, 6, 7).unwrap(),
            typical_greeting: "Hi team".to_string(),
            typical_closing: "Thanks".to_string(),
            bullet_usage: 0.6,
            contraction_rate: 0.3,
            average_length_words: 60.0,
            dominant_recipient_types: vec![],
            examples: vec![],
            cluster_id: ClusterId(0),
            confidence: 0.8,
            sample_count: 12,
            schema_version: 1,
            extra: Default::default(),
        }
    }

    #[test]
    fn fallback_reply_uses_persona_greeting_and_closing() {
        let p = persona();
        let reply = generate_reply_fallback(&p);
        assert!(reply.starts_with("Hi team"));
        assert!(reply.trim_end().ends_with("Thanks"));
        assert!(reply.contains("- point 1"));
    }
}
