//! Infers which persona should handle a [`MessageContext`] using the same
//! recipient/audience/thread classification the enricher already computed
//! (spec.md §4.9 step 1) — no separate classifier, just a lookup against
//! `Persona::dominant_recipient_types`.

use voicecast_core::model::{MessageContext, PersonaRegistry};

/// Picks the persona whose `dominant_recipient_types` contains the
/// context's recipient type, breaking ties by confidence. Falls back to the
/// single highest-confidence persona in the registry, or `"unassigned"` if
/// the registry is empty (e.g. validation run before any batch ingestion).
pub fn infer_persona_name(context: &MessageContext, registry: &PersonaRegistry) -> String {
    let mut matching: Vec<&voicecast_core::model::Persona> = registry
        .personas
        .values()
        .filter(|p| p.dominant_recipient_types.contains(&context.recipient_type))
        .collect();
    matching.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));

    if let Some(best) = matching.first() {
        return best.name.clone();
    }

    registry
        .personas
        .values()
        .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "unassigned".to_string())
}
