//! `BatchIngester`: a pure function merging a caller-submitted [`BatchFile`]
//! into the [`PersonaRegistry`] (spec.md §4.7). No I/O here — the CLI layer
//! reads the batch file and writes the registry back atomically; this
//! module only knows how to fold one into the other.

use anyhow::Context;
use voicecast_config::BatchConfig;
use voicecast_core::error::PipelineError;
use voicecast_core::model::{BatchFile, ClusterCoverage, ClusterRun, Persona, PersonaExample, PersonaRegistry};

/// Folds `batch` into `registry`, honoring the cluster's coverage
/// requirement unless `force` is set.
///
/// - Unknown personas referenced by a sample must appear in
///   `batch.new_personas` (freshly introduced this batch) or already exist
///   in the registry; anything else is a schema error.
/// - Existing personas are merged via [`voicecast_core::tone::ToneVector::weighted_mean`],
///   weighted by prior `sample_count` against this batch's sample count for
///   that persona.
/// - `batch.cluster_complete` is only honored once the post-ingest coverage
///   ratio actually meets `cfg.target_coverage`; otherwise ingestion fails
///   with [`PipelineError::Coverage`] even though the samples themselves
///   are still folded in (spec.md's E4 scenario: the caller can resubmit
///   with more members rather than redo the whole batch).
pub fn ingest(
    batch: BatchFile,
    mut registry: PersonaRegistry,
    run: &ClusterRun,
    cfg: &BatchConfig,
    force: bool,
) -> Result<PersonaRegistry, PipelineError> {
    if !batch.calibration_referenced {
        return Err(PipelineError::Schema {
            field_path: "calibration_referenced".to_string(),
            message: "batch must set calibration_referenced=true".to_string(),
        });
    }

    let cluster = run.find(batch.cluster_id).ok_or_else(|| PipelineError::Schema {
        field_path: "cluster_id".to_string(),
        message: format!("no such cluster in the current run: {}", batch.cluster_id),
    })?;

    let known_new: std::collections::HashSet<&str> =
        batch.new_personas.iter().map(|p| p.name.as_str()).collect();

    for sample in &batch.samples {
        let exists = registry.personas.contains_key(&sample.persona_name) || known_new.contains(sample.persona_name.as_str());
        if !exists {
            return Err(PipelineError::Schema {
                field_path: format!("samples[{}].persona_name", sample.message_id),
                message: format!(
                    "persona '{}' is neither in the registry nor in new_personas for this batch",
                    sample.persona_name
                ),
            });
        }
        if !cluster.member_ids.contains(&sample.message_id) {
            return Err(PipelineError::Schema {
                field_path: format!("samples[{}].message_id", sample.message_id),
                message: format!("message is not a member of cluster {}", batch.cluster_id),
            });
        }
    }

    for mut new_persona in batch.new_personas {
        new_persona.reselect_examples();
        match registry.personas.get_mut(&new_persona.name) {
            Some(existing) => merge_persona(existing, &new_persona),
            None => {
                registry.personas.insert(new_persona.name.clone(), new_persona);
            }
        }
    }

    let mut per_persona_counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for sample in &batch.samples {
        if registry.ingested.contains_key(&sample.message_id) {
            continue;
        }
        registry.ingested.insert(sample.message_id.clone(), sample.persona_name.clone());
        *per_persona_counts.entry(sample.persona_name.clone()).or_insert(0) += 1;

        if let Some(persona) = registry.personas.get_mut(&sample.persona_name) {
            persona.examples.push(PersonaExample {
                message_id: sample.message_id.clone(),
                excerpt: sample
                    .structural
                    .greeting
                    .clone()
                    .unwrap_or_else(|| sample.message_id.to_string()),
                confidence: sample.confidence,
            });
            persona.reselect_examples();
        }
    }

    for (name, added) in &per_persona_counts {
        if let Some(persona) = registry.personas.get_mut(name) {
            persona.sample_count += added;
        }
    }

    let coverage = registry.cluster_coverage.entry(batch.cluster_id).or_insert(ClusterCoverage {
        cluster_size: cluster.size,
        ingested_count: 0,
    });
    coverage.cluster_size = cluster.size;
    coverage.ingested_count = registry
        .ingested
        .keys()
        .filter(|id| cluster.member_ids.contains(id))
        .count();

    let required = coverage.required_count(cfg.target_coverage);
    if batch.cluster_complete && coverage.ingested_count < required && !force {
        return Err(PipelineError::Coverage {
            have: coverage.ingested_count,
            required,
        });
    }

    Ok(registry)
}

fn merge_persona(existing: &mut Persona, incoming: &Persona) {
    let existing_weight = existing.sample_count.max(1) as f64;
    let incoming_weight = incoming.sample_count.max(1) as f64;
    existing.tone_vector = existing.tone_vector.weighted_mean(existing_weight, &incoming.tone_vector, incoming_weight);

    let total = existing_weight + incoming_weight;
    existing.bullet_usage = (existing.bullet_usage * existing_weight + incoming.bullet_usage * incoming_weight) / total;
    existing.contraction_rate =
        (existing.contraction_rate * existing_weight + incoming.contraction_rate * incoming_weight) / total;
    existing.average_length_words =
        (existing.average_length_words * existing_weight + incoming.average_length_words * incoming_weight) / total;

    for recipient_type in &incoming.dominant_recipient_types {
        if !existing.dominant_recipient_types.contains(recipient_type) {
            existing.dominant_recipient_types.push(*recipient_type);
        }
    }
    existing.examples.extend(incoming.examples.iter().cloned());
    existing.reselect_examples();
    existing.confidence = existing.confidence.max(incoming.confidence);
}

/// Loads a [`BatchFile`] from a JSON byte slice, used by the CLI layer
/// (kept here so ingestion error reporting stays one `Context` call deep).
pub fn parse_batch(bytes: &[u8]) -> anyhow::Result<BatchFile> {
    serde_json::from_slice(bytes).context("parsing batch JSON")
}
