//! Exposes one cluster at a time to the caller-LLM via `Write` (spec.md §4.6).
//!
//! Writes to `Write + Send` rather than hardcoding `println!`, so the
//! preparer is unit-testable against an in-memory buffer — the same reason
//! the teacher's CLI layer threads explicit writers through its `run_*`
//! functions instead of calling `println!` deep in library code.

use std::io::Write;

use anyhow::Result;

use voicecast_config::BatchConfig;
use voicecast_core::ids::ClusterId;
use voicecast_core::model::{Cluster, EnrichedMessage, PersonaRegistry};

use crate::calibration::{render_calibration, render_schema_contract};

pub struct CoverageStatus {
    pub cluster_size: usize,
    pub ingested_count: usize,
    pub required_count: usize,
    pub exposed_this_batch: usize,
}

impl CoverageStatus {
    pub fn met(&self) -> bool {
        self.ingested_count >= self.required_count
    }
}

/// Writes calibration anchors, the schema contract, then the cluster's
/// member emails selected to meet the required coverage, to `out`.
pub fn prepare_batch<W: Write>(
    out: &mut W,
    cluster: &Cluster,
    messages: &[EnrichedMessage],
    registry: &PersonaRegistry,
    cfg: &BatchConfig,
) -> Result<CoverageStatus> {
    let coverage = registry.coverage_for(cluster.cluster_id);
    let required = ((cluster.size as f64) * cfg.target_coverage).ceil() as usize;

    let mut not_ingested: Vec<&EnrichedMessage> = messages
        .iter()
        .filter(|m| cluster.member_ids.contains(&m.filtered.id) && !registry.ingested.contains_key(&m.filtered.id))
        .collect();
    not_ingested.sort_by(|a, b| a.filtered.id.cmp(&b.filtered.id));

    let needed = required.saturating_sub(coverage.ingested_count);
    let to_expose: Vec<&EnrichedMessage> = not_ingested.into_iter().take(needed.max(0)).collect();

    writeln!(out, "# Cluster {} analysis batch", cluster.cluster_id)?;
    writeln!(out, "cluster_size={} already_ingested={} required={}\n", cluster.size, coverage.ingested_count, required)?;
    write!(out, "{}", render_calibration())?;
    write!(out, "{}", render_schema_contract())?;

    writeln!(out, "\n## Cluster members ({} of {} exposed this batch)\n", to_expose.len(), cluster.size)?;
    for message in &to_expose {
        render_message(out, message)?;
    }

    Ok(CoverageStatus {
        cluster_size: cluster.size,
        ingested_count: coverage.ingested_count,
        required_count: required,
        exposed_this_batch: to_expose.len(),
    })
}

fn render_message<W: Write>(out: &mut W, message: &EnrichedMessage) -> Result<()> {
    let body = match &message.filtered.raw {
        voicecast_core::model::RawMessage::Email(email) => email.body.clone(),
        voicecast_core::model::RawMessage::LinkedInPost(post) => post.text.clone(),
    };
    writeln!(out, "### message {}", message.filtered.id)?;
    writeln!(
        out,
        "recipient_type={:?} audience={:?} thread_position={:?} seniority={:?}",
        message.context.recipient_type,
        message.context.audience,
        message.context.thread_position,
        message.context.recipient_seniority
    )?;
    writeln!(out, "```\n{body}\n```\n")?;
    Ok(())
}

/// Required-vs-have counts for CLI `--coverage` reporting (spec.md §4.6).
pub fn coverage_report(cluster: &Cluster, registry: &PersonaRegistry, cfg: &BatchConfig) -> (usize, usize) {
    let coverage = registry.coverage_for(cluster.cluster_id);
    let required = ((cluster.size as f64) * cfg.target_coverage).ceil() as usize;
    (coverage.ingested_count, required)
}

pub fn find_cluster<'a>(clusters: &'a [Cluster], id: ClusterId) -> Option<&'a Cluster> {
    clusters.iter().find(|c| c.cluster_id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicecast_core::ids::MessageId;
    use voicecast_core::model::{Audience, FilteredMessage, MessageContext, RawEmail, RawMessage, RecipientType, Seniority, ThreadPosition, TimeOfDay};

    fn enriched(id: &str, body: &str) -> EnrichedMessage {
        let raw = RawEmail {
            id: MessageId::from(id),
            sender: "me@example.com".to_string(),
            to: vec!["a@example.com".to_string()],
            cc: vec![],
            subject: "s".to_string(),
            body: body.to_string(),
            timestamp: chrono::Utc::now(),
            thread_id: None,
            headers: Default::default(),
        };
        EnrichedMessage {
            filtered: FilteredMessage { id: MessageId::from(id), raw: RawMessage::Email(raw), quality_score: 0.8 },
            context: MessageContext {
                recipient_type: RecipientType::Individual,
                audience: Audience::Internal,
                thread_position: ThreadPosition::Initiating,
                time_of_day: TimeOfDay::Morning,
                is_weekend: false,
                bullet_lines: 0,
                paragraph_count: 1,
                greeting_present: true,
                closing_present: true,
                recipient_seniority: Seniority::Unknown,
            },
        }
    }

    #[test]
    fn exposes_only_what_is_needed_for_coverage() {
        let member_ids: Vec<MessageId> = (0..10).map(|i| MessageId::from(format!("m{i}"))).collect();
        let cluster = Cluster {
            cluster_id: ClusterId(0),
            member_ids: member_ids.clone(),
            centroid: vec![0.0],
            size: 10,
            silhouette: None,
            representative_samples: vec![],
        };
        let messages: Vec<EnrichedMessage> = member_ids.iter().map(|id| enriched(id.as_str(), "hello world this is a decent length body")).collect();
        let registry = PersonaRegistry::default();
        let cfg = BatchConfig::default();

        let mut buf = Vec::new();
        let status = prepare_batch(&mut buf, &cluster, &messages, &registry, &cfg).unwrap();
        // 80% of 10 = 8
        assert_eq!(status.required_count, 8);
        assert_eq!(status.exposed_this_batch, 8);
    }
}
