use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{ClusterId, MessageId};

fn schema_version_v1() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: ClusterId,
    pub member_ids: Vec<MessageId>,
    pub centroid: Vec<f32>,
    pub size: usize,
    pub silhouette: Option<f64>,
    /// The `k` members nearest the centroid, default `k=5` (spec.md §3).
    pub representative_samples: Vec<MessageId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterAlgorithm {
    Density,
    Partitional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRun {
    pub algorithm: ClusterAlgorithm,
    pub parameters: Value,
    pub clusters: Vec<Cluster>,
    pub noise_ids: Vec<MessageId>,
    pub noise_ratio: f64,
    pub overall_silhouette: Option<f64>,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    #[serde(default = "schema_version_v1")]
    pub schema_version: u32,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl ClusterRun {
    pub fn total_members(&self) -> usize {
        self.clusters.iter().map(|c| c.size).sum()
    }

    pub fn find(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.cluster_id == id)
    }

    /// The union of every non-noise member id across all clusters.
    pub fn all_member_ids(&self) -> std::collections::HashSet<&MessageId> {
        self.clusters
            .iter()
            .flat_map(|c| c.member_ids.iter())
            .collect()
    }
}
