//! Groups embedding vectors into personas with a density-based (DBSCAN) or
//! partitional (k-means++) algorithm (spec.md §4.5).
//!
//! No clustering crate exists anywhere in the retrieved example pack, so
//! both algorithms are implemented directly over `Vec<Vec<f32>>`. Cluster ID
//! assignment (descending size, min-member-id tiebreak) and silhouette
//! scoring are plain functions over the result, independent of which
//! algorithm produced it.

use std::collections::HashSet;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use voicecast_config::{ClusterAlgorithmChoice, ClusterConfig};
use voicecast_core::ids::{ClusterId, MessageId};
use voicecast_core::model::{Cluster, ClusterAlgorithm, ClusterRun};

/// Recommend an explicit `k` from corpus size (spec.md §4.5 health heuristics).
pub fn recommend_k(corpus_size: usize) -> Option<usize> {
    match corpus_size {
        100..=199 => Some(4),
        200..=499 => Some(5),
        500.. => Some(6),
        _ => None,
    }
}

pub fn run_clustering(
    ids: &[MessageId],
    vectors: &[Vec<f32>],
    cfg: &ClusterConfig,
) -> ClusterRun {
    assert_eq!(ids.len(), vectors.len(), "ids and vectors must be parallel");

    let (algorithm, assignments, noise): (ClusterAlgorithm, Vec<Option<usize>>, Vec<usize>) =
        match cfg.algorithm {
            ClusterAlgorithmChoice::Density => {
                let (labels, noise_idx) = dbscan(vectors, cfg.min_cluster_size, cfg.min_samples);
                let cluster_count = labels.iter().flatten().collect::<HashSet<_>>().len();
                let noise_ratio = noise_idx.len() as f64 / vectors.len().max(1) as f64;
                if cluster_count < cfg.min_clusters || noise_ratio > cfg.max_noise_ratio {
                    warn!(cluster_count, noise_ratio, "density clustering underperformed, falling back to partitional");
                    let k = cfg.k.unwrap_or_else(|| recommend_k(vectors.len()).unwrap_or(4));
                    let labels = kmeans(vectors, k, cfg.seed);
                    (ClusterAlgorithm::Partitional, labels.into_iter().map(Some).collect(), Vec::new())
                } else {
                    (ClusterAlgorithm::Density, labels, noise_idx)
                }
            }
            ClusterAlgorithmChoice::Partitional => {
                let k = cfg.k.unwrap_or_else(|| recommend_k(vectors.len()).unwrap_or(4));
                let labels = kmeans(vectors, k, cfg.seed);
                (ClusterAlgorithm::Partitional, labels.into_iter().map(Some).collect(), Vec::new())
            }
        };

    build_cluster_run(algorithm, ids, vectors, &assignments, &noise, cfg)
}

fn build_cluster_run(
    algorithm: ClusterAlgorithm,
    ids: &[MessageId],
    vectors: &[Vec<f32>],
    assignments: &[Option<usize>],
    noise_idx: &[usize],
    cfg: &ClusterConfig,
) -> ClusterRun {
    use std::collections::BTreeMap;

    let mut raw_groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, assignment) in assignments.iter().enumerate() {
        if let Some(label) = assignment {
            raw_groups.entry(*label).or_default().push(i);
        }
    }

    // Descending size, ties broken by smallest minimum member id (spec.md §4.5).
    let mut groups: Vec<Vec<usize>> = raw_groups.into_values().collect();
    groups.sort_by(|a, b| {
        b.len().cmp(&a.len()).then_with(|| {
            let min_a = a.iter().map(|&i| &ids[i]).min().cloned();
            let min_b = b.iter().map(|&i| &ids[i]).min().cloned();
            min_a.cmp(&min_b)
        })
    });

    // Per-point s(i), keyed by the point's index into `vectors`/`ids`. Shared
    // by the per-cluster silhouette (mean s(i) over one cluster's members)
    // and the run-level `overall_silhouette` (mean s(i) over every point),
    // so both stats agree on the same underlying values (spec.md §3, §4.5).
    let point_silhouettes = point_silhouettes(&groups, vectors);

    let clusters: Vec<Cluster> = groups
        .iter()
        .enumerate()
        .map(|(new_id, member_indices)| {
            let member_ids: Vec<MessageId> = member_indices.iter().map(|&i| ids[i].clone()).collect();
            let centroid = centroid_of(member_indices, vectors);
            let representative = nearest_to_centroid(member_indices, vectors, &centroid, 5)
                .into_iter()
                .map(|i| ids[i].clone())
                .collect();
            let silhouette = mean_silhouette_for(member_indices, &point_silhouettes);

            Cluster {
                cluster_id: ClusterId(new_id as i32),
                size: member_ids.len(),
                member_ids,
                centroid,
                silhouette,
                representative_samples: representative,
            }
        })
        .collect();

    let overall_silhouette = if clusters.len() >= 2 {
        let all_indices: Vec<usize> = point_silhouettes.iter().map(|(i, _)| *i).collect();
        mean_silhouette_for(&all_indices, &point_silhouettes)
    } else {
        None
    };

    let noise_ids: Vec<MessageId> = noise_idx.iter().map(|&i| ids[i].clone()).collect();
    let noise_ratio = noise_ids.len() as f64 / ids.len().max(1) as f64;

    let cluster_count = clusters.len();
    if !(3..=7).contains(&cluster_count) {
        warn!(cluster_count, "cluster count outside the healthy [3, 7] range");
    }
    if noise_ratio > 0.30 {
        warn!(noise_ratio, "noise ratio above 30%, consider --algorithm partitional");
    }

    ClusterRun {
        algorithm,
        parameters: serde_json::json!({
            "min_cluster_size": cfg.min_cluster_size,
            "min_samples": cfg.min_samples,
            "k": cfg.k,
            "seed": cfg.seed,
        }),
        clusters,
        noise_ids,
        noise_ratio,
        overall_silhouette,
        generated_at: Utc::now(),
        seed: cfg.seed,
        schema_version: 1,
        extra: Default::default(),
    }
}

fn centroid_of(indices: &[usize], vectors: &[Vec<f32>]) -> Vec<f32> {
    let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
    let mut sum = vec![0f32; dim];
    for &i in indices {
        for (d, value) in vectors[i].iter().enumerate() {
            sum[d] += value;
        }
    }
    let n = indices.len().max(1) as f32;
    sum.iter().map(|v| v / n).collect()
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| ((*x - *y) as f64).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn nearest_to_centroid(indices: &[usize], vectors: &[Vec<f32>], centroid: &[f32], k: usize) -> Vec<usize> {
    let mut by_distance: Vec<(usize, f64)> = indices
        .iter()
        .map(|&i| (i, euclidean(&vectors[i], centroid)))
        .collect();
    by_distance.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    by_distance.into_iter().take(k).map(|(i, _)| i).collect()
}

// ── DBSCAN ──────────────────────────────────────────────────────────────────

/// Returns (per-point cluster label or `None` for noise, list of noise indices).
/// `eps` is derived from a k-distance heuristic over `min_samples`.
fn dbscan(vectors: &[Vec<f32>], min_cluster_size: usize, min_samples: usize) -> (Vec<Option<usize>>, Vec<usize>) {
    let n = vectors.len();
    if n == 0 {
        return (Vec::new(), Vec::new());
    }
    let eps = k_distance_eps(vectors, min_samples.max(1));

    let neighbors: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i && euclidean(&vectors[i], &vectors[j]) <= eps)
                .collect()
        })
        .collect();

    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut next_label = 0usize;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        if neighbors[i].len() + 1 < min_samples.max(1) {
            continue; // provisionally noise; may still be absorbed by another core point
        }

        let label = next_label;
        next_label += 1;
        labels[i] = Some(label);

        let mut queue: Vec<usize> = neighbors[i].clone();
        let mut qi = 0;
        while qi < queue.len() {
            let j = queue[qi];
            qi += 1;
            if labels[j].is_none() {
                labels[j] = Some(label);
            }
            if !visited[j] {
                visited[j] = true;
                if neighbors[j].len() + 1 >= min_samples.max(1) {
                    for &nb in &neighbors[j] {
                        if !queue.contains(&nb) {
                            queue.push(nb);
                        }
                    }
                }
            }
        }
    }

    // Drop clusters smaller than min_cluster_size back to noise.
    let mut sizes = std::collections::HashMap::new();
    for label in labels.iter().flatten() {
        *sizes.entry(*label).or_insert(0usize) += 1;
    }
    for label in labels.iter_mut() {
        if let Some(l) = label {
            if sizes[l] < min_cluster_size {
                *label = None;
            }
        }
    }

    let noise_idx: Vec<usize> = (0..n).filter(|&i| labels[i].is_none()).collect();
    (labels, noise_idx)
}

fn k_distance_eps(vectors: &[Vec<f32>], k: usize) -> f64 {
    let n = vectors.len();
    if n <= 1 {
        return 1.0;
    }
    let mut kth_distances: Vec<f64> = Vec::with_capacity(n);
    for i in 0..n {
        let mut distances: Vec<f64> = (0..n)
            .filter(|&j| j != i)
            .map(|j| euclidean(&vectors[i], &vectors[j]))
            .collect();
        distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = k.saturating_sub(1).min(distances.len().saturating_sub(1));
        kth_distances.push(distances.get(idx).copied().unwrap_or(0.0));
    }
    kth_distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    // A conservative elbow proxy: the 75th percentile of k-distances.
    let idx = ((kth_distances.len() as f64) * 0.75) as usize;
    kth_distances.get(idx.min(kth_distances.len() - 1)).copied().unwrap_or(1.0)
}

// ── k-means++ ───────────────────────────────────────────────────────────────

fn kmeans(vectors: &[Vec<f32>], k: usize, seed: u64) -> Vec<usize> {
    let n = vectors.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    let k = k.min(n);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    let first = rng.gen_range(0..n);
    centroids.push(vectors[first].clone());

    while centroids.len() < k {
        let distances: Vec<f64> = vectors
            .iter()
            .map(|v| {
                centroids
                    .iter()
                    .map(|c| euclidean(v, c))
                    .fold(f64::MAX, f64::min)
                    .powi(2)
            })
            .collect();
        let total: f64 = distances.iter().sum();
        if total <= 0.0 {
            let idx = rng.gen_range(0..n);
            centroids.push(vectors[idx].clone());
            continue;
        }
        let mut target = rng.gen::<f64>() * total;
        let mut chosen = n - 1;
        for (i, d) in distances.iter().enumerate() {
            if target <= *d {
                chosen = i;
                break;
            }
            target -= d;
        }
        centroids.push(vectors[chosen].clone());
    }

    let mut assignments = vec![0usize; n];
    for _ in 0..100 {
        let mut changed = false;
        for (i, v) in vectors.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f64::MAX;
            for (c_idx, c) in centroids.iter().enumerate() {
                let d = euclidean(v, c);
                if d < best_dist {
                    best_dist = d;
                    best = c_idx;
                }
            }
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        for c_idx in 0..k {
            let members: Vec<usize> = (0..n).filter(|&i| assignments[i] == c_idx).collect();
            if !members.is_empty() {
                centroids[c_idx] = centroid_of(&members, vectors);
            }
        }

        if !changed {
            break;
        }
    }

    assignments
}

/// Computes silhouette `s(i)` for every point that has one (points in a
/// singleton group have no defined `a(i)` and are skipped), returned as
/// `(original vector index, s(i))` pairs. `groups` holds indices into
/// `vectors`, one inner `Vec` per non-noise cluster.
fn point_silhouettes(groups: &[Vec<usize>], vectors: &[Vec<f32>]) -> Vec<(usize, f64)> {
    let mut out = Vec::new();

    for (g_idx, group) in groups.iter().enumerate() {
        if group.len() < 2 {
            continue;
        }
        for &i in group {
            let a = group
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| euclidean(&vectors[i], &vectors[j]))
                .sum::<f64>()
                / (group.len() - 1) as f64;

            let b = groups
                .iter()
                .enumerate()
                .filter(|(idx, other)| *idx != g_idx && !other.is_empty())
                .map(|(_, other)| {
                    other.iter().map(|&j| euclidean(&vectors[i], &vectors[j])).sum::<f64>() / other.len() as f64
                })
                .fold(f64::MAX, f64::min);

            if b.is_finite() {
                let s = (b - a) / a.max(b).max(f64::EPSILON);
                out.push((i, s));
            }
        }
    }

    out
}

/// Mean `s(i)` over `indices`, restricted to those present in `points`
/// (computed by [`point_silhouettes`]). `None` when none of `indices` has a
/// defined silhouette (e.g. a singleton cluster) — "when computable"
/// (spec.md §3) means the field is absent, not zero.
fn mean_silhouette_for(indices: &[usize], points: &[(usize, f64)]) -> Option<f64> {
    let wanted: HashSet<usize> = indices.iter().copied().collect();
    let mut total = 0.0;
    let mut count = 0usize;
    for &(idx, s) in points {
        if wanted.contains(&idx) {
            total += s;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<MessageId> {
        (0..n).map(|i| MessageId::from(format!("m{i:03}"))).collect()
    }

    /// E3 (clusterer tie-break): sizes 15 and 12 get ids 0 and 1 respectively.
    #[test]
    fn e3_cluster_ids_by_descending_size() {
        let mut vectors = Vec::new();
        for _ in 0..15 {
            vectors.push(vec![0.0, 0.0]);
        }
        for _ in 0..12 {
            vectors.push(vec![10.0, 10.0]);
        }
        let ids = ids(vectors.len());
        let assignments: Vec<Option<usize>> = (0..15).map(|_| Some(0)).chain((0..12).map(|_| Some(1))).collect();
        let cfg = ClusterConfig::default();
        let run = build_cluster_run(ClusterAlgorithm::Partitional, &ids, &vectors, &assignments, &[], &cfg);

        assert_eq!(run.clusters[0].cluster_id, ClusterId(0));
        assert_eq!(run.clusters[0].size, 15);
        assert_eq!(run.clusters[1].cluster_id, ClusterId(1));
        assert_eq!(run.clusters[1].size, 12);
    }

    /// E3: equal sizes tie-break on the smallest minimum member id.
    #[test]
    fn e3_ties_break_on_smallest_min_member_id() {
        let vectors = vec![vec![0.0]; 20];
        let ids = vec![
            (0..10).map(|i| MessageId::from(format!("z{i}"))).collect::<Vec<_>>(),
            (0..10).map(|i| MessageId::from(format!("a{i}"))).collect::<Vec<_>>(),
        ]
        .concat();
        let assignments: Vec<Option<usize>> = (0..10).map(|_| Some(0)).chain((0..10).map(|_| Some(1))).collect();
        let cfg = ClusterConfig::default();
        let run = build_cluster_run(ClusterAlgorithm::Partitional, &ids, &vectors, &assignments, &[], &cfg);

        // Group 1 (ids starting "a") has the lexicographically smaller min id.
        assert_eq!(run.clusters[0].member_ids[0].as_str().starts_with('a'), true);
    }

    #[test]
    fn cluster_member_ids_are_disjoint() {
        let vectors: Vec<Vec<f32>> = (0..30)
            .map(|i| if i < 15 { vec![0.0, 0.0] } else { vec![20.0, 20.0] })
            .collect();
        let ids = ids(vectors.len());
        let cfg = ClusterConfig {
            algorithm: ClusterAlgorithmChoice::Partitional,
            k: Some(2),
            ..ClusterConfig::default()
        };
        let run = run_clustering(&ids, &vectors, &cfg);
        let mut seen = HashSet::new();
        for cluster in &run.clusters {
            for id in &cluster.member_ids {
                assert!(seen.insert(id.clone()), "member id appeared in more than one cluster");
            }
        }
    }

    #[test]
    fn kmeans_is_deterministic_given_seed() {
        let vectors: Vec<Vec<f32>> = (0..40)
            .map(|i| if i % 2 == 0 { vec![0.0, 0.0] } else { vec![5.0, 5.0] })
            .collect();
        let a = kmeans(&vectors, 2, 7);
        let b = kmeans(&vectors, 2, 7);
        assert_eq!(a, b);
    }

    /// Per-cluster silhouette is populated whenever the cluster has ≥2
    /// members and there's another cluster to measure separation against;
    /// a singleton cluster has no defined `a(i)` and gets `None`.
    #[test]
    fn per_cluster_silhouette_is_populated_when_computable() {
        let mut vectors = Vec::new();
        for _ in 0..15 {
            vectors.push(vec![0.0, 0.0]);
        }
        for _ in 0..12 {
            vectors.push(vec![10.0, 10.0]);
        }
        vectors.push(vec![5.0, -50.0]); // singleton, far from both clusters
        let ids = ids(vectors.len());
        let assignments: Vec<Option<usize>> = (0..15)
            .map(|_| Some(0))
            .chain((0..12).map(|_| Some(1)))
            .chain(std::iter::once(Some(2)))
            .collect();
        let cfg = ClusterConfig::default();
        let run = build_cluster_run(ClusterAlgorithm::Partitional, &ids, &vectors, &assignments, &[], &cfg);

        let well_separated = run.clusters.iter().find(|c| c.size == 15).unwrap();
        assert!(well_separated.silhouette.unwrap() > 0.9);
        let singleton = run.clusters.iter().find(|c| c.size == 1).unwrap();
        assert_eq!(singleton.silhouette, None);
        assert!(run.overall_silhouette.is_some());
    }

    #[test]
    fn recommend_k_by_corpus_size() {
        assert_eq!(recommend_k(150), Some(4));
        assert_eq!(recommend_k(300), Some(5));
        assert_eq!(recommend_k(800), Some(6));
        assert_eq!(recommend_k(50), None);
    }

    proptest::proptest! {
        /// Invariant 4 (spec.md §8): cluster ids are contiguous from 0 and
        /// ordered by descending size, for arbitrary partitions of an
        /// arbitrary point count into up to 6 raw labels.
        #[test]
        fn cluster_ids_are_contiguous_and_size_ordered(
            raw_labels in proptest::collection::vec(0usize..6, 10..120),
        ) {
            let n = raw_labels.len();
            let vectors: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32]).collect();
            let ids = ids(n);
            let assignments: Vec<Option<usize>> = raw_labels.into_iter().map(Some).collect();
            let cfg = ClusterConfig::default();
            let run = build_cluster_run(ClusterAlgorithm::Partitional, &ids, &vectors, &assignments, &[], &cfg);

            for (i, cluster) in run.clusters.iter().enumerate() {
                prop_assert_eq!(cluster.cluster_id, ClusterId(i as i32));
            }
            for window in run.clusters.windows(2) {
                prop_assert!(window[0].size >= window[1].size);
            }
            let total: usize = run.clusters.iter().map(|c| c.size).sum();
            prop_assert_eq!(total + run.noise_ids.len(), n);
        }
    }
}
