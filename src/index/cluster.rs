//! K-means clustering over the stored vectors.
//!
//! Lloyd's algorithm seeded from existing vectors. Small collections skip
//! the iteration entirely: with no more points than clusters, every vector
//! is its own (perfectly coherent) cluster.

use super::{RecordMeta, VectorIndex, VectorRecord};

/// Iteration cap for a single clustering run.
const MAX_ITERATIONS: usize = 100;

/// A centroid move at or below this distance counts as converged.
const CONVERGENCE_EPSILON: f32 = 0.001;

#[derive(Debug, Clone)]
pub struct ClusterMember {
    pub id: String,
    pub meta: RecordMeta,
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: usize,
    pub centroid: Vec<f32>,
    pub members: Vec<ClusterMember>,
    /// Internal tightness in [0.0, 1.0]: 1.0 when every member coincides
    /// with the centroid, clamped at 0.0 once members drift as far as their
    /// own magnitude.
    pub coherence: f32,
}

pub(crate) struct KmeansFit {
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f32>>,
    pub iterations: usize,
}

impl VectorIndex {
    /// Partition all stored vectors into up to `k` clusters.
    ///
    /// With `k` of zero (or an empty index) returns nothing. With no more
    /// vectors than `k`, returns one singleton cluster per vector. Otherwise
    /// runs k-means seeded with `k` distinct random stored vectors; clusters
    /// that end up empty are dropped from the output.
    pub fn cluster(&self, k: usize) -> Vec<Cluster> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }

        let records: Vec<&VectorRecord> = self.records().collect();
        if records.len() <= k {
            return records
                .iter()
                .enumerate()
                .map(|(i, record)| Cluster {
                    id: i,
                    centroid: record.embedding.clone(),
                    members: vec![ClusterMember {
                        id: record.id.clone(),
                        meta: record.meta.clone(),
                    }],
                    coherence: 1.0,
                })
                .collect();
        }

        let mut rng = rand::rng();
        let seeds = rand::seq::index::sample(&mut rng, records.len(), k);
        let initial: Vec<Vec<f32>> = seeds.iter().map(|i| records[i].embedding.clone()).collect();

        let points: Vec<&[f32]> = records.iter().map(|r| r.embedding.as_slice()).collect();
        let fit = run_kmeans(&points, initial);
        log::debug!(
            "k-means over {} vectors converged after {} iterations",
            points.len(),
            fit.iterations
        );

        let mut members: Vec<Vec<ClusterMember>> = vec![Vec::new(); k];
        let mut distance_sums = vec![0.0f32; k];
        for (point_idx, &cluster_idx) in fit.assignments.iter().enumerate() {
            let record = records[point_idx];
            members[cluster_idx].push(ClusterMember {
                id: record.id.clone(),
                meta: record.meta.clone(),
            });
            distance_sums[cluster_idx] +=
                euclidean(points[point_idx], &fit.centroids[cluster_idx]);
        }

        fit.centroids
            .into_iter()
            .enumerate()
            .zip(members)
            .filter(|(_, members)| !members.is_empty())
            .map(|((id, centroid), members)| {
                let mean_distance = distance_sums[id] / members.len() as f32;
                Cluster {
                    id,
                    centroid,
                    members,
                    coherence: (1.0 - mean_distance).max(0.0),
                }
            })
            .collect()
    }
}

/// Lloyd's iteration from the given initial centroids. Deterministic: all
/// randomness lives in seed selection, so a fixed seeding always converges
/// to the same partition.
pub(crate) fn run_kmeans(points: &[&[f32]], mut centroids: Vec<Vec<f32>>) -> KmeansFit {
    let k = centroids.len();
    let dimensions = centroids.first().map(|c| c.len()).unwrap_or(0);
    let mut assignments = vec![0usize; points.len()];
    let mut iterations = 0;

    for round in 0..MAX_ITERATIONS {
        iterations = round + 1;

        for (i, point) in points.iter().enumerate() {
            assignments[i] = nearest_centroid(point, &centroids);
        }

        let mut sums = vec![vec![0.0f32; dimensions]; k];
        let mut counts = vec![0usize; k];
        for (i, point) in points.iter().enumerate() {
            let cluster = assignments[i];
            counts[cluster] += 1;
            for (slot, value) in sums[cluster].iter_mut().zip(point.iter()) {
                *slot += value;
            }
        }

        let mut max_shift = 0.0f32;
        for (cluster, centroid) in centroids.iter_mut().enumerate() {
            // An empty cluster keeps its previous centroid.
            if counts[cluster] == 0 {
                continue;
            }
            let mean: Vec<f32> = sums[cluster]
                .iter()
                .map(|sum| sum / counts[cluster] as f32)
                .collect();
            let shift = euclidean(centroid, &mean);
            if shift > max_shift {
                max_shift = shift;
            }
            *centroid = mean;
        }

        if max_shift <= CONVERGENCE_EPSILON {
            break;
        }
    }

    KmeansFit {
        assignments,
        centroids,
        iterations,
    }
}

/// Index of the nearest centroid by Euclidean distance; ties go to the
/// lowest index, keeping assignment deterministic.
fn nearest_centroid(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = euclidean_sq(point, centroid);
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

fn euclidean_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    euclidean_sq(a, b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemKind;
    use chrono::Utc;

    fn meta(title: &str) -> RecordMeta {
        RecordMeta {
            kind: ItemKind::PlainText,
            title: title.to_string(),
            content_preview: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_cluster_zero_k_or_empty_index() {
        let index = VectorIndex::with_local_embeddings();
        assert!(index.cluster(3).is_empty());

        let mut index = VectorIndex::with_local_embeddings();
        index.store("a", "something", meta("a"));
        assert!(index.cluster(0).is_empty());
    }

    #[test]
    fn test_cluster_singletons_when_k_at_least_record_count() {
        let mut index = VectorIndex::with_local_embeddings();
        index.store("a", "first document", meta("a"));
        index.store("b", "second document", meta("b"));

        // k == n and k > n both take the singleton path
        for k in [2, 5] {
            let clusters = index.cluster(k);
            assert_eq!(clusters.len(), 2);
            for cluster in &clusters {
                assert_eq!(cluster.members.len(), 1);
                assert!((cluster.coherence - 1.0).abs() < f32::EPSILON);
            }
        }
    }

    #[test]
    fn test_kmeans_two_points_one_dimension() {
        // Fixed centroids equal to the points themselves: assignment and
        // centroids must be stable from the first round.
        let a = [0.0f32];
        let b = [10.0f32];
        let points: Vec<&[f32]> = vec![&a, &b];
        let fit = run_kmeans(&points, vec![vec![0.0], vec![10.0]]);

        assert_eq!(fit.assignments, vec![0, 1]);
        assert_eq!(fit.centroids[0], vec![0.0]);
        assert_eq!(fit.centroids[1], vec![10.0]);
        assert_eq!(fit.iterations, 1);
    }

    #[test]
    fn test_kmeans_converges_to_group_means() {
        let points_data: Vec<Vec<f32>> = vec![
            vec![0.0, 0.0],
            vec![0.2, 0.0],
            vec![10.0, 10.0],
            vec![10.2, 10.0],
        ];
        let points: Vec<&[f32]> = points_data.iter().map(|p| p.as_slice()).collect();
        let fit = run_kmeans(&points, vec![vec![0.0, 0.0], vec![10.0, 10.0]]);

        assert_eq!(fit.assignments, vec![0, 0, 1, 1]);
        assert!((fit.centroids[0][0] - 0.1).abs() < 1e-5);
        assert!((fit.centroids[1][0] - 10.1).abs() < 1e-5);
    }

    #[test]
    fn test_cluster_groups_duplicate_texts() {
        let mut index = VectorIndex::with_local_embeddings();
        index.store("a1", "alpha topic text", meta("alpha"));
        index.store("a2", "alpha topic text", meta("alpha"));
        index.store("b1", "completely different beta words", meta("beta"));
        index.store("b2", "completely different beta words", meta("beta"));

        let clusters = index.cluster(2);
        let total_members: usize = clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(total_members, 4);

        // Identical vectors always land in the same cluster, and a cluster
        // of identical vectors is perfectly coherent.
        for cluster in &clusters {
            let titles: Vec<&str> =
                cluster.members.iter().map(|m| m.meta.title.as_str()).collect();
            assert!(
                titles.iter().all(|&t| t == titles[0]),
                "mixed cluster: {:?}",
                titles
            );
            assert!(cluster.coherence > 0.99);
        }
    }
}
