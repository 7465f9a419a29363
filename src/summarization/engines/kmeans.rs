//! Deterministic k-means over sentence embeddings.

use std::cmp::Ordering;

/// Result of a clustering run.
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    /// One centroid per cluster.
    pub centroids: Vec<Vec<f32>>,
    /// Cluster index of each input point.
    pub assignments: Vec<usize>,
    /// Iterations until convergence (or the cap).
    pub iterations: usize,
}

/// Cluster `points` into at most `k` groups.
///
/// Initialization is farthest-point from the first point, so the same input always
/// yields the same clustering. `k` is clamped to `1..=points.len()`.
#[must_use]
pub fn kmeans(points: &[Vec<f32>], k: usize, max_iters: usize) -> Clustering {
    if points.is_empty() {
        return Clustering {
            centroids: Vec::new(),
            assignments: Vec::new(),
            iterations: 0,
        };
    }

    let k = k.clamp(1, points.len());
    let mut centroids = farthest_point_init(points, k);
    let mut assignments = vec![usize::MAX; points.len()];
    let mut iterations = 0;

    for _ in 0..max_iters.max(1) {
        iterations += 1;

        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let best = nearest(point, &centroids);
            if assignments[i] != best {
                changed = true;
                assignments[i] = best;
            }
        }

        if !changed {
            break;
        }

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&[f32]> = points
                .iter()
                .zip(&assignments)
                .filter(|&(_, a)| *a == c)
                .map(|(p, _)| p.as_slice())
                .collect();
            if let Some(mean) = mean(&members) {
                *centroid = mean;
            }
        }
    }

    Clustering {
        centroids,
        assignments,
        iterations,
    }
}

/// Squared euclidean distance; extra trailing dimensions are ignored.
#[must_use]
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the centroid closest to `point`; ties go to the lowest index.
fn nearest(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(c, center)| (c, squared_distance(point, center)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map_or(0, |(c, _)| c)
}

fn farthest_point_init(points: &[Vec<f32>], k: usize) -> Vec<Vec<f32>> {
    let mut centroids = vec![points[0].clone()];
    let mut min_dist: Vec<f32> = points
        .iter()
        .map(|p| squared_distance(p, &points[0]))
        .collect();

    while centroids.len() < k {
        let mut next = 0;
        let mut best = -1.0_f32;
        for (i, d) in min_dist.iter().enumerate() {
            if *d > best {
                best = *d;
                next = i;
            }
        }
        let chosen = points[next].clone();
        for (i, p) in points.iter().enumerate() {
            min_dist[i] = min_dist[i].min(squared_distance(p, &chosen));
        }
        centroids.push(chosen);
    }

    centroids
}

#[allow(clippy::cast_precision_loss)]
fn mean(vectors: &[&[f32]]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let mut out = vec![0.0_f32; first.len()];
    for v in vectors {
        for (o, x) in out.iter_mut().zip(v.iter()) {
            *o += x;
        }
    }
    let n = vectors.len() as f32;
    for o in &mut out {
        *o /= n;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_obvious_clusters() {
        let points = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
        ];
        let result = kmeans(&points, 2, 50);
        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[2], result.assignments[3]);
        assert_ne!(result.assignments[0], result.assignments[2]);
    }

    #[test]
    fn test_k_clamped_to_point_count() {
        let points = vec![vec![1.0], vec![2.0]];
        let too_many = kmeans(&points, 10, 50);
        assert_eq!(too_many.centroids.len(), 2);

        let zero = kmeans(&points, 0, 50);
        assert_eq!(zero.centroids.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let result = kmeans(&[], 3, 50);
        assert!(result.centroids.is_empty());
        assert!(result.assignments.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let points: Vec<Vec<f32>> = (0..12_u16)
            .map(|i| vec![f32::from(i % 4), f32::from(i / 4)])
            .collect();
        assert_eq!(kmeans(&points, 3, 50), kmeans(&points, 3, 50));
    }

    #[test]
    fn test_identical_points_share_cluster() {
        let points = vec![vec![0.5, 0.5]; 4];
        let result = kmeans(&points, 2, 50);
        assert!(result.assignments.iter().all(|a| *a == 0));
    }
}
