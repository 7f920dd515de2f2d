//! Seeded batch k-means.
//!
//! Greedy k-means++ seeding followed by Lloyd iterations. Converges when the
//! total squared centroid shift drops to `tolerance * mean feature variance`
//! or the labels stop changing. `n_init` restarts draw from one RNG stream and
//! the lowest-inertia run wins, so a fixed seed gives identical labels.
//!
//! Distance ties go to the lowest centroid index. A cluster that loses all its
//! points keeps its previous centroid.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::statistics::Statistics;

use crate::config::ClusteringConfig;

/// Result of one clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    pub iterations: usize,
}

/// Partition `points` into `k` clusters. `k` is capped at the point count;
/// no points (or `k == 0`) gives an empty fit.
pub fn fit(points: &[Vec<f64>], k: usize, config: &ClusteringConfig) -> KMeansFit {
    let k = k.min(points.len());
    if k == 0 {
        return KMeansFit {
            labels: Vec::new(),
            centroids: Vec::new(),
            inertia: 0.0,
            iterations: 0,
        };
    }

    let tol = config.tolerance * mean_variance(points);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut best: Option<KMeansFit> = None;
    for _ in 0..config.n_init.max(1) {
        let centroids = init_plus_plus(points, k, &mut rng);
        let run = lloyd(points, centroids, config.max_iterations, tol);
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }
    best.unwrap_or_else(|| lloyd(points, init_plus_plus(points, k, &mut rng), 1, tol))
}

/// Squared Euclidean distance.
fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of the nearest centroid and its squared distance.
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best_k = 0usize;
    let mut best_dist = f64::MAX;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = sq_dist(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_k = i;
        }
    }
    (best_k, best_dist)
}

#[allow(clippy::cast_precision_loss)]
fn mean_variance(points: &[Vec<f64>]) -> f64 {
    let dim = points.first().map_or(0, Vec::len);
    if dim == 0 {
        return 0.0;
    }
    let total: f64 = (0..dim)
        .map(|j| Statistics::population_variance(points.iter().map(|p| p[j])))
        .filter(|v| v.is_finite())
        .sum();
    total / dim as f64
}

/// Draw an index with probability proportional to `weights`. Falls back to a
/// uniform draw when every weight is zero.
fn weighted_index(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return rng.gen_range(0..weights.len());
    }
    let target = rng.gen::<f64>() * total;
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if target < acc {
            return i;
        }
    }
    weights.len() - 1
}

/// Greedy k-means++: each step samples `2 + ln(k)` candidates by squared
/// distance and keeps the one that most reduces total potential.
fn init_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let trials = 2 + (k as f64).ln() as usize;

    let first = rng.gen_range(0..points.len());
    let mut centroids = vec![points[first].clone()];
    let mut closest: Vec<f64> = points.iter().map(|p| sq_dist(p, &points[first])).collect();

    while centroids.len() < k {
        let mut best: Option<(f64, usize, Vec<f64>)> = None;
        for _ in 0..trials {
            let candidate = weighted_index(&closest, rng);
            let updated: Vec<f64> = points
                .iter()
                .zip(&closest)
                .map(|(p, &d)| d.min(sq_dist(p, &points[candidate])))
                .collect();
            let potential: f64 = updated.iter().sum();
            if best.as_ref().map_or(true, |(b, _, _)| potential < *b) {
                best = Some((potential, candidate, updated));
            }
        }
        if let Some((_, candidate, updated)) = best {
            centroids.push(points[candidate].clone());
            closest = updated;
        }
    }
    centroids
}

fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> (Vec<usize>, f64) {
    let mut inertia = 0.0;
    let labels = points
        .iter()
        .map(|p| {
            let (k, d) = nearest(p, centroids);
            inertia += d;
            k
        })
        .collect();
    (labels, inertia)
}

fn lloyd(
    points: &[Vec<f64>],
    mut centroids: Vec<Vec<f64>>,
    max_iterations: usize,
    tol: f64,
) -> KMeansFit {
    let dim = points[0].len();
    let (mut labels, _) = assign(points, &centroids);
    let mut iterations = 0;

    for _ in 0..max_iterations.max(1) {
        iterations += 1;

        let mut sums = vec![vec![0.0; dim]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];
        for (p, &l) in points.iter().zip(&labels) {
            counts[l] += 1;
            for (s, x) in sums[l].iter_mut().zip(p) {
                *s += x;
            }
        }

        let mut shift = 0.0;
        for (c, (sum, &count)) in centroids.iter_mut().zip(sums.iter().zip(&counts)) {
            if count == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let updated: Vec<f64> = sum.iter().map(|s| s / count as f64).collect();
            shift += sq_dist(c, &updated);
            *c = updated;
        }

        let (new_labels, _) = assign(points, &centroids);
        let stable = new_labels == labels;
        labels = new_labels;
        if stable || shift <= tol {
            break;
        }
    }

    let (labels, inertia) = assign(points, &centroids);
    KMeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64) -> ClusteringConfig {
        ClusteringConfig {
            seed,
            ..ClusteringConfig::default()
        }
    }

    fn blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
            vec![-10.0, 10.0],
            vec![-10.1, 10.0],
        ]
    }

    #[test]
    fn test_separated_blobs() {
        let fit = fit(&blobs(), 3, &config(42));
        assert_eq!(fit.labels.len(), 8);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[0], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[3], fit.labels[5]);
        assert_eq!(fit.labels[6], fit.labels[7]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert_ne!(fit.labels[0], fit.labels[6]);
        assert_ne!(fit.labels[3], fit.labels[6]);
        assert!(fit.inertia < 0.1);
    }

    #[test]
    fn test_same_seed_same_labels() {
        let a = fit(&blobs(), 3, &config(42));
        let b = fit(&blobs(), 3, &config(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_k_capped_at_point_count() {
        let points = vec![vec![1.0], vec![2.0]];
        let fit = fit(&points, 3, &config(42));
        assert_eq!(fit.centroids.len(), 2);
        let mut labels = fit.labels.clone();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn test_single_point() {
        let fit = fit(&[vec![0.5, 0.2, 0.3, 25.0]], 3, &config(42));
        assert_eq!(fit.labels, vec![0]);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_identical_points_stay_in_range() {
        let points = vec![vec![1.0, 1.0]; 5];
        let fit = fit(&points, 3, &config(7));
        assert!(fit.labels.iter().all(|&l| l < 3));
        // Ties resolve to the lowest centroid index
        assert!(fit.labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_empty_input() {
        let fit = fit(&[], 3, &config(42));
        assert!(fit.labels.is_empty());
        assert!(fit.centroids.is_empty());
    }

    #[test]
    fn test_restarts_never_worse_than_single_run() {
        let single = fit(&blobs(), 2, &config(3));
        let multi = fit(
            &blobs(),
            2,
            &ClusteringConfig {
                n_init: 10,
                ..config(3)
            },
        );
        assert!(multi.inertia <= single.inertia + 1e-12);
    }
}
