// Seeded k-means over dense vectors.
//
// 1. Seed k centroids with k-means++ from a fixed-seed RNG
// 2. Assign each vector to its nearest centroid (squared Euclidean distance)
// 3. Recompute centroids as the mean of their members
// 4. Repeat until the centroids stop moving or max_iter is reached
//
// The whole procedure runs n_init times from the same RNG stream and the run
// with the lowest inertia wins, so a fixed seed gives identical labels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::error::ClusterError;

pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_N_INIT: usize = 10;
pub const DEFAULT_MAX_ITER: usize = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// K-means configuration.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub k: usize,
    pub seed: u64,
    /// Independent restarts; the lowest-inertia run is kept
    pub n_init: usize,
    pub max_iter: usize,
    /// Stop once the summed squared centroid shift drops to this
    pub tolerance: f64,
}

/// The outcome of a fit.
#[derive(Debug, Clone, Serialize)]
pub struct KMeansFit {
    /// Cluster id per input vector, each in `[0, k)`
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each vector to its centroid
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            seed: DEFAULT_SEED,
            n_init: DEFAULT_N_INIT,
            max_iter: DEFAULT_MAX_ITER,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Partition `points` into `k` clusters.
    ///
    /// Fails if `k` is zero or exceeds the number of points. Every id in
    /// `[0, k)` ends up with at least one member.
    pub fn fit(&self, points: &[Vec<f64>]) -> Result<KMeansFit, ClusterError> {
        if self.k == 0 || self.k > points.len() {
            return Err(ClusterError::InvalidClusterCount {
                k: self.k,
                distinct: points.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;

        for run in 0..self.n_init.max(1) {
            let fit = self.single_run(points, &mut rng);
            debug!(
                run,
                iterations = fit.iterations,
                inertia = fit.inertia,
                "k-means run finished"
            );
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        // n_init.max(1) guarantees at least one run
        best.ok_or(ClusterError::InvalidClusterCount {
            k: self.k,
            distinct: points.len(),
        })
    }

    fn single_run(&self, points: &[Vec<f64>], rng: &mut StdRng) -> KMeansFit {
        let mut centroids = kmeans_plus_plus(points, self.k, rng);
        let mut labels = assign(points, &centroids);
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            fill_empty_clusters(points, &mut labels, &mut centroids);

            let updated = recompute_centroids(points, &labels, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = updated;
            labels = assign(points, &centroids);

            if shift <= self.tolerance {
                break;
            }
        }

        fill_empty_clusters(points, &mut labels, &mut centroids);
        let inertia = inertia(points, &labels, &centroids);

        KMeansFit {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen one.
fn kmeans_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())].clone());

    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();

        let chosen = if total <= f64::EPSILON {
            // Every point coincides with a centroid already
            rng.random_range(0..points.len())
        } else {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            let mut idx = points.len() - 1;
            for (i, d) in nearest.iter().enumerate() {
                cumulative += d;
                if cumulative >= target && *d > 0.0 {
                    idx = i;
                    break;
                }
            }
            idx
        };

        let centroid = points[chosen].clone();
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Index of the nearest centroid for each point. Ties go to the lower id.
fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            centroids
                .iter()
                .enumerate()
                .fold((0, f64::INFINITY), |best, (i, c)| {
                    let d = squared_distance(p, c);
                    if d < best.1 {
                        (i, d)
                    } else {
                        best
                    }
                })
                .0
        })
        .collect()
}

/// Give every memberless cluster the point farthest from its own centroid,
/// taken from a cluster that can spare one.
fn fill_empty_clusters(points: &[Vec<f64>], labels: &mut [usize], centroids: &mut [Vec<f64>]) {
    let k = centroids.len();
    let mut sizes = vec![0usize; k];
    for &l in labels.iter() {
        sizes[l] += 1;
    }

    for cluster in 0..k {
        if sizes[cluster] > 0 {
            continue;
        }

        let donor = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| sizes[l] > 1)
            .map(|(i, &l)| (i, squared_distance(&points[i], &centroids[l])))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            });

        let Some((idx, _)) = donor else {
            // Fewer points than clusters; fit() rules this out
            return;
        };

        sizes[labels[idx]] -= 1;
        labels[idx] = cluster;
        sizes[cluster] = 1;
        centroids[cluster] = points[idx].clone();
    }
}

/// Mean of each cluster's members. A cluster with no members keeps its
/// previous centroid.
fn recompute_centroids(points: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dim = points.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0_f64; dim]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (p, &l) in points.iter().zip(labels) {
        counts[l] += 1;
        for (s, v) in sums[l].iter_mut().zip(p) {
            *s += v;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((mut sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                for s in sum.iter_mut() {
                    *s /= count as f64;
                }
                sum
            }
        })
        .collect()
}

fn inertia(points: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> f64 {
    points
        .iter()
        .zip(labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
