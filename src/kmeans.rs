//! Seeded k-means on planar points.
//!
//! Used to break up oversized proximity components. Fitting is done by
//! `linfa-clustering` (k-means++ initialization, best of several runs) with a
//! ChaCha RNG seeded from the settings, so the same input always yields the
//! same labels.

use linfa::prelude::*;
use linfa_clustering::KMeans as LinfaKMeans;
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Centroid movement below which a run is considered converged.
const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum KMeansError {
    #[error("k must be at least 1")]
    ZeroClusters,
    #[error("only {distinct} distinct points for {k} clusters")]
    Degenerate { distinct: usize, k: usize },
    #[error("points contain non-finite coordinates")]
    NonFinite,
    #[error(transparent)]
    Fit(#[from] linfa_clustering::KMeansError),
}

/// K-means settings.
#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    pub k: usize,
    pub seed: u64,
    pub restarts: usize,
    pub max_iterations: u64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        KMeans {
            k,
            seed: 42,
            restarts: 10,
            max_iterations: 300,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Cluster the points and return one label in `0..k` per point.
    ///
    /// Fewer distinct points than `k` is reported as [`KMeansError::Degenerate`]
    /// before fitting.
    pub fn fit_predict(&self, points: &[(f64, f64)]) -> Result<Vec<usize>, KMeansError> {
        if self.k == 0 {
            return Err(KMeansError::ZeroClusters);
        }
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(KMeansError::NonFinite);
        }

        let distinct = count_distinct(points);
        if distinct < self.k {
            return Err(KMeansError::Degenerate { distinct, k: self.k });
        }

        let flat: Vec<f64> = points.iter().flat_map(|&(x, y)| [x, y]).collect();
        let observations = Array2::from_shape_vec((points.len(), 2), flat)
            .map_err(|_| KMeansError::Degenerate { distinct, k: self.k })?;
        let dataset = DatasetBase::from(observations.clone());

        let model = LinfaKMeans::params_with_rng(self.k, ChaCha8Rng::seed_from_u64(self.seed))
            .n_runs(self.restarts.max(1))
            .max_n_iterations(self.max_iterations.max(1))
            .tolerance(TOLERANCE)
            .fit(&dataset)?;

        let labels = model.predict(&observations);
        Ok(labels.to_vec())
    }
}

fn count_distinct(points: &[(f64, f64)]) -> usize {
    let mut keys: Vec<(u64, u64)> = points.iter().map(|(x, y)| (x.to_bits(), y.to_bits())).collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_blobs_are_separated() {
        let mut points = Vec::new();
        for i in 0..5 {
            points.push((0.0 + i as f64 * 0.01, 0.0));
            points.push((10.0 + i as f64 * 0.01, 10.0));
        }

        let labels = KMeans::new(2).fit_predict(&points).unwrap();

        for i in (0..points.len()).step_by(2) {
            assert_eq!(labels[i], labels[0]);
            assert_eq!(labels[i + 1], labels[1]);
        }
        assert_ne!(labels[0], labels[1]);
    }

    #[test]
    fn test_identical_points_are_degenerate() {
        let points = vec![(1.0, 1.0); 8];
        let result = KMeans::new(2).fit_predict(&points);
        assert!(matches!(result, Err(KMeansError::Degenerate { distinct: 1, k: 2 })));
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert!(matches!(KMeans::new(0).fit_predict(&[(0.0, 0.0)]), Err(KMeansError::ZeroClusters)));
        let points = [(0.0, 0.0), (f64::NAN, 1.0)];
        assert!(matches!(KMeans::new(1).fit_predict(&points), Err(KMeansError::NonFinite)));
    }

    #[test]
    fn test_labels_are_in_range() {
        let points: Vec<(f64, f64)> = (0..20).map(|i| (i as f64, (i % 4) as f64)).collect();
        let labels = KMeans::new(4).fit_predict(&points).unwrap();
        assert_eq!(labels.len(), 20);
        assert!(labels.iter().all(|&label| label < 4));
    }

    #[test]
    fn test_same_seed_same_labels() {
        let points: Vec<(f64, f64)> = (0..30)
            .map(|i| ((i * 7 % 11) as f64, (i * 5 % 13) as f64))
            .collect();

        let a = KMeans::new(3).fit_predict(&points).unwrap();
        let b = KMeans::new(3).fit_predict(&points).unwrap();
        assert_eq!(a, b);
    }
}
