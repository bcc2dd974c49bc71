//! SMOTE oversampling
//!
//! Synthetic minority samples are interpolated between a minority record
//! and one of its k nearest same-class neighbors in feature space.

use crate::error::{FleetError, Result};
use crate::sampling::{class_counts, class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// Ordered distance/index pair for BinaryHeap-based partial sort
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// SMOTE (Synthetic Minority Over-sampling Technique)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    /// Number of nearest neighbors considered per minority sample
    k_neighbors: usize,
    /// Target minority/majority ratio after resampling
    sampling_strategy: f64,
    /// Random seed
    seed: Option<u64>,
    /// Target samples per class, computed at fit time
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl Smote {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            sampling_strategy: 1.0,
            seed: None,
            target_counts: None,
        }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set the target minority/majority ratio
    pub fn with_sampling_strategy(mut self, ratio: f64) -> Self {
        self.sampling_strategy = ratio.clamp(0.1, 10.0);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(ai, bi)| (ai - bi).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// k nearest same-class neighbors of `point`, excluding itself.
    /// BinaryHeap keeps this at O(n log k).
    fn k_nearest(point: &[f64], candidates: &[Vec<f64>], k: usize) -> Vec<usize> {
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, candidate) in candidates.iter().enumerate() {
            let dist = Self::distance(point, candidate);
            if dist <= 0.0 {
                continue;
            }
            if heap.len() < k {
                heap.push(DistIdx(dist, i));
            } else if let Some(&DistIdx(max_dist, _)) = heap.peek() {
                if dist < max_dist {
                    heap.pop();
                    heap.push(DistIdx(dist, i));
                }
            }
        }

        heap.into_iter().map(|DistIdx(_, i)| i).collect()
    }

    /// Random point on the segment between `point` and `neighbor`
    fn interpolate(point: &[f64], neighbor: &[f64], rng: &mut StdRng) -> Vec<f64> {
        let gap: f64 = rng.gen();
        point
            .iter()
            .zip(neighbor.iter())
            .map(|(&p, &n)| p + gap * (n - p))
            .collect()
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for Smote {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(FleetError::ValidationError(
                "need at least 2 classes for SMOTE".to_string(),
            ));
        }

        let max_count = counts.values().copied().max().unwrap_or(0);

        let mut targets = BTreeMap::new();
        for (&class, &count) in &counts {
            let target = (max_count as f64 * self.sampling_strategy) as usize;
            targets.insert(class, target.max(count));
        }
        self.target_counts = Some(targets);
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or(FleetError::ModelNotFitted)?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let indices = class_indices(y);
        let counts = class_counts(y);
        let n_features = x.ncols();

        let mut synthetic_x: Vec<Vec<f64>> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = BTreeMap::new();

        for (&class, &target_count) in targets {
            let current_count = counts.get(&class).copied().unwrap_or(0);
            let n_to_generate = target_count.saturating_sub(current_count);
            n_synthetic.insert(class, n_to_generate);
            if n_to_generate == 0 {
                continue;
            }

            let class_idx = indices.get(&class).ok_or_else(|| {
                FleetError::ValidationError(format!("class {class} absent from labels"))
            })?;
            if class_idx.len() < 2 {
                return Err(FleetError::ValidationError(format!(
                    "class {class} has fewer than 2 samples, cannot interpolate"
                )));
            }

            let class_samples: Vec<Vec<f64>> = class_idx
                .iter()
                .map(|&i| x.row(i).iter().copied().collect())
                .collect();
            let k = self.k_neighbors.min(class_samples.len() - 1).max(1);

            let mut generated = 0;
            let mut attempts = 0usize;
            while generated < n_to_generate {
                // All samples identical means no neighbor at distance > 0;
                // duplicating the point is the only consistent output.
                attempts += 1;
                let idx = rng.gen_range(0..class_samples.len());
                let sample = &class_samples[idx];

                let neighbors = Self::k_nearest(sample, &class_samples, k);
                let synthetic = if neighbors.is_empty() {
                    if attempts > n_to_generate * 4 {
                        sample.clone()
                    } else {
                        continue;
                    }
                } else {
                    let neighbor = &class_samples[neighbors[rng.gen_range(0..neighbors.len())]];
                    Self::interpolate(sample, neighbor, &mut rng)
                };

                synthetic_x.push(synthetic);
                synthetic_y.push(class);
                generated += 1;
            }
        }

        // Original rows first, synthetic rows appended
        let n_original = x.nrows();
        let n_total = n_original + synthetic_x.len();
        let result_x = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[i - n_original][j]
            }
        });

        let mut all_y: Vec<i64> = y.iter().copied().collect();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_data() -> (Array2<f64>, Array1<i64>) {
        // 20 majority around the origin, 5 minority around (10, 10)
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            data.push((i % 5) as f64);
            data.push((i / 5) as f64);
            labels.push(0i64);
        }
        for i in 0..5 {
            data.push(10.0 + (i % 3) as f64);
            data.push(10.0 + (i / 3) as f64);
            labels.push(1i64);
        }
        let x = Array2::from_shape_vec((25, 2), data).unwrap();
        (x, Array1::from_vec(labels))
    }

    #[test]
    fn test_balances_to_majority() {
        let (x, y) = imbalanced_data();
        let mut smote = Smote::new().with_k_neighbors(3).with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        let counts = class_counts(&result.y);
        assert_eq!(counts.get(&0), Some(&20));
        assert_eq!(counts.get(&1), Some(&20));
        assert_eq!(result.n_synthetic.get(&1), Some(&15));
        assert_eq!(result.n_synthetic.get(&0), Some(&0));
    }

    #[test]
    fn test_original_rows_preserved() {
        let (x, y) = imbalanced_data();
        let mut smote = Smote::new().with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        for i in 0..x.nrows() {
            for j in 0..x.ncols() {
                assert_eq!(result.x[[i, j]], x[[i, j]]);
            }
            assert_eq!(result.y[i], y[i]);
        }
    }

    #[test]
    fn test_synthetic_within_minority_hull() {
        let (x, y) = imbalanced_data();
        let mut smote = Smote::new().with_k_neighbors(3).with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        // Interpolated minority points stay inside the minority bounding box
        for i in x.nrows()..result.x.nrows() {
            assert!(result.x[[i, 0]] >= 10.0 && result.x[[i, 0]] <= 12.0);
            assert!(result.x[[i, 1]] >= 10.0 && result.x[[i, 1]] <= 11.0);
            assert_eq!(result.y[i], 1);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = imbalanced_data();
        let a = Smote::new().with_seed(42).fit_resample(&x, &y).unwrap();
        let b = Smote::new().with_seed(42).fit_resample(&x, &y).unwrap();
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = Array2::zeros((5, 2));
        let y = Array1::from_vec(vec![0i64; 5]);
        let mut smote = Smote::new().with_seed(42);
        assert!(smote.fit(&x, &y).is_err());
    }

    #[test]
    fn test_unfitted_resample_rejected() {
        let (x, y) = imbalanced_data();
        let smote = Smote::new();
        assert!(smote.resample(&x, &y).is_err());
    }
}
