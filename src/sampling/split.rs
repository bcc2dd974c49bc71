//! Seeded stratified train/test split

use crate::error::{FleetError, Result};
use crate::sampling::class_indices;
use ndarray::{Array1, Array2};
use rand::prelude::*;

/// Outcome of a stratified split. Partitions are disjoint and their index
/// sets union to the full dataset.
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<i64>,
    pub y_test: Array1<i64>,
    /// Row indices of the training partition in the source dataset
    pub train_indices: Vec<usize>,
    /// Row indices of the test partition in the source dataset
    pub test_indices: Vec<usize>,
}

/// Stratified random splitter that preserves the class ratio in both
/// partitions. Deterministic for a fixed seed.
pub struct StratifiedSplit {
    test_fraction: f64,
    seed: u64,
}

impl StratifiedSplit {
    pub fn new(test_fraction: f64, seed: u64) -> Self {
        Self {
            test_fraction: test_fraction.clamp(0.0, 1.0),
            seed,
        }
    }

    pub fn split(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<SplitResult> {
        if x.nrows() != y.len() {
            return Err(FleetError::ValidationError(format!(
                "feature rows ({}) and labels ({}) disagree",
                x.nrows(),
                y.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut train_indices = Vec::new();
        let mut test_indices = Vec::new();

        // Per class: shuffle, then carve the test share off the end
        for (_class, mut indices) in class_indices(y) {
            indices.shuffle(&mut rng);
            let n_test = ((indices.len() as f64) * self.test_fraction).round() as usize;
            let n_test = if indices.len() > 1 {
                n_test.clamp(1, indices.len() - 1)
            } else {
                0
            };
            let split_point = indices.len() - n_test;
            train_indices.extend_from_slice(&indices[..split_point]);
            test_indices.extend_from_slice(&indices[split_point..]);
        }

        if train_indices.is_empty() || test_indices.is_empty() {
            return Err(FleetError::ValidationError(
                "stratified split produced an empty partition".to_string(),
            ));
        }

        // Break up the per-class blocks
        train_indices.shuffle(&mut rng);
        test_indices.shuffle(&mut rng);

        let n_cols = x.ncols();
        let x_train = Array2::from_shape_fn((train_indices.len(), n_cols), |(i, j)| {
            x[[train_indices[i], j]]
        });
        let x_test = Array2::from_shape_fn((test_indices.len(), n_cols), |(i, j)| {
            x[[test_indices[i], j]]
        });
        let y_train = Array1::from_iter(train_indices.iter().map(|&i| y[i]));
        let y_test = Array1::from_iter(test_indices.iter().map(|&i| y[i]));

        Ok(SplitResult {
            x_train,
            x_test,
            y_train,
            y_test,
            train_indices,
            test_indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn imbalanced_data(n: usize, n_pos: usize) -> (Array2<f64>, Array1<i64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_iter((0..n).map(|i| if i < n_pos { 1i64 } else { 0 }));
        (x, y)
    }

    #[test]
    fn test_partitions_disjoint_and_complete() {
        let (x, y) = imbalanced_data(100, 10);
        let result = StratifiedSplit::new(0.3, 42).split(&x, &y).unwrap();

        let train: HashSet<usize> = result.train_indices.iter().copied().collect();
        let test: HashSet<usize> = result.test_indices.iter().copied().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 100);
    }

    #[test]
    fn test_stratification_preserved() {
        // 100 records, 10 positive: 70/30 puts 3 positives in test and 7
        // in train.
        let (x, y) = imbalanced_data(100, 10);
        let result = StratifiedSplit::new(0.3, 42).split(&x, &y).unwrap();

        let test_pos = result.y_test.iter().filter(|&&v| v == 1).count();
        let train_pos = result.y_train.iter().filter(|&&v| v == 1).count();
        assert_eq!(test_pos, 3);
        assert_eq!(train_pos, 7);
        assert_eq!(result.y_test.len(), 30);
        assert_eq!(result.y_train.len(), 70);
    }

    #[test]
    fn test_rows_match_indices() {
        let (x, y) = imbalanced_data(40, 8);
        let result = StratifiedSplit::new(0.25, 42).split(&x, &y).unwrap();

        for (row, &src) in result.test_indices.iter().enumerate() {
            assert_eq!(result.x_test[[row, 0]], x[[src, 0]]);
            assert_eq!(result.y_test[row], y[src]);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = imbalanced_data(60, 12);
        let a = StratifiedSplit::new(0.3, 42).split(&x, &y).unwrap();
        let b = StratifiedSplit::new(0.3, 42).split(&x, &y).unwrap();
        assert_eq!(a.train_indices, b.train_indices);
        assert_eq!(a.test_indices, b.test_indices);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let x = Array2::zeros((5, 2));
        let y = Array1::from_vec(vec![0i64, 1, 0]);
        assert!(StratifiedSplit::new(0.3, 42).split(&x, &y).is_err());
    }
}
