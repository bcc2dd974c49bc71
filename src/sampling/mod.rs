//! Train/test partitioning and class balancing
//!
//! The split is stratified so both partitions preserve the label ratio;
//! SMOTE then equalizes class counts on the training partition only.

mod smote;
mod split;

pub use smote::Smote;
pub use split::{SplitResult, StratifiedSplit};

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features: original rows first, synthetic rows appended
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Number of synthetic samples generated per class
    pub n_synthetic: BTreeMap<i64, usize>,
}

/// Trait for oversamplers
pub trait Sampler {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Number of samples per class, ordered by label
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Row indices per class, ordered by label
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_counts() {
        let y = Array1::from_vec(vec![0i64, 1, 0, 0, 1]);
        let counts = class_counts(&y);
        assert_eq!(counts.get(&0), Some(&3));
        assert_eq!(counts.get(&1), Some(&2));
    }

    #[test]
    fn test_class_indices() {
        let y = Array1::from_vec(vec![0i64, 1, 0]);
        let indices = class_indices(&y);
        assert_eq!(indices.get(&0), Some(&vec![0, 2]));
        assert_eq!(indices.get(&1), Some(&vec![1]));
    }
}
