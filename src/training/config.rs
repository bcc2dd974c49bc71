//! Booster configuration

use serde::{Deserialize, Serialize};

/// Option set for [`GbmClassifier`](crate::training::GbmClassifier).
///
/// Defaults reproduce the production risk-model run: binary objective,
/// up to 1000 trees at learning rate 0.05, 20 leaves, depth 5, class
/// imbalance compensation, and 50-round early stopping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmConfig {
    /// Ceiling on the number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
    /// Maximum leaves per tree
    pub num_leaves: usize,
    /// Maximum tree depth
    pub max_depth: Option<usize>,
    /// Minimum samples per leaf
    pub min_child_samples: usize,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Fraction of features considered per tree
    pub colsample_bytree: f64,
    /// Weight positive-class gradients by the neg/pos ratio
    pub is_unbalance: bool,
    /// Stop when the eval metric has not improved for this many rounds
    pub early_stopping_rounds: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for GbmConfig {
    fn default() -> Self {
        Self {
            n_estimators: 1000,
            learning_rate: 0.05,
            num_leaves: 20,
            max_depth: Some(5),
            min_child_samples: 20,
            reg_lambda: 0.0,
            colsample_bytree: 1.0,
            is_unbalance: true,
            early_stopping_rounds: 50,
            seed: 42,
        }
    }
}

impl GbmConfig {
    /// The parameter set logged to the experiment tracker, in the shape the
    /// run records them.
    pub fn as_params(&self) -> Vec<(String, String)> {
        vec![
            ("objective".to_string(), "binary".to_string()),
            ("metric".to_string(), "binary_logloss".to_string()),
            ("n_estimators".to_string(), self.n_estimators.to_string()),
            ("learning_rate".to_string(), self.learning_rate.to_string()),
            ("num_leaves".to_string(), self.num_leaves.to_string()),
            (
                "max_depth".to_string(),
                self.max_depth.map_or("none".to_string(), |d| d.to_string()),
            ),
            ("is_unbalance".to_string(), self.is_unbalance.to_string()),
            ("random_state".to_string(), self.seed.to_string()),
        ]
    }
}
