//! Leaf-wise gradient-boosted binary classifier
//!
//! Trees grow best-first: the pending split with the highest gain anywhere
//! in the tree is taken next, until the leaf budget is exhausted. Training
//! monitors binary log loss on an optional evaluation set and stops early
//! once the metric stalls.

use crate::error::{FleetError, Result};
use crate::training::metrics::binary_logloss;
use crate::training::GbmConfig;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, sample: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    fn count_splits(&self, counts: &mut [f64]) {
        if let TreeNode::Split {
            feature,
            left,
            right,
            ..
        } = self
        {
            counts[*feature] += 1.0;
            left.count_splits(counts);
            right.count_splits(counts);
        }
    }
}

// ---- Tree building ----

fn leaf_weight(g: f64, h: f64, lambda: f64) -> f64 {
    -g / (h + lambda)
}

fn split_gain(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

fn make_leaf(gradients: &[f64], hessians: &[f64], indices: &[usize], lambda: f64) -> TreeNode {
    let g: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let h: f64 = indices.iter().map(|&i| hessians[i]).sum();
    TreeNode::Leaf {
        value: leaf_weight(g, h, lambda),
    }
}

#[allow(clippy::type_complexity)]
fn best_split_for_feature(
    x: &Array2<f64>,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    feature: usize,
    reg_lambda: f64,
    min_child_samples: usize,
) -> Option<(f64, f64, Vec<usize>, Vec<usize>)> {
    let mut sorted: Vec<(usize, f64)> = indices.iter().map(|&i| (i, x[[i, feature]])).collect();
    sorted.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let total_g: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let total_h: f64 = indices.iter().map(|&i| hessians[i]).sum();
    let base_score = split_gain(total_g, total_h, reg_lambda);

    let mut left_g = 0.0;
    let mut left_h = 0.0;
    let mut best_gain = f64::NEG_INFINITY;
    let mut best_threshold = 0.0;
    let mut best_pos = 0;

    for i in 0..sorted.len() - 1 {
        left_g += gradients[sorted[i].0];
        left_h += hessians[sorted[i].0];

        if i + 1 < min_child_samples || sorted.len() - i - 1 < min_child_samples {
            continue;
        }
        if sorted[i].1 == sorted[i + 1].1 {
            continue;
        }

        let right_g = total_g - left_g;
        let right_h = total_h - left_h;
        let gain = split_gain(left_g, left_h, reg_lambda)
            + split_gain(right_g, right_h, reg_lambda)
            - base_score;

        if gain > best_gain {
            best_gain = gain;
            best_threshold = (sorted[i].1 + sorted[i + 1].1) / 2.0;
            best_pos = i + 1;
        }
    }

    if best_gain <= 0.0 {
        return None;
    }

    let left: Vec<usize> = sorted[..best_pos].iter().map(|&(i, _)| i).collect();
    let right: Vec<usize> = sorted[best_pos..].iter().map(|&(i, _)| i).collect();
    Some((best_threshold, best_gain, left, right))
}

#[derive(Clone)]
struct PendingSplit {
    gain: f64,
    node_id: usize,
    feature: usize,
    threshold: f64,
    left_indices: Vec<usize>,
    right_indices: Vec<usize>,
}
impl PartialEq for PendingSplit {
    fn eq(&self, other: &Self) -> bool {
        self.gain == other.gain
    }
}
impl Eq for PendingSplit {}
impl PartialOrd for PendingSplit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PendingSplit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain.partial_cmp(&other.gain).unwrap_or(Ordering::Equal)
    }
}

enum NodeSlot {
    Leaf(Vec<usize>),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Grow one tree leaf-wise under the leaf, depth, and min-samples budgets.
fn build_tree(
    x: &Array2<f64>,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    config: &GbmConfig,
    rng: &mut Xoshiro256PlusPlus,
) -> TreeNode {
    if indices.len() < config.min_child_samples * 2 {
        return make_leaf(gradients, hessians, indices, config.reg_lambda);
    }

    let n_features = x.ncols();
    let n_selected = ((n_features as f64 * config.colsample_bytree).ceil() as usize).max(1);
    let mut feature_indices: Vec<usize> = (0..n_features).collect();
    if n_selected < n_features {
        feature_indices.shuffle(rng);
        feature_indices.truncate(n_selected);
    }

    let find_split = |node_indices: &[usize]| -> Option<PendingSplit> {
        let candidates: Vec<_> = feature_indices
            .par_iter()
            .filter_map(|&feat| {
                best_split_for_feature(
                    x,
                    gradients,
                    hessians,
                    node_indices,
                    feat,
                    config.reg_lambda,
                    config.min_child_samples,
                )
                .map(|(thr, gain, li, ri)| (feat, thr, gain, li, ri))
            })
            .collect();
        candidates
            .into_iter()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
            .map(|best| PendingSplit {
                gain: best.2,
                node_id: 0,
                feature: best.0,
                threshold: best.1,
                left_indices: best.3,
                right_indices: best.4,
            })
    };

    let mut nodes: Vec<NodeSlot> = vec![NodeSlot::Leaf(indices.to_vec())];
    let mut depths: Vec<usize> = vec![0];
    let mut heap: BinaryHeap<PendingSplit> = BinaryHeap::new();
    let max_depth_limit = config.max_depth.unwrap_or(usize::MAX);

    if let Some(root_split) = find_split(indices) {
        heap.push(root_split);
    }

    let mut n_leaves = 1usize;

    while n_leaves < config.num_leaves {
        let split = match heap.pop() {
            Some(s) if s.gain > 0.0 => s,
            _ => break,
        };
        if depths[split.node_id] >= max_depth_limit {
            continue;
        }

        let depth = depths[split.node_id];
        let left_id = nodes.len();
        let right_id = nodes.len() + 1;

        nodes.push(NodeSlot::Leaf(split.left_indices.clone()));
        nodes.push(NodeSlot::Leaf(split.right_indices.clone()));
        depths.push(depth + 1);
        depths.push(depth + 1);

        nodes[split.node_id] = NodeSlot::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_id,
            right: right_id,
        };
        n_leaves += 1;

        if depth + 1 < max_depth_limit {
            for (child_id, child_indices) in
                [(left_id, &split.left_indices), (right_id, &split.right_indices)]
            {
                if child_indices.len() < config.min_child_samples * 2 {
                    continue;
                }
                if let Some(mut child_split) = find_split(child_indices) {
                    child_split.node_id = child_id;
                    heap.push(child_split);
                }
            }
        }
    }

    fn to_node(nodes: &[NodeSlot], idx: usize, g: &[f64], h: &[f64], lambda: f64) -> TreeNode {
        match &nodes[idx] {
            NodeSlot::Leaf(indices) => make_leaf(g, h, indices, lambda),
            NodeSlot::Split {
                feature,
                threshold,
                left,
                right,
            } => TreeNode::Split {
                feature: *feature,
                threshold: *threshold,
                left: Box::new(to_node(nodes, *left, g, h, lambda)),
                right: Box::new(to_node(nodes, *right, g, h, lambda)),
            },
        }
    }
    to_node(&nodes, 0, gradients, hessians, config.reg_lambda)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Gradient-boosted binary classifier with early stopping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmClassifier {
    pub config: GbmConfig,
    trees: Vec<TreeNode>,
    base_prediction: f64,
    n_features: usize,
    best_iteration: Option<usize>,
    eval_history: Vec<f64>,
}

impl GbmClassifier {
    pub fn new(config: GbmConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_prediction: 0.0,
            n_features: 0,
            best_iteration: None,
            eval_history: Vec::new(),
        }
    }

    /// Fit against `(x, y)` with labels in {0, 1}.
    ///
    /// When an evaluation set is supplied, binary log loss on it is
    /// recorded after every boosting round; training stops once the metric
    /// has not improved for `early_stopping_rounds` consecutive rounds and
    /// the ensemble is truncated to its best round.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        eval_set: Option<(&Array2<f64>, &Array1<f64>)>,
    ) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(FleetError::TrainingError("empty training set".into()));
        }
        if y.len() != n {
            return Err(FleetError::TrainingError(format!(
                "feature rows ({}) and labels ({}) disagree",
                n,
                y.len()
            )));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        self.trees.clear();
        self.eval_history.clear();
        self.best_iteration = None;
        self.n_features = x.ncols();

        let pos = y.iter().filter(|&&v| v > 0.5).count() as f64;
        let neg = n as f64 - pos;
        if pos == 0.0 || neg == 0.0 {
            return Err(FleetError::TrainingError(
                "training set contains a single class".into(),
            ));
        }
        self.base_prediction = (pos / neg).ln();

        // Class imbalance compensation: positive samples carry the
        // neg/pos weight in both gradient and hessian
        let pos_weight = if self.config.is_unbalance { neg / pos } else { 1.0 };
        let weights: Vec<f64> = y
            .iter()
            .map(|&v| if v > 0.5 { pos_weight } else { 1.0 })
            .collect();

        let indices: Vec<usize> = (0..n).collect();
        let mut raw = Array1::from_elem(n, self.base_prediction);
        let mut eval_raw = eval_set.map(|(xe, _)| Array1::from_elem(xe.nrows(), self.base_prediction));

        let mut best_score = f64::INFINITY;
        let mut rounds_since_best = 0usize;

        for round in 0..self.config.n_estimators {
            let probs: Vec<f64> = raw.iter().map(|&r| sigmoid(r)).collect();
            let gradients: Vec<f64> = probs
                .iter()
                .zip(y.iter())
                .zip(weights.iter())
                .map(|((&p, &yi), &w)| w * (p - yi))
                .collect();
            let hessians: Vec<f64> = probs
                .iter()
                .zip(weights.iter())
                .map(|(&p, &w)| (w * p * (1.0 - p)).max(1e-16))
                .collect();

            let tree = build_tree(x, &gradients, &hessians, &indices, &self.config, &mut rng);
            for i in 0..n {
                raw[i] += self.config.learning_rate * tree.predict(x.row(i).as_slice().unwrap());
            }
            self.trees.push(tree);

            if let (Some((x_eval, y_eval)), Some(eval_raw)) = (eval_set, eval_raw.as_mut()) {
                let tree = self.trees.last().unwrap();
                for i in 0..x_eval.nrows() {
                    eval_raw[i] += self.config.learning_rate
                        * tree.predict(x_eval.row(i).as_slice().unwrap());
                }
                let eval_probs = eval_raw.mapv(sigmoid);
                let score = binary_logloss(y_eval, &eval_probs);
                self.eval_history.push(score);

                if score < best_score {
                    best_score = score;
                    self.best_iteration = Some(round);
                    rounds_since_best = 0;
                } else {
                    rounds_since_best += 1;
                    if rounds_since_best >= self.config.early_stopping_rounds {
                        debug!(
                            round,
                            best_round = self.best_iteration.unwrap_or(0),
                            "early stopping triggered"
                        );
                        break;
                    }
                }
            }
        }

        // Keep only the rounds up to the best evaluation score
        if let Some(best) = self.best_iteration {
            self.trees.truncate(best + 1);
            info!(
                rounds = self.trees.len(),
                eval_logloss = best_score,
                "booster fitted"
            );
        } else {
            info!(rounds = self.trees.len(), "booster fitted without eval set");
        }

        Ok(())
    }

    fn predict_raw(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(FleetError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(FleetError::TrainingError(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(Array1::from_vec(
            x.rows()
                .into_iter()
                .map(|row| {
                    let s = row.as_slice().unwrap();
                    self.base_prediction
                        + self
                            .trees
                            .iter()
                            .map(|t| self.config.learning_rate * t.predict(s))
                            .sum::<f64>()
                })
                .collect(),
        ))
    }

    /// Class predictions at the default 0.5 boundary
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let raw = self.predict_raw(x)?;
        Ok(raw.mapv(|r| i64::from(sigmoid(r) >= 0.5)))
    }

    /// Positive-class probability per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let raw = self.predict_raw(x)?;
        Ok(raw.mapv(sigmoid))
    }

    /// Split counts per feature across the ensemble
    pub fn feature_importance(&self) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(FleetError::ModelNotFitted);
        }
        let mut counts = vec![0.0; self.n_features];
        for tree in &self.trees {
            tree.count_splits(&mut counts);
        }
        Ok(counts)
    }

    /// Round the ensemble was truncated to, when early stopping fired
    pub fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }

    /// Evaluation log loss per boosting round, as trained
    pub fn eval_history(&self) -> &[f64] {
        &self.eval_history
    }

    /// Number of trees kept in the ensemble
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
