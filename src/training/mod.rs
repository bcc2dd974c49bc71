//! Gradient-boosted failure classification
//!
//! A leaf-wise boosted tree ensemble for the binary failure objective,
//! trained with early stopping against a held-out evaluation set, plus the
//! scalar metrics the run reports.

mod config;
mod gbm;
mod metrics;

pub use config::GbmConfig;
pub use gbm::GbmClassifier;
pub use metrics::{binary_logloss, ClassificationReport};
