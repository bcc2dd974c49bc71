//! Fleet failure-risk pipeline
//!
//! An end-to-end workflow for predictive fleet maintenance:
//! - [`data`] - CSV loading, label normalization, median imputation, geo synthesis
//! - [`sampling`] - stratified train/test splitting and SMOTE oversampling
//! - [`training`] - gradient-boosted binary classifier with early stopping
//! - [`tracking`] - local experiment tracking (params, metrics, artifacts)
//! - [`report`] - SVG charts and the geospatial risk map
//! - [`pipeline`] - sequential orchestration of the whole run

pub mod error;

pub mod config;
pub mod data;
pub mod sampling;
pub mod training;
pub mod tracking;
pub mod report;
pub mod pipeline;

pub use error::{FleetError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{GeoAnchor, PipelineConfig};
    pub use crate::data::{DatasetLoader, GeoSynthesizer, MedianImputer, MissingReport};
    pub use crate::error::{FleetError, Result};
    pub use crate::pipeline::{run, PipelineReport};
    pub use crate::sampling::{Sampler, Smote, StratifiedSplit};
    pub use crate::training::{ClassificationReport, GbmClassifier, GbmConfig};
    pub use crate::tracking::{ExperimentTracker, RunStatus};
}
