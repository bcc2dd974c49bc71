//! Pipeline configuration
//!
//! Every constant of the workflow (input paths, geo anchor, risk threshold,
//! seeds, model hyperparameters) lives here so a run is fully described by
//! one serializable value.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::training::GbmConfig;

/// Fixed coordinate the simulated fleet is scattered around
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoAnchor {
    pub lat: f64,
    pub lon: f64,
}

impl GeoAnchor {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Full configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// First input CSV (training export)
    pub train_path: PathBuf,
    /// Second input CSV (test export), same schema
    pub test_path: PathBuf,
    /// Name of the label column, values `pos`/`neg`
    pub label_column: String,
    /// Directory the chart artifacts are written to
    pub output_dir: PathBuf,
    /// Directory the experiment tracker persists runs to
    pub tracking_dir: PathBuf,
    /// Output path of the risk map HTML document
    pub map_path: PathBuf,
    /// Experiment name the run is filed under
    pub experiment_name: String,
    /// Run name within the experiment
    pub run_name: String,
    /// Center of the synthesized fleet locations
    pub anchor: GeoAnchor,
    /// Standard deviation of the location noise, in degrees
    pub geo_std_dev: f64,
    /// Seed for location synthesis
    pub geo_seed: u64,
    /// Fraction of records held out for testing
    pub test_fraction: f64,
    /// Seed for the stratified split
    pub split_seed: u64,
    /// Seed for SMOTE oversampling
    pub smote_seed: u64,
    /// Probability above which a record is placed on the risk map
    pub risk_threshold: f64,
    /// Booster hyperparameters
    pub model: GbmConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from("aps_failure_training_set.csv"),
            test_path: PathBuf::from("aps_failure_test_set.csv"),
            label_column: "class".to_string(),
            output_dir: PathBuf::from("."),
            tracking_dir: PathBuf::from("./experiments"),
            map_path: PathBuf::from("failure_hotspot_map.html"),
            experiment_name: "Predictive_Fleet_Maintenance".to_string(),
            run_name: "LGBM_Geospatial_Risk_Model_v2".to_string(),
            anchor: GeoAnchor::new(41.8781, -87.6298),
            geo_std_dev: 0.5,
            geo_seed: 42,
            test_fraction: 0.3,
            split_seed: 42,
            smote_seed: 42,
            risk_threshold: 0.7,
            model: GbmConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Configuration with the given input files and defaults for the rest
    pub fn new(train_path: impl Into<PathBuf>, test_path: impl Into<PathBuf>) -> Self {
        Self {
            train_path: train_path.into(),
            test_path: test_path.into(),
            ..Default::default()
        }
    }

    /// Set the artifact output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the tracking directory
    pub fn with_tracking_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tracking_dir = dir.into();
        self
    }

    /// Set the risk map output path
    pub fn with_map_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.map_path = path.into();
        self
    }

    /// Set the risk probability threshold
    pub fn with_risk_threshold(mut self, threshold: f64) -> Self {
        self.risk_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the geo anchor point
    pub fn with_anchor(mut self, anchor: GeoAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Set the booster configuration
    pub fn with_model(mut self, model: GbmConfig) -> Self {
        self.model = model;
        self
    }

    /// Use one seed for every randomized stage
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.geo_seed = seed;
        self.split_seed = seed;
        self.smote_seed = seed;
        self.model.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.risk_threshold, 0.7);
        assert_eq!(config.test_fraction, 0.3);
        assert!((config.anchor.lat - 41.8781).abs() < 1e-9);
        assert!((config.anchor.lon + 87.6298).abs() < 1e-9);
        assert_eq!(config.geo_std_dev, 0.5);
    }

    #[test]
    fn test_with_seed_propagates() {
        let config = PipelineConfig::default().with_seed(7);
        assert_eq!(config.geo_seed, 7);
        assert_eq!(config.split_seed, 7);
        assert_eq!(config.smote_seed, 7);
        assert_eq!(config.model.seed, 7);
    }

    #[test]
    fn test_threshold_clamped() {
        let config = PipelineConfig::default().with_risk_threshold(1.5);
        assert_eq!(config.risk_threshold, 1.0);
    }

    #[test]
    fn test_config_roundtrip_json() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.risk_threshold, config.risk_threshold);
        assert_eq!(back.experiment_name, config.experiment_name);
    }
}
