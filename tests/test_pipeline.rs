//! Integration tests: the full workflow from CSV exports to risk map

use std::fs;
use std::path::Path;

use fleet_risk::prelude::*;
use fleet_risk::training::GbmConfig;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

/// Write a small sensor export. Positive rows get clearly higher s1/s2
/// readings so the model has something to learn, and a few cells are "na"
/// to exercise imputation.
fn write_export(path: &Path, n_neg: usize, n_pos: usize, offset: usize) {
    let mut csv = String::from("class,s1,s2,s3\n");
    for i in 0..n_neg {
        let k = offset + i;
        let s2 = if k % 7 == 0 {
            "na".to_string()
        } else {
            format!("{:.1}", 20.0 + (k % 5) as f64)
        };
        csv.push_str(&format!("neg,{:.1},{},{:.1}\n", 10.0 + (k % 10) as f64, s2, 1.0));
    }
    for i in 0..n_pos {
        let k = offset + i;
        csv.push_str(&format!(
            "pos,{:.1},{:.1},{:.1}\n",
            80.0 + (k % 10) as f64,
            90.0 + (k % 5) as f64,
            2.0
        ));
    }
    fs::write(path, csv).unwrap();
}

fn test_config(dir: &Path) -> PipelineConfig {
    let train = dir.join("train.csv");
    let test = dir.join("test.csv");
    write_export(&train, 32, 8, 0);
    write_export(&test, 16, 4, 100);

    let model = GbmConfig {
        n_estimators: 40,
        early_stopping_rounds: 10,
        min_child_samples: 2,
        num_leaves: 8,
        ..GbmConfig::default()
    };

    let mut config = PipelineConfig::new(train, test)
        .with_output_dir(dir.join("artifacts"))
        .with_tracking_dir(dir.join("experiments"))
        .with_map_path(dir.join("failure_hotspot_map.html"))
        .with_model(model);
    config.experiment_name = "integration_test".to_string();
    config
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[test]
fn test_full_pipeline_run() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let report = fleet_risk::pipeline::run(&config).unwrap();

    assert_eq!(report.n_records, 60);
    // s1, s2, s3 plus the synthesized lat/lon
    assert_eq!(report.n_features, 5);
    assert_eq!(report.n_test, 18);
    // SMOTE balanced the training partition
    assert!(report.n_synthetic > 0);
    assert!(report.n_train > 42);
    assert!(report.n_trees > 0);

    assert!(report.metrics.f1 >= 0.0 && report.metrics.f1 <= 1.0);
    assert!(report.metrics.precision >= 0.0 && report.metrics.precision <= 1.0);
    assert!(report.metrics.recall >= 0.0 && report.metrics.recall <= 1.0);
    // Classes are well separated, the model should do better than chance
    assert!(report.metrics.f1 > 0.5);
}

#[test]
fn test_pipeline_writes_artifacts() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let report = fleet_risk::pipeline::run(&config).unwrap();

    let artifacts = dir.path().join("artifacts");
    assert!(artifacts.join("target_imbalance.svg").exists());
    assert!(artifacts.join("missing_data_head.svg").exists());
    assert!(artifacts.join("geo_distribution.svg").exists());
    assert!(artifacts.join("feature_importance.svg").exists());
    assert!(config.map_path.exists());

    let run_dir = dir.path().join("experiments").join(&report.run_id);
    assert!(run_dir.join("model.json").exists());
}

#[test]
fn test_pipeline_persists_finished_run() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    fleet_risk::pipeline::run(&config).unwrap();

    let experiment_file = dir.path().join("experiments/integration_test.json");
    let contents = fs::read_to_string(experiment_file).unwrap();
    let experiment: serde_json::Value = serde_json::from_str(&contents).unwrap();

    let runs = experiment["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["status"], "Finished");
    assert_eq!(runs[0]["run_name"], "LGBM_Geospatial_Risk_Model_v2");
    assert_eq!(runs[0]["params"]["objective"], "binary");
    assert!(runs[0]["metrics"]["f1_score"].is_number());
    // Stepped eval history was recorded
    assert!(!runs[0]["metrics_history"].as_array().unwrap().is_empty());
}

#[test]
fn test_pipeline_is_reproducible() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();

    let report_a = fleet_risk::pipeline::run(&test_config(dir_a.path())).unwrap();
    let report_b = fleet_risk::pipeline::run(&test_config(dir_b.path())).unwrap();

    assert_eq!(report_a.metrics.f1, report_b.metrics.f1);
    assert_eq!(report_a.n_trees, report_b.n_trees);
    assert_eq!(report_a.n_risk_markers, report_b.n_risk_markers);
    assert_eq!(report_a.n_train, report_b.n_train);
}

#[test]
fn test_map_markers_match_report() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let report = fleet_risk::pipeline::run(&config).unwrap();

    let html = fs::read_to_string(&config.map_path).unwrap();
    assert_eq!(html.matches("L.circleMarker").count(), report.n_risk_markers);
    assert!(html.contains("setView([41.878100, -87.629800], 8)"));
}

// ============================================================================
// Failure Modes
// ============================================================================

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::new(dir.path().join("absent.csv"), dir.path().join("also.csv"))
        .with_output_dir(dir.path())
        .with_tracking_dir(dir.path().join("experiments"));

    assert!(fleet_risk::pipeline::run(&config).is_err());
}

#[test]
fn test_wrong_label_column() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.label_column = "not_a_column".to_string();

    assert!(fleet_risk::pipeline::run(&config).is_err());
}
