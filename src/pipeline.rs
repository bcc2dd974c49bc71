//! Sequential orchestration of the full workflow
//!
//! Load and merge the sensor exports, impute, synthesize locations, render
//! the exploratory charts, split and oversample, train the booster under an
//! experiment run, then emit the geospatial risk map.

use std::fs;
use std::path::PathBuf;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::data::{to_matrix, DatasetLoader, GeoSynthesizer, MedianImputer};
use crate::error::{FleetError, Result};
use crate::report::{
    render_class_imbalance, render_feature_importance, render_geo_scatter, render_missing_data,
    render_risk_map, RiskMarker,
};
use crate::sampling::{class_counts, Sampler, Smote, SplitResult, StratifiedSplit};
use crate::training::{ClassificationReport, GbmClassifier};
use crate::tracking::{ExperimentTracker, RunStatus};

const TOP_N_CHART_ROWS: usize = 20;
const MAP_ZOOM: u8 = 8;

/// Summary of one completed pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: String,
    /// Records after merging both input files
    pub n_records: usize,
    pub n_features: usize,
    /// Training rows after oversampling
    pub n_train: usize,
    pub n_test: usize,
    /// Synthetic rows SMOTE added to the training partition
    pub n_synthetic: usize,
    pub metrics: ClassificationReport,
    pub best_iteration: Option<usize>,
    pub n_trees: usize,
    /// Held-out records above the risk threshold, one marker each
    pub n_risk_markers: usize,
    pub map_path: PathBuf,
}

/// Execute the whole pipeline described by `config`.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    info!(
        train = %config.train_path.display(),
        test = %config.test_path.display(),
        "pipeline started"
    );

    let loader = DatasetLoader::new(&config.label_column);
    let df = loader.load(&config.train_path, &config.test_path)?;
    info!(rows = df.height(), cols = df.width(), "datasets merged");

    let imputer = MedianImputer::new(&config.label_column);
    let (df, missing) = imputer.impute(&df)?;
    if missing.is_empty() {
        info!("no missing values found");
    } else {
        info!(columns = missing.columns.len(), "missing values imputed");
    }

    let synthesizer = GeoSynthesizer::new(config.anchor, config.geo_std_dev, config.geo_seed);
    let df = synthesizer.synthesize(&df)?;

    let (x, y, feature_names) = to_matrix(&df, &config.label_column)?;

    fs::create_dir_all(&config.output_dir)?;
    let mut charts = Vec::new();

    let counts = class_counts(&y);
    let n_neg = counts.get(&0).copied().unwrap_or(0);
    let n_pos = counts.get(&1).copied().unwrap_or(0);
    info!(n_neg, n_pos, "class balance before resampling");
    let imbalance_chart = config.output_dir.join("target_imbalance.svg");
    render_class_imbalance(n_neg, n_pos, &imbalance_chart)?;
    charts.push(imbalance_chart);

    if !missing.is_empty() {
        let missing_chart = config.output_dir.join("missing_data_head.svg");
        render_missing_data(&missing, TOP_N_CHART_ROWS, &missing_chart)?;
        charts.push(missing_chart);
    }

    let (lat_idx, lon_idx) = locate_coordinates(&feature_names)?;
    let points: Vec<(f64, f64)> = (0..x.nrows())
        .map(|i| (x[[i, lon_idx]], x[[i, lat_idx]]))
        .collect();
    let geo_chart = config.output_dir.join("geo_distribution.svg");
    render_geo_scatter(&points, &geo_chart)?;
    charts.push(geo_chart);

    let split = StratifiedSplit::new(config.test_fraction, config.split_seed).split(&x, &y)?;
    info!(
        train = split.x_train.nrows(),
        test = split.x_test.nrows(),
        "stratified split done"
    );

    let mut smote = Smote::new().with_seed(config.smote_seed);
    let resampled = smote.fit_resample(&split.x_train, &split.y_train)?;
    let n_synthetic: usize = resampled.n_synthetic.values().sum();
    info!(
        rows = resampled.x.nrows(),
        synthetic = n_synthetic,
        "training partition oversampled"
    );

    let tracker = ExperimentTracker::new(&config.tracking_dir, &config.experiment_name)?;
    let run_id = tracker.start_run(&config.run_name);
    for chart in &charts {
        tracker.log_artifact(chart);
    }
    tracker.log_params(config.model.as_params());

    let (model, metrics) = match train_and_evaluate(
        config,
        &tracker,
        &resampled.x,
        &resampled.y,
        &split,
        &feature_names,
    ) {
        Ok(outcome) => {
            tracker.end_run(RunStatus::Finished);
            tracker.save()?;
            outcome
        }
        Err(e) => {
            warn!(error = %e, "run failed");
            tracker.end_run(RunStatus::Failed);
            if let Err(save_err) = tracker.save() {
                warn!(error = %save_err, "could not persist failed run");
            }
            return Err(e);
        }
    };

    // The map is a view over the held-out records only
    let probabilities = model.predict_proba(&split.x_test)?;
    let markers = collect_risk_markers(
        &split.x_test,
        &probabilities,
        lat_idx,
        lon_idx,
        config.risk_threshold,
    );
    render_risk_map(&markers, config.anchor, MAP_ZOOM, &config.map_path)?;
    info!(
        markers = markers.len(),
        threshold = config.risk_threshold,
        "risk map rendered"
    );

    Ok(PipelineReport {
        run_id,
        n_records: x.nrows(),
        n_features: feature_names.len(),
        n_train: resampled.x.nrows(),
        n_test: split.x_test.nrows(),
        n_synthetic,
        best_iteration: model.best_iteration(),
        n_trees: model.n_trees(),
        n_risk_markers: markers.len(),
        map_path: config.map_path.clone(),
        metrics,
    })
}

/// Train the booster against the held-out partition and log everything on
/// the open run. Split out so a failure can mark the run as failed.
fn train_and_evaluate(
    config: &PipelineConfig,
    tracker: &ExperimentTracker,
    x_train: &Array2<f64>,
    y_train: &Array1<i64>,
    split: &SplitResult,
    feature_names: &[String],
) -> Result<(GbmClassifier, ClassificationReport)> {
    let y_train_f = y_train.mapv(|v| v as f64);
    let y_test_f = split.y_test.mapv(|v| v as f64);

    let mut model = GbmClassifier::new(config.model.clone());
    model.fit(x_train, &y_train_f, Some((&split.x_test, &y_test_f)))?;

    for (step, score) in model.eval_history().iter().enumerate() {
        tracker.log_metric("eval_logloss", *score, Some(step as u64));
    }

    let y_pred = model.predict(&split.x_test)?;
    let metrics = ClassificationReport::from_predictions(&split.y_test, &y_pred);
    info!(
        f1 = metrics.f1,
        precision = metrics.precision,
        recall = metrics.recall,
        "held-out evaluation"
    );
    tracker.log_metric("f1_score", metrics.f1, None);
    tracker.log_metric("precision", metrics.precision, None);
    tracker.log_metric("recall", metrics.recall, None);

    let importance = model.feature_importance()?;
    let importance_chart = config.output_dir.join("feature_importance.svg");
    render_feature_importance(feature_names, &importance, TOP_N_CHART_ROWS, &importance_chart)?;
    tracker.log_artifact(&importance_chart);

    tracker.log_json_artifact("model.json", &model)?;

    Ok((model, metrics))
}

fn locate_coordinates(feature_names: &[String]) -> Result<(usize, usize)> {
    let find = |name: &str| {
        feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| FleetError::FeatureNotFound(name.to_string()))
    };
    Ok((find("lat")?, find("lon")?))
}

fn collect_risk_markers(
    x: &Array2<f64>,
    probabilities: &Array1<f64>,
    lat_idx: usize,
    lon_idx: usize,
    threshold: f64,
) -> Vec<RiskMarker> {
    probabilities
        .iter()
        .enumerate()
        .filter(|(_, &p)| p > threshold)
        .map(|(i, &p)| RiskMarker {
            lat: x[[i, lat_idx]],
            lon: x[[i, lon_idx]],
            probability: p,
        })
        .collect()
}
