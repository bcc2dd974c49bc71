//! Fleet failure-risk pipeline - CLI entry point

use std::path::PathBuf;

use clap::Parser;
use fleet_risk::prelude::*;

/// Train a failure-risk model from two sensor CSV exports and render the
/// geospatial risk map.
#[derive(Parser, Debug)]
#[command(name = "fleet-risk", version, about)]
struct Cli {
    /// Training CSV export
    train: PathBuf,

    /// Test CSV export (same schema, merged with the training file)
    test: PathBuf,

    /// Name of the label column
    #[arg(long, default_value = "class")]
    label: String,

    /// Directory for chart artifacts
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Directory for experiment tracking data
    #[arg(long, default_value = "./experiments")]
    tracking_dir: PathBuf,

    /// Output path of the risk map HTML document
    #[arg(long, default_value = "failure_hotspot_map.html")]
    map_file: PathBuf,

    /// Probability above which a record is placed on the risk map
    #[arg(long, default_value_t = 0.7)]
    threshold: f64,

    /// Latitude the simulated fleet is scattered around
    #[arg(long, default_value_t = 41.8781)]
    anchor_lat: f64,

    /// Longitude the simulated fleet is scattered around
    #[arg(long, default_value_t = -87.6298)]
    anchor_lon: f64,

    /// Seed for every randomized stage
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleet_risk=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = PipelineConfig::new(cli.train, cli.test)
        .with_output_dir(cli.output_dir)
        .with_tracking_dir(cli.tracking_dir)
        .with_map_path(cli.map_file)
        .with_risk_threshold(cli.threshold)
        .with_anchor(GeoAnchor::new(cli.anchor_lat, cli.anchor_lon))
        .with_seed(cli.seed);
    config.label_column = cli.label;

    let report = fleet_risk::pipeline::run(&config)?;

    println!("Run {} finished", report.run_id);
    println!(
        "  records: {} ({} features), train: {} (+{} synthetic), test: {}",
        report.n_records, report.n_features, report.n_train, report.n_synthetic, report.n_test
    );
    println!(
        "  trees: {} (best iteration: {})",
        report.n_trees,
        report
            .best_iteration
            .map_or_else(|| "-".to_string(), |i| i.to_string())
    );
    println!(
        "  f1: {:.4}  precision: {:.4}  recall: {:.4}",
        report.metrics.f1, report.metrics.precision, report.metrics.recall
    );
    println!(
        "  risk map: {} ({} markers)",
        report.map_path.display(),
        report.n_risk_markers
    );

    Ok(())
}
