//! Data loading and preparation
//!
//! CSV ingestion with label normalization, numeric coercion plus median
//! imputation, and simulated geolocation synthesis.

mod geo;
mod imputer;
mod loader;

pub use geo::GeoSynthesizer;
pub use imputer::{MedianImputer, MissingReport};
pub use loader::DatasetLoader;

use crate::error::{FleetError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Convert a fully numeric frame into the model-facing matrix form.
///
/// Returns the feature matrix (column order preserved, label excluded),
/// the label vector, and the feature names. Expects the label column to be
/// Int64 and every feature column to be Float64 without nulls, which is
/// what the loader and imputer guarantee.
pub fn to_matrix(df: &DataFrame, label_column: &str) -> Result<(Array2<f64>, Array1<i64>, Vec<String>)> {
    let label = df
        .column(label_column)
        .map_err(|_| FleetError::FeatureNotFound(label_column.to_string()))?;
    let y: Vec<i64> = label
        .as_materialized_series()
        .i64()
        .map_err(|e| FleetError::DataError(e.to_string()))?
        .into_no_null_iter()
        .collect();

    let mut feature_names = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();
    for name in df.get_column_names() {
        if name.as_str() == label_column {
            continue;
        }
        let series = df.column(name.as_str())?.as_materialized_series().clone();
        let values: Vec<f64> = series
            .f64()
            .map_err(|e| {
                FleetError::DataError(format!("column {} is not numeric: {}", name, e))
            })?
            .into_no_null_iter()
            .collect();
        if values.len() != y.len() {
            return Err(FleetError::DataError(format!(
                "column {} still contains missing values",
                name
            )));
        }
        feature_names.push(name.to_string());
        columns.push(values);
    }

    let n_rows = y.len();
    let n_cols = columns.len();
    let x = Array2::from_shape_fn((n_rows, n_cols), |(i, j)| columns[j][i]);

    Ok((x, Array1::from_vec(y), feature_names))
}
