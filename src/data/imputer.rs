//! Numeric coercion and median imputation

use crate::error::{FleetError, Result};
use polars::prelude::*;
use tracing::info;

/// Percentage of missing values per column, measured after coercion and
/// before filling. Only columns with at least one missing entry appear,
/// sorted descending.
#[derive(Debug, Clone, Default)]
pub struct MissingReport {
    pub columns: Vec<(String, f64)>,
}

impl MissingReport {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Worst `n` columns by missing percentage
    pub fn head(&self, n: usize) -> &[(String, f64)] {
        &self.columns[..self.columns.len().min(n)]
    }
}

/// Coerces every feature column to Float64 and fills missing entries with
/// the column median computed over present values.
pub struct MedianImputer {
    label_column: String,
}

impl MedianImputer {
    pub fn new(label_column: impl Into<String>) -> Self {
        Self {
            label_column: label_column.into(),
        }
    }

    /// Coerce and impute all feature columns.
    ///
    /// Post-condition: no feature column contains a null. A column whose
    /// values are all missing has no median and is rejected.
    pub fn impute(&self, df: &DataFrame) -> Result<(DataFrame, MissingReport)> {
        let n_rows = df.height();
        let mut result = df.clone();
        let mut missing = Vec::new();

        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        for name in &names {
            if name == &self.label_column {
                continue;
            }
            let series = df.column(name)?.as_materialized_series().clone();

            // Non-strict cast: entries that fail numeric parsing become null
            let coerced = series.cast(&DataType::Float64)?;
            let n_missing = coerced.null_count();

            if n_missing == n_rows {
                return Err(FleetError::PreprocessingError(format!(
                    "column {name} has no present values, median is undefined"
                )));
            }
            if n_missing > 0 {
                missing.push((name.clone(), 100.0 * n_missing as f64 / n_rows as f64));
            }

            let ca = coerced
                .f64()
                .map_err(|e| FleetError::DataError(e.to_string()))?;
            let median = ca.median().ok_or_else(|| {
                FleetError::PreprocessingError(format!("column {name} has undefined median"))
            })?;

            let filled: Float64Chunked = ca
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(median)))
                .collect();
            result.with_column(filled.with_name(name.as_str().into()).into_series())?;
        }

        missing.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        info!(
            columns_with_missing = missing.len(),
            "imputation complete, no missing values remain"
        );

        Ok((result, MissingReport { columns: missing }))
    }
}
