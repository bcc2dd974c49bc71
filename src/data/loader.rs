//! Sensor-export loading and label normalization

use crate::error::{FleetError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Loads the two sensor-failure exports and concatenates them into one
/// dataset with a normalized integer label.
pub struct DatasetLoader {
    /// Name of the label column in the raw files
    label_column: String,
    /// Rows sampled for schema inference
    infer_schema_rows: usize,
}

impl DatasetLoader {
    pub fn new(label_column: impl Into<String>) -> Self {
        Self {
            label_column: label_column.into(),
            infer_schema_rows: 100,
        }
    }

    /// Set the number of rows used for schema inference
    pub fn with_infer_schema_rows(mut self, n: usize) -> Self {
        self.infer_schema_rows = n;
        self
    }

    /// Load a single CSV file
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| FleetError::DataError(format!("{}: {}", path.display(), e)))?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_rows))
            .into_reader_with_file_handle(file);

        reader
            .finish()
            .map_err(|e| FleetError::DataError(format!("{}: {}", path.display(), e)))
    }

    /// Load both files, stack them, and normalize the label column.
    ///
    /// A schema mismatch between the two files surfaces as a `DataError`
    /// from the stacking step.
    pub fn load(&self, first: &Path, second: &Path) -> Result<DataFrame> {
        let head = self.load_csv(first)?;
        let tail = self.load_csv(second)?;

        let mut df = head.vstack(&tail)?;
        df.as_single_chunk_par();

        let df = self.normalize_labels(df)?;

        let n_features = df.width() - 1;
        info!(
            records = df.height(),
            features = n_features,
            "dataset loaded"
        );
        Ok(df)
    }

    /// Map `pos`/`neg` string labels to 1/0. Labels already encoded as
    /// integers are validated instead.
    fn normalize_labels(&self, mut df: DataFrame) -> Result<DataFrame> {
        let label = self.label_column.as_str();
        let series = df
            .column(label)
            .map_err(|_| FleetError::FeatureNotFound(label.to_string()))?
            .as_materialized_series()
            .clone();

        let normalized: Series = match series.dtype() {
            DataType::String => {
                let ca = series.str().map_err(|e| FleetError::DataError(e.to_string()))?;
                let mapped: std::result::Result<Int64Chunked, FleetError> = ca
                    .into_iter()
                    .map(|opt| match opt {
                        Some("pos") => Ok(Some(1i64)),
                        Some("neg") => Ok(Some(0i64)),
                        Some(other) => Err(FleetError::DataError(format!(
                            "unexpected label value: {other}"
                        ))),
                        None => Err(FleetError::DataError("missing label value".to_string())),
                    })
                    .collect();
                mapped?.with_name(label.into()).into_series()
            }
            dtype if dtype.is_integer() => {
                let cast = series.cast(&DataType::Int64)?;
                let ca = cast.i64().map_err(|e| FleetError::DataError(e.to_string()))?;
                for opt in ca.into_iter() {
                    match opt {
                        Some(0) | Some(1) => {}
                        Some(v) => {
                            return Err(FleetError::DataError(format!(
                                "unexpected label value: {v}"
                            )))
                        }
                        None => {
                            return Err(FleetError::DataError("missing label value".to_string()))
                        }
                    }
                }
                cast
            }
            other => {
                return Err(FleetError::DataError(format!(
                    "label column {label} has unsupported dtype {other}"
                )))
            }
        };

        df.with_column(normalized)?;
        Ok(df)
    }
}
