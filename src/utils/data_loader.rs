//! Data loading utilities

use crate::error::{MinerError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;

/// Loader for delimited text tables (statistics CSV, k-mer TSV)
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned to infer column types; `None` scans the whole file
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: None,
        }
    }

    /// Limit the number of rows used for schema inference.
    ///
    /// Columns typed from a prefix fail to parse on a later decimal value.
    pub fn with_infer_schema_length(mut self, n: Option<usize>) -> Self {
        self.infer_schema_length = n.map(|n| n.max(1));
        self
    }

    /// Load a comma-separated file with a header row
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        self.load_delimited(path, b',', true)
    }

    /// Load a tab-separated file
    pub fn load_tsv(&self, path: &Path, has_header: bool) -> Result<DataFrame> {
        self.load_delimited(path, b'\t', has_header)
    }

    /// Load a delimited text file with explicit options
    pub fn load_delimited(&self, path: &Path, delimiter: u8, has_header: bool) -> Result<DataFrame> {
        if !path.exists() {
            return Err(MinerError::DataError(format!(
                "input file not found: {}",
                path.display()
            )));
        }

        let start = Instant::now();
        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        let df = CsvReadOptions::default()
            .with_has_header(has_header)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| MinerError::DataError(format!("{}: {}", path.display(), e)))?
            .finish()
            .map_err(|e| MinerError::DataError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed = ?start.elapsed(),
            "Loaded table"
        );

        Ok(df)
    }
}

/// Names of all columns in frame order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.as_str().to_string())
        .collect()
}

/// Extract the named columns into a row-major `Array2<f64>`.
///
/// Every column is cast to Float64; nulls and unparseable cells become `0.0`.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| MinerError::DataError(format!("column not found: {}", col_name)))?;
            let column_f64 = column
                .cast(&DataType::Float64)
                .map_err(|e| MinerError::DataError(format!("column {}: {}", col_name, e)))?;
            let values: Vec<f64> = column_f64
                .f64()
                .map_err(|e| MinerError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Extract a column as strings; nulls become empty strings
pub fn string_column(df: &DataFrame, col_name: &str) -> Result<Vec<String>> {
    let column = df
        .column(col_name)
        .map_err(|_| MinerError::DataError(format!("column not found: {}", col_name)))?;
    let column_str = column
        .cast(&DataType::String)
        .map_err(|e| MinerError::DataError(format!("column {}: {}", col_name, e)))?;

    let values = column_str
        .str()
        .map_err(|e| MinerError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect();

    Ok(values)
}
