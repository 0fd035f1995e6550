//! Feature matrix construction from the statistics and k-mer tables

use crate::error::{MinerError, Result};
use crate::utils::data_loader::{column_names, columns_to_array2, string_column, DataLoader};
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column holding the sample identifier in the statistics table
pub const DEFAULT_ID_COLUMN: &str = "id";

/// Delimiter separating the class token from the rest of an identifier
pub const DEFAULT_ID_DELIMITER: char = '-';

/// Binary class encoded in a sample identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleClass {
    Negative,
    Positive,
}

impl SampleClass {
    /// Parse a class token (`positive` / `negative`)
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "positive" => Some(SampleClass::Positive),
            "negative" => Some(SampleClass::Negative),
            _ => None,
        }
    }

    /// Numeric label used by the classifiers
    pub fn label(self) -> f64 {
        match self {
            SampleClass::Positive => 1.0,
            SampleClass::Negative => 0.0,
        }
    }
}

/// Features, labels and bookkeeping produced by [`FeatureMatrixBuilder`]
#[derive(Debug, Clone)]
pub struct LabeledMatrix {
    /// Feature matrix (samples x features)
    pub x: Array2<f64>,
    /// Binary labels (1 = positive, 0 = negative)
    pub y: Array1<f64>,
    /// Sample identifiers in row order
    pub ids: Vec<String>,
    /// Feature names: statistics columns, then `kmer_<i>`
    pub feature_names: Vec<String>,
}

impl LabeledMatrix {
    /// Number of samples
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Number of features
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Count of (negative, positive) samples
    pub fn class_balance(&self) -> (usize, usize) {
        let positives = self.y.iter().filter(|&&v| v > 0.5).count();
        (self.y.len() - positives, positives)
    }
}

/// Builds the training matrix by positional alignment of the two feature sources
#[derive(Debug, Clone)]
pub struct FeatureMatrixBuilder {
    loader: DataLoader,
    id_column: String,
    id_delimiter: char,
}

impl Default for FeatureMatrixBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureMatrixBuilder {
    /// Create a builder with the default identifier conventions
    pub fn new() -> Self {
        Self {
            loader: DataLoader::new(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            id_delimiter: DEFAULT_ID_DELIMITER,
        }
    }

    /// Set the identifier column name
    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Set the identifier delimiter
    pub fn with_id_delimiter(mut self, delimiter: char) -> Self {
        self.id_delimiter = delimiter;
        self
    }

    /// Load both tables and merge them into one labeled matrix
    pub fn build(&self, stats_path: &Path, kmer_path: &Path) -> Result<LabeledMatrix> {
        let stats = self.loader.load_csv(stats_path)?;
        let kmer = self.loader.load_tsv(kmer_path, false)?;

        if stats.height() != kmer.height() {
            return Err(MinerError::ShapeError {
                expected: format!("{} k-mer rows (one per statistics row)", stats.height()),
                actual: format!("{} k-mer rows", kmer.height()),
            });
        }

        let stat_cols = column_names(&stats);
        if stat_cols.is_empty() {
            return Err(MinerError::DataError(format!(
                "{} has no columns",
                stats_path.display()
            )));
        }
        let id_col = if stat_cols.iter().any(|c| c == &self.id_column) {
            self.id_column.clone()
        } else {
            tracing::warn!(
                expected = %self.id_column,
                using = %stat_cols[0],
                "Identifier column not found, falling back to the first column"
            );
            stat_cols[0].clone()
        };

        let ids = string_column(&stats, &id_col)?;
        let y = self.encode_labels(&ids)?;

        let stat_features: Vec<String> = stat_cols.into_iter().filter(|c| c != &id_col).collect();
        let x_stats = columns_to_array2(&stats, &stat_features)?;

        // The k-mer producer terminates each line with a tab, so the last column is always empty
        let mut kmer_cols = column_names(&kmer);
        kmer_cols.pop();
        let x_kmer = columns_to_array2(&kmer, &kmer_cols)?;

        let x = concatenate(Axis(1), &[x_stats.view(), x_kmer.view()])?;

        let mut feature_names = stat_features;
        feature_names.extend((0..kmer_cols.len()).map(|i| format!("kmer_{}", i)));

        tracing::info!(
            samples = x.nrows(),
            stat_features = x_stats.ncols(),
            kmer_features = x_kmer.ncols(),
            "Built feature matrix"
        );

        Ok(LabeledMatrix { x, y, ids, feature_names })
    }

    /// Encode identifiers into binary labels from their leading class token
    pub fn encode_labels(&self, ids: &[String]) -> Result<Array1<f64>> {
        ids.iter()
            .enumerate()
            .map(|(row, id)| {
                let token = id.split(self.id_delimiter).next().unwrap_or_default();
                SampleClass::from_token(token)
                    .map(SampleClass::label)
                    .ok_or_else(|| MinerError::LabelError { row, id: id.clone() })
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }
}
