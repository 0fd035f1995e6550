//! Persisted result of one model builder run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{MinerError, Result};
use crate::optimizer::{CandidateResult, SearchResult, TrialParams};
use crate::training::Estimator;

/// Best estimator of a search together with the evidence for choosing it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Algorithm name, also the file name prefix
    pub algorithm: String,
    /// Best mean cross-validation accuracy
    pub best_score: f64,
    /// Winning hyperparameters
    pub best_params: TrialParams,
    /// Every evaluated candidate
    pub cv_results: Vec<CandidateResult>,
    /// Estimator refitted on the full training split
    pub estimator: Estimator,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Crate version that wrote the artifact
    pub version: String,
}

impl ModelArtifact {
    /// Bundle a finished search with its refitted estimator
    pub fn new(algorithm: impl Into<String>, search: &SearchResult, estimator: Estimator) -> Self {
        Self {
            algorithm: algorithm.into(),
            best_score: search.best_score(),
            best_params: search.best_params().clone(),
            cv_results: search.candidates.clone(),
            estimator,
            created_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// `<algorithm>_<best score>.json`; whole-number scores keep their `.0`
    pub fn file_name(&self) -> String {
        format!("{}_{:?}.json", self.algorithm, self.best_score)
    }

    /// Write the artifact into `dir`, creating the directory if needed
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                MinerError::DataError(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }

        let path = dir.join(self.file_name());
        let file = File::create(&path).map_err(|e| {
            MinerError::DataError(format!("Failed to create {}: {}", path.display(), e))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| {
            MinerError::SerializationError(format!("Failed to write artifact: {}", e))
        })?;

        tracing::info!(path = %path.display(), "Saved model artifact");
        Ok(path)
    }

    /// Read an artifact written by [`ModelArtifact::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            MinerError::DataError(format!("Failed to open {}: {}", path.display(), e))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            MinerError::SerializationError(format!("Failed to read artifact: {}", e))
        })
    }
}
