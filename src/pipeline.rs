//! Linear training driver: load → subsample → split → train → ROC

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::evaluation::{evaluate_roc, RocEntry};
use crate::optimizer::TrialParams;
use crate::preprocessing::{train_test_split, FeatureMatrixBuilder, LabeledMatrix, TrainTestSplit};
use crate::synthetic::{BalancedSubsampler, RandomSubsampler, ResampleResult, Sampler};
use crate::training::{Algorithm, BuildOutcome, ModelBuilder};
use crate::visualization::RocPlot;
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Best model found for one algorithm
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub algorithm: Algorithm,
    pub best_score: f64,
    pub best_params: TrialParams,
    pub artifact_path: PathBuf,
    pub fit_time_secs: f64,
}

impl ModelSummary {
    pub fn new(outcome: &BuildOutcome, fit_time_secs: f64) -> Self {
        Self {
            algorithm: outcome.algorithm,
            best_score: outcome.best_score(),
            best_params: outcome.search.best_params().clone(),
            artifact_path: outcome.artifact_path.clone(),
            fit_time_secs,
        }
    }
}

/// What a full run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub n_samples: usize,
    pub n_features: usize,
    pub n_subset: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub models: Vec<ModelSummary>,
    pub roc: Vec<RocEntry>,
    pub roc_path: Option<PathBuf>,
}

/// Step notifications passed to [`Pipeline::run_with_progress`]
#[derive(Debug)]
pub enum Progress<'a> {
    Loading,
    Loaded(&'a LabeledMatrix),
    Subsampling,
    Subsampled(&'a ResampleResult),
    Splitting,
    Split(&'a TrainTestSplit),
    Training(Algorithm),
    Trained(&'a BuildOutcome, &'a ModelSummary),
    Plotting,
    Plotted(&'a [RocEntry]),
}

/// Runs every step of a training run in order.
///
/// The steps are public for callers that drive them one at a time; `run`
/// chains them and stops at the first error.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline, rejecting invalid settings
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read both feature files into one labelled matrix
    pub fn load(&self) -> Result<LabeledMatrix> {
        let data = FeatureMatrixBuilder::new().build(&self.config.stats_path, &self.config.kmer_path)?;
        let (negatives, positives) = data.class_balance();
        tracing::info!(
            samples = data.n_samples(),
            features = data.n_features(),
            positives,
            negatives,
            "Feature matrix loaded"
        );
        Ok(data)
    }

    /// Draw the random subset, class-balanced unless disabled
    pub fn subsample(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<ResampleResult> {
        let fraction = self.config.subsample_fraction();
        let sampler: Box<dyn Sampler> = if self.config.balance {
            let mut sampler = BalancedSubsampler::new().with_subsample_size(fraction);
            if let Some(seed) = self.config.seed {
                sampler = sampler.with_seed(seed);
            }
            Box::new(sampler)
        } else {
            let mut sampler = RandomSubsampler::new(fraction);
            if let Some(seed) = self.config.seed {
                sampler = sampler.with_seed(seed);
            }
            Box::new(sampler)
        };

        let subset = sampler.resample(x, y)?;
        tracing::info!(
            rows = subset.y.len(),
            balanced = self.config.balance,
            "Random subset drawn"
        );
        Ok(subset)
    }

    /// Hold out the configured share of rows for testing
    pub fn split(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainTestSplit> {
        let split = train_test_split(x, y, self.config.test_fraction(), self.config.seed)?;
        tracing::info!(train = split.n_train(), test = split.n_test(), "Train/test split");
        Ok(split)
    }

    /// Tune one algorithm on the training split and persist its best model
    pub fn train(&self, algorithm: Algorithm, split: &TrainTestSplit) -> Result<BuildOutcome> {
        let mut builder = ModelBuilder::new(algorithm).with_search_config(self.config.search_config());
        if self.config.sobol {
            builder = builder.with_sobol(self.config.sobol_num);
        }
        builder.build(&split.x_train, &split.y_train, &self.config.output_dir)
    }

    /// ROC curves of every fitted model, drawn on one plot
    pub fn roc(&self, outcomes: &[BuildOutcome], split: &TrainTestSplit) -> Result<Vec<RocEntry>> {
        let entries = outcomes
            .iter()
            .map(|outcome| evaluate_roc(outcome.algorithm.label(), &outcome.estimator, split, self.config.cv_folds))
            .collect::<Result<Vec<_>>>()?;
        RocPlot::default().save(&entries, &self.config.roc_output)?;
        Ok(entries)
    }

    /// Run every step
    pub fn run(&self) -> Result<PipelineReport> {
        self.run_with_progress(|_| {})
    }

    /// Run every step, reporting each one to `progress` as it starts and ends
    pub fn run_with_progress<F>(&self, mut progress: F) -> Result<PipelineReport>
    where
        F: FnMut(Progress<'_>),
    {
        progress(Progress::Loading);
        let data = self.load()?;
        progress(Progress::Loaded(&data));

        progress(Progress::Subsampling);
        let subset = self.subsample(&data.x, &data.y)?;
        progress(Progress::Subsampled(&subset));

        progress(Progress::Splitting);
        let split = self.split(&subset.x, &subset.y)?;
        progress(Progress::Split(&split));

        let mut outcomes = Vec::new();
        let mut models = Vec::new();
        for algorithm in self.config.algorithms() {
            progress(Progress::Training(algorithm));
            let start = Instant::now();
            let outcome = self.train(algorithm, &split)?;
            let summary = ModelSummary::new(&outcome, start.elapsed().as_secs_f64());
            progress(Progress::Trained(&outcome, &summary));
            models.push(summary);
            outcomes.push(outcome);
        }

        let (roc, roc_path) = if self.config.roc {
            progress(Progress::Plotting);
            let entries = self.roc(&outcomes, &split)?;
            progress(Progress::Plotted(&entries));
            (entries, Some(self.config.roc_output.clone()))
        } else {
            (Vec::new(), None)
        };

        Ok(PipelineReport {
            n_samples: data.n_samples(),
            n_features: data.n_features(),
            n_subset: subset.y.len(),
            n_train: split.n_train(),
            n_test: split.n_test(),
            models,
            roc,
            roc_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Pipeline::new(PipelineConfig::new().with_cv_folds(0)).is_err());
    }

    #[test]
    fn test_subsample_modes() {
        let x = Array2::from_shape_fn((12, 2), |(i, j)| (i * 2 + j) as f64);
        let y = array![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];

        let balanced = Pipeline::new(PipelineConfig::new().with_random_size(100.0).with_seed(1))
            .unwrap()
            .subsample(&x, &y)
            .unwrap();
        assert_eq!(balanced.y.len(), 8);
        assert_eq!(balanced.y.iter().filter(|&&v| v > 0.5).count(), 4);

        let plain = Pipeline::new(PipelineConfig::new().with_balance(false).with_random_size(50.0).with_seed(1))
            .unwrap()
            .subsample(&x, &y)
            .unwrap();
        assert_eq!(plain.y.len(), 6);
    }

    #[test]
    fn test_default_subsample_is_balanced() {
        let x = Array2::from_shape_fn((100, 3), |(i, j)| (i * 3 + j) as f64);
        let y = Array1::from_shape_fn(100, |i| if i < 80 { 1.0 } else { 0.0 });

        let subset = Pipeline::new(PipelineConfig::new().with_random_size(50.0).with_seed(3))
            .unwrap()
            .subsample(&x, &y)
            .unwrap();

        let positives = subset.y.iter().filter(|&&v| v > 0.5).count();
        assert_eq!(subset.y.len(), 20);
        assert_eq!(positives, 10);
        assert_eq!(subset.y.len() - positives, 10);
    }

    #[test]
    fn test_split_uses_percent() {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i + j) as f64);
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let split = Pipeline::new(PipelineConfig::new().with_test_size(30.0).with_seed(4))
            .unwrap()
            .split(&x, &y)
            .unwrap();
        assert_eq!(split.n_test(), 3);
        assert_eq!(split.n_train(), 7);
    }
}
