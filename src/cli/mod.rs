//! Command-line interface
//!
//! Maps flags onto a [`PipelineConfig`] and runs the training pipeline with
//! progress lines on stdout.

use anyhow::Context;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::optimizer::format_params;
use crate::pipeline::{ModelSummary, Pipeline, Progress};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }

/// Progress line with a green stage prefix, e.g. `(preprocessing) import data`
fn stage(prefix: &str, msg: &str) {
    println!("{} {}", format!("({})", prefix).green(), msg);
}

fn preprocessing(msg: &str) { stage("preprocessing", msg); }
fn training(msg: &str)      { stage("training", msg); }

fn step_done(detail: &str) {
    println!("  {} {}", "done".truecolor(100, 210, 120), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("{}", title.white().bold());
    println!("{}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "plasmidminer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train classifiers that separate positive from negative plasmid samples")]
#[command(long_about = None)]
pub struct Cli {
    /// Test set size in percent of the random subset [default: 30]
    #[arg(short = 't', long = "test_size")]
    pub test_size: Option<f64>,

    /// Size of the random subset in percent [default: 10]
    #[arg(short = 'r', long = "random_size")]
    pub random_size: Option<f64>,

    /// Number of randomized-search iterations [default: 10]
    #[arg(short = 'i', long = "iterations")]
    pub iterations: Option<usize>,

    /// Number of cross-validation folds [default: 3]
    #[arg(short = 'c', long = "cv")]
    pub cv: Option<usize>,

    /// Sample search candidates with a Latin hypercube
    #[arg(long)]
    pub lhs: bool,

    /// Compute and plot ROC curves
    #[arg(long)]
    pub roc: bool,

    /// Draw a class-balanced subset (the default)
    #[arg(long)]
    pub balance: bool,

    /// Draw a plain random subset that keeps the class ratio
    #[arg(long = "no-balance", conflicts_with = "balance")]
    pub no_balance: bool,

    /// Build SVC/RVC search spaces from a Sobol sequence
    #[arg(long)]
    pub sobol: bool,

    /// Number of points in the Sobol sequence [default: 100]
    #[arg(long = "sobol_num")]
    pub sobol_num: Option<usize>,

    /// Summary-statistics CSV [default: dat/train.features.clear2.csv]
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// K-mer frequency table [default: dat/train.features.kmer]
    #[arg(long)]
    pub kmer: Option<PathBuf>,

    /// Directory for trained model artifacts [default: cv]
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// ROC plot file [default: roc.svg]
    #[arg(long = "roc-output")]
    pub roc_output: Option<PathBuf>,

    /// Also train a logistic regression model
    #[arg(long)]
    pub logistic: bool,

    /// Random seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON pipeline configuration; flags given on the command line override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve the effective configuration: defaults, then the config file, then flags
    pub fn to_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(v) = self.test_size { config.test_size = v; }
        if let Some(v) = self.random_size { config.random_size = v; }
        if let Some(v) = self.iterations { config.n_iter = v; }
        if let Some(v) = self.cv { config.cv_folds = v; }
        if let Some(v) = self.sobol_num { config.sobol_num = v; }
        if let Some(v) = &self.stats { config.stats_path = v.clone(); }
        if let Some(v) = &self.kmer { config.kmer_path = v.clone(); }
        if let Some(v) = &self.output { config.output_dir = v.clone(); }
        if let Some(v) = &self.roc_output { config.roc_output = v.clone(); }
        if self.seed.is_some() { config.seed = self.seed; }
        config.lhs |= self.lhs;
        config.roc |= self.roc;
        if self.balance { config.balance = true; }
        if self.no_balance { config.balance = false; }
        config.sobol |= self.sobol;
        config.logistic |= self.logistic;

        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Run the full training pipeline, printing progress as each step finishes
pub fn cmd_train(config: PipelineConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let config = pipeline.config();
    let mut started = Instant::now();

    let report = pipeline
        .run_with_progress(|progress| match progress {
            Progress::Loading => {
                preprocessing("import data");
                started = Instant::now();
            }
            Progress::Loaded(data) => step_done(&format!(
                "{} rows × {} features in {:?}",
                data.n_samples(),
                data.n_features(),
                started.elapsed()
            )),
            Progress::Subsampling => preprocessing("generate a random subset"),
            Progress::Subsampled(subset) => step_done(&format!("{} rows", subset.y.len())),
            Progress::Splitting => preprocessing("generate train/test set"),
            Progress::Split(split) => {
                step_done(&format!("{} train / {} test", split.n_train(), split.n_test()))
            }
            Progress::Training(algorithm) => {
                training(&format!("{}: search for best parameters", algorithm.label()))
            }
            Progress::Trained(outcome, summary) => {
                step_done(&format!(
                    "score {:.3} → {}",
                    summary.best_score,
                    summary.artifact_path.display()
                ));
                println!("{}", outcome.search.report(config.report_top));
            }
            Progress::Plotting => training("draw ROC curve"),
            Progress::Plotted(entries) => {
                for entry in entries {
                    println!(
                        "  ROC AUC: {:.2} (+/- {:.2}) [{}]",
                        entry.cv_auc.mean_score, entry.cv_auc.std_score, entry.label
                    );
                }
                step_done(&config.roc_output.display().to_string());
            }
        })
        .with_context(|| {
            format!(
                "training run on {} and {} failed",
                config.stats_path.display(),
                config.kmer_path.display()
            )
        })?;

    print_summary(&report.models);
    Ok(())
}

fn print_summary(summaries: &[ModelSummary]) {
    section("Best models");
    for summary in summaries {
        println!(
            "{:<22} {}  {}",
            muted(summary.algorithm.label()),
            format!("{:.4}", summary.best_score).white().bold(),
            dim(&format!("{:.1}s", summary.fit_time_secs))
        );
        println!("  {}", dim(&format_params(&summary.best_params)));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["plasmidminer", "-t", "20", "-r", "50", "-i", "4", "-c", "5"]).unwrap();
        let config = cli.to_config().unwrap();
        assert_eq!(config.test_size, 20.0);
        assert_eq!(config.random_size, 50.0);
        assert_eq!(config.n_iter, 4);
        assert_eq!(config.cv_folds, 5);
        assert!(!config.roc);
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "plasmidminer",
            "--test_size", "25",
            "--random_size", "100",
            "--iterations", "2",
            "--cv", "4",
            "--lhs",
            "--roc",
            "--balance",
            "--sobol",
            "--sobol_num", "32",
            "--logistic",
            "--seed", "7",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();
        assert!(config.lhs && config.roc && config.balance && config.sobol && config.logistic);
        assert_eq!(config.sobol_num, 32);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_defaults_match_config() {
        let cli = Cli::try_parse_from(["plasmidminer"]).unwrap();
        assert_eq!(cli.to_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"n_iter": 50, "cv_folds": 6}"#).unwrap();

        let cli = Cli::try_parse_from([
            "plasmidminer",
            "--config",
            path.to_str().unwrap(),
            "-i",
            "3",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();
        assert_eq!(config.n_iter, 3);
        assert_eq!(config.cv_folds, 6);
    }

    #[test]
    fn test_balance_is_default_and_can_be_disabled() {
        let cli = Cli::try_parse_from(["plasmidminer"]).unwrap();
        assert!(cli.to_config().unwrap().balance);

        let cli = Cli::try_parse_from(["plasmidminer", "--no-balance"]).unwrap();
        assert!(!cli.to_config().unwrap().balance);

        assert!(Cli::try_parse_from(["plasmidminer", "--balance", "--no-balance"]).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cli = Cli::try_parse_from(["plasmidminer", "-c", "1"]).unwrap();
        assert!(cli.to_config().is_err());
    }
}
