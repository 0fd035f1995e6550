//! Randomized hyperparameter search with cross-validation

use super::config::SearchConfig;
use super::samplers::create_sampler;
use super::search_space::{format_params, SearchSpace, TrialParams};
use crate::error::{MinerError, Result};
use crate::training::cross_validation::{cross_val_score, CVResults, CrossValidator};
use crate::training::Classifier;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Instant;

/// Outcome of evaluating one candidate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Sampled hyperparameters
    pub params: TrialParams,
    /// Per-fold accuracy
    pub cv: CVResults,
    /// 1 for the best candidate
    pub rank: usize,
    /// Wall time spent on all folds
    pub fit_time_secs: f64,
}

/// Results of a finished search, ranked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Candidates in sampling order
    pub candidates: Vec<CandidateResult>,
    /// Index of the best candidate
    pub best_index: usize,
}

impl SearchResult {
    /// Winning hyperparameters
    pub fn best_params(&self) -> &TrialParams {
        &self.candidates[self.best_index].params
    }

    /// Mean CV score of the winner, which is the maximum over all candidates
    pub fn best_score(&self) -> f64 {
        self.candidates[self.best_index].cv.mean_score
    }

    /// Candidates ordered by rank
    pub fn ranked(&self) -> Vec<&CandidateResult> {
        let mut ranked: Vec<&CandidateResult> = self.candidates.iter().collect();
        ranked.sort_by_key(|c| c.rank);
        ranked
    }

    /// Human-readable summary of the `n_top` best candidates
    pub fn report(&self, n_top: usize) -> String {
        let mut out = String::new();
        for candidate in self.ranked().into_iter().take(n_top) {
            let _ = writeln!(out, "Model with rank: {}", candidate.rank);
            let _ = writeln!(
                out,
                "Mean validation score: {:.3} (std: {:.3})",
                candidate.cv.mean_score, candidate.cv.std_score
            );
            let _ = writeln!(out, "Parameters: {}", format_params(&candidate.params));
            out.push('\n');
        }
        out
    }
}

/// Search result together with the winner refitted on the full training data
#[derive(Debug)]
pub struct FittedSearch<E> {
    pub results: SearchResult,
    pub best_estimator: E,
}

/// Randomized search over a parameter space
pub struct RandomizedSearch {
    search_space: SearchSpace,
    config: SearchConfig,
}

impl RandomizedSearch {
    /// Create a new search
    pub fn new(search_space: SearchSpace, config: SearchConfig) -> Self {
        Self { search_space, config }
    }

    /// Access the search space
    pub fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }

    /// Evaluate every candidate with stratified k-fold CV, then refit the best.
    ///
    /// `factory` turns a parameter set into an unfitted estimator. Candidates are
    /// scored in parallel; a candidate whose construction or fit fails scores NaN.
    pub fn fit<E, F>(&self, factory: F, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedSearch<E>>
    where
        E: Classifier,
        F: Fn(&TrialParams) -> Result<E> + Sync,
    {
        if x.nrows() != y.len() {
            return Err(MinerError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.config.n_iter == 0 {
            return Err(MinerError::ValidationError("n_iter must be at least 1".to_string()));
        }

        let mut sampler = create_sampler(self.config.sampler, self.config.random_state);
        let params = sampler.sample_candidates(&self.search_space, self.config.n_iter);
        if params.is_empty() {
            return Err(MinerError::ValidationError("Search space produced no candidates".to_string()));
        }

        let splits = CrossValidator::stratified(self.config.cv_folds).split(x.nrows(), Some(y))?;
        let n_folds = splits.len();

        tracing::info!(
            n_candidates = params.len(),
            n_folds,
            fits = params.len() * n_folds,
            "Starting randomized search"
        );

        let evaluated: Vec<(CVResults, f64)> = params
            .par_iter()
            .map(|candidate| {
                let start = Instant::now();
                let cv = match cross_val_score(|| factory(candidate), x, y, &splits, |e: &E, xt, yt| e.score(xt, yt)) {
                    Ok(cv) => cv,
                    Err(e) => {
                        tracing::warn!(params = %format_params(candidate), error = %e, "Candidate failed, scoring NaN");
                        CVResults::failed(n_folds)
                    }
                };
                (cv, start.elapsed().as_secs_f64())
            })
            .collect();

        let mut candidates: Vec<CandidateResult> = params
            .into_iter()
            .zip(evaluated)
            .map(|(params, (cv, fit_time_secs))| CandidateResult {
                params,
                cv,
                rank: 0,
                fit_time_secs,
            })
            .collect();

        let best_index = assign_ranks(&mut candidates).ok_or_else(|| {
            MinerError::TrainingError("All candidate fits failed".to_string())
        })?;

        let results = SearchResult { candidates, best_index };
        tracing::debug!(
            best_score = results.best_score(),
            params = %format_params(results.best_params()),
            "Refitting best candidate"
        );

        let mut best_estimator = factory(results.best_params())?;
        best_estimator.fit(x, y)?;

        Ok(FittedSearch { results, best_estimator })
    }
}

/// Rank by descending mean score, NaN last, ties in sampling order. Returns the
/// index of the best valid candidate.
fn assign_ranks(candidates: &mut [CandidateResult]) -> Option<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        let sa = candidates[a].cv.mean_score;
        let sb = candidates[b].cv.mean_score;
        match (sa.is_nan(), sb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal),
        }
    });

    for (rank, &idx) in order.iter().enumerate() {
        candidates[idx].rank = rank + 1;
    }

    order.first().copied().filter(|&idx| candidates[idx].cv.is_valid())
}
