//! Candidate sampling strategies for randomized search

use super::search_space::{SearchSpace, TrialParams};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Type of sampler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerType {
    /// Independent random draws; all-discrete spaces are sampled without replacement
    Random,
    /// Latin hypercube: one draw per stratum per parameter
    LatinHypercube,
}

impl Default for SamplerType {
    fn default() -> Self {
        SamplerType::Random
    }
}

/// Trait for candidate samplers
pub trait Sampler: Send + Sync {
    /// Draw the candidate configurations for one search
    fn sample_candidates(&mut self, search_space: &SearchSpace, n_iter: usize) -> Vec<TrialParams>;
}

fn seeded_rng(seed: Option<u64>) -> Xoshiro256PlusPlus {
    match seed {
        Some(s) => Xoshiro256PlusPlus::seed_from_u64(s),
        None => Xoshiro256PlusPlus::from_entropy(),
    }
}

/// Random sampler
#[derive(Debug)]
pub struct RandomSampler {
    rng: Xoshiro256PlusPlus,
}

impl RandomSampler {
    /// Create a new random sampler
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded_rng(seed) }
    }
}

impl Sampler for RandomSampler {
    fn sample_candidates(&mut self, search_space: &SearchSpace, n_iter: usize) -> Vec<TrialParams> {
        match search_space.grid_size() {
            Some(grid_size) if grid_size <= n_iter => {
                if grid_size < n_iter {
                    tracing::warn!(
                        grid_size,
                        n_iter,
                        "Parameter grid is smaller than the iteration count, searching the full grid"
                    );
                }
                (0..grid_size).filter_map(|i| search_space.grid_point(i)).collect()
            }
            Some(grid_size) => rand::seq::index::sample(&mut self.rng, grid_size, n_iter)
                .into_iter()
                .filter_map(|i| search_space.grid_point(i))
                .collect(),
            None => (0..n_iter).map(|_| search_space.sample(&mut self.rng)).collect(),
        }
    }
}

/// Latin hypercube sampler
#[derive(Debug)]
pub struct LatinHypercubeSampler {
    rng: Xoshiro256PlusPlus,
}

impl LatinHypercubeSampler {
    /// Create a new Latin hypercube sampler
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded_rng(seed) }
    }
}

impl Sampler for LatinHypercubeSampler {
    fn sample_candidates(&mut self, search_space: &SearchSpace, n_iter: usize) -> Vec<TrialParams> {
        let mut candidates = vec![TrialParams::new(); n_iter];
        if n_iter == 0 {
            return candidates;
        }

        for param in search_space.parameters() {
            let mut strata: Vec<usize> = (0..n_iter).collect();
            strata.shuffle(&mut self.rng);
            for (candidate, stratum) in candidates.iter_mut().zip(strata) {
                let u = (stratum as f64 + self.rng.gen::<f64>()) / n_iter as f64;
                candidate.insert(param.name.clone(), param.quantile(u));
            }
        }

        candidates
    }
}

/// Create a sampler based on type
pub fn create_sampler(sampler_type: SamplerType, seed: Option<u64>) -> Box<dyn Sampler> {
    match sampler_type {
        SamplerType::Random => Box::new(RandomSampler::new(seed)),
        SamplerType::LatinHypercube => Box::new(LatinHypercubeSampler::new(seed)),
    }
}
