//! Hyperparameter search
//!
//! Provides:
//! - Search spaces of discrete choices and sampling distributions
//! - Random and Latin hypercube candidate samplers
//! - Sobol low-discrepancy sequences for building value grids
//! - Randomized search with stratified cross-validation

mod config;
mod samplers;
mod search;
mod search_space;
pub mod sobol;

pub use config::SearchConfig;
pub use samplers::{create_sampler, LatinHypercubeSampler, RandomSampler, Sampler, SamplerType};
pub use search::{CandidateResult, FittedSearch, RandomizedSearch, SearchResult};
pub use search_space::{
    format_params, logspace, pow2_range, Parameter, ParameterType, ParameterValue, SearchSpace,
    TrialParams,
};
pub use sobol::{sobol_1d, SobolSequence};
