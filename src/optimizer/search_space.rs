//! Search space definition for hyperparameters

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sampled parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    Int(i64),
    String(String),
    Bool(bool),
    /// Explicit "no value", e.g. an unbounded tree depth
    None,
}

impl ParameterValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            ParameterValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this is the explicit `None` value
    pub fn is_none(&self) -> bool {
        matches!(self, ParameterValue::None)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Int(v) => write!(f, "{}", v),
            ParameterValue::String(v) => write!(f, "'{}'", v),
            ParameterValue::Bool(v) => write!(f, "{}", v),
            ParameterValue::None => write!(f, "None"),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        ParameterValue::Int(v)
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Bool(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::String(v.to_string())
    }
}

/// How a parameter is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterType {
    /// Uniform choice from a fixed set of values
    Choice { values: Vec<ParameterValue> },
    /// Uniform integer in `[low, high)`
    IntUniform { low: i64, high: i64 },
    /// Uniform float in `[low, high)`
    FloatUniform { low: f64, high: f64 },
    /// Log-uniform float in `[low, high)`
    LogUniform { low: f64, high: f64 },
}

/// A single hyperparameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParameterType,
}

impl Parameter {
    /// Create a discrete parameter
    pub fn choice(name: impl Into<String>, values: Vec<ParameterValue>) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Choice { values },
        }
    }

    /// Create an integer parameter drawn from `[low, high)`
    pub fn int_uniform(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::IntUniform { low, high },
        }
    }

    /// Create a float parameter drawn from `[low, high)`
    pub fn float_uniform(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::FloatUniform { low, high },
        }
    }

    /// Create a log-scale float parameter
    pub fn log_uniform(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::LogUniform { low, high },
        }
    }

    /// Number of distinct values for discrete parameters
    pub fn n_choices(&self) -> Option<usize> {
        match &self.param_type {
            ParameterType::Choice { values } => Some(values.len()),
            _ => None,
        }
    }

    /// Sample a random value
    pub fn sample(&self, rng: &mut impl Rng) -> ParameterValue {
        self.quantile(rng.gen::<f64>())
    }

    /// Map a point `u` of the unit interval onto this parameter's distribution
    pub fn quantile(&self, u: f64) -> ParameterValue {
        let u = u.clamp(0.0, 1.0 - f64::EPSILON);
        match &self.param_type {
            ParameterType::Choice { values } => {
                let idx = ((u * values.len() as f64) as usize).min(values.len().saturating_sub(1));
                values.get(idx).cloned().unwrap_or(ParameterValue::None)
            }
            ParameterType::IntUniform { low, high } => {
                let span = (high - low).max(1) as f64;
                ParameterValue::Int(low + (u * span) as i64)
            }
            ParameterType::FloatUniform { low, high } => {
                ParameterValue::Float(low + u * (high - low))
            }
            ParameterType::LogUniform { low, high } => {
                let (log_low, log_high) = (low.ln(), high.ln());
                ParameterValue::Float((log_low + u * (log_high - log_low)).exp())
            }
        }
    }
}

/// Alias for a sampled configuration
pub type TrialParams = BTreeMap<String, ParameterValue>;

/// Format a configuration as `{name: value, ...}`
pub fn format_params(params: &TrialParams) -> String {
    let body: Vec<String> = params.iter().map(|(k, v)| format!("'{}': {}", k, v)).collect();
    format!("{{{}}}", body.join(", "))
}

/// Search space for hyperparameter optimization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
}

impl SearchSpace {
    /// Create a new empty search space
    pub fn new() -> Self {
        Self { parameters: Vec::new() }
    }

    /// Add a parameter to the search space
    pub fn add(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add a discrete parameter
    pub fn choice<V: Into<ParameterValue>>(self, name: impl Into<String>, values: Vec<V>) -> Self {
        self.add(Parameter::choice(name, values.into_iter().map(Into::into).collect()))
    }

    /// Add an integer parameter drawn from `[low, high)`
    pub fn int_uniform(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(Parameter::int_uniform(name, low, high))
    }

    /// Add a float parameter drawn from `[low, high)`
    pub fn float_uniform(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::float_uniform(name, low, high))
    }

    /// Add a log-scale float parameter
    pub fn log_uniform(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::log_uniform(name, low, high))
    }

    /// Get all parameters
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Sample a random configuration
    pub fn sample(&self, rng: &mut impl Rng) -> TrialParams {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.sample(rng)))
            .collect()
    }

    /// Size of the full grid when every parameter is discrete
    pub fn grid_size(&self) -> Option<usize> {
        self.parameters
            .iter()
            .try_fold(1usize, |acc, p| p.n_choices().and_then(|n| acc.checked_mul(n)))
    }

    /// Decode a flat grid index into a configuration (mixed radix, last parameter fastest)
    pub fn grid_point(&self, mut index: usize) -> Option<TrialParams> {
        let mut params = TrialParams::new();
        for p in self.parameters.iter().rev() {
            match &p.param_type {
                ParameterType::Choice { values } if !values.is_empty() => {
                    params.insert(p.name.clone(), values[index % values.len()].clone());
                    index /= values.len();
                }
                _ => return None,
            }
        }
        Some(params)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Get parameter names in order
    pub fn param_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }
}

/// `num` values evenly spaced on a log10 scale, endpoints included
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| 10f64.powf(start + step * i as f64)).collect()
        }
    }
}

/// `2^k` for `k = start, start + step, ...` below `stop`
pub fn pow2_range(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }
    let n = ((stop - start) / step).ceil() as usize;
    (0..n).map(|i| 2f64.powf(start + step * i as f64)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_search_space_builder() {
        let space = SearchSpace::new()
            .choice("max_depth", vec![ParameterValue::Int(5), ParameterValue::None])
            .int_uniform("min_samples_split", 2, 50)
            .choice("criterion", vec!["gini", "entropy"])
            .choice("bootstrap", vec![true, false]);

        assert_eq!(space.len(), 4);
        assert_eq!(space.grid_size(), None);
    }

    #[test]
    fn test_int_uniform_excludes_high() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let param = Parameter::int_uniform("leaf", 1, 50);

        for _ in 0..500 {
            let v = param.sample(&mut rng).as_int().unwrap();
            assert!((1..50).contains(&v));
        }
        assert_eq!(param.quantile(0.0), ParameterValue::Int(1));
        assert_eq!(param.quantile(1.0), ParameterValue::Int(49));
    }

    #[test]
    fn test_log_uniform_in_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let param = Parameter::log_uniform("c", 1e-3, 1e3);

        for _ in 0..100 {
            let v = param.sample(&mut rng).as_float().unwrap();
            assert!(v >= 1e-3 && v <= 1e3);
        }
    }

    #[test]
    fn test_grid_points_cover_grid() {
        let space = SearchSpace::new()
            .choice("kernel", vec!["linear", "rbf"])
            .choice("c", vec![1.0, 2.0, 4.0]);

        assert_eq!(space.grid_size(), Some(6));

        let mut seen: Vec<String> = (0..6)
            .map(|i| format_params(&space.grid_point(i).unwrap()))
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_logspace_endpoints() {
        let values = logspace(-9.0, 3.0, 13);
        assert_eq!(values.len(), 13);
        assert!((values[0] - 1e-9).abs() < 1e-20);
        assert!((values[9] - 1.0).abs() < 1e-12);
        assert!((values[12] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_pow2_range() {
        let values = pow2_range(-10.0, 11.0, 0.1);
        assert_eq!(values.len(), 210);
        assert!((values[0] - 2f64.powi(-10)).abs() < 1e-15);
        assert!((values[100] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_params() {
        let mut params = TrialParams::new();
        params.insert("kernel".to_string(), "rbf".into());
        params.insert("gamma".to_string(), ParameterValue::Float(0.5));
        assert_eq!(format_params(&params), "{'gamma': 0.5, 'kernel': 'rbf'}");
    }
}
