//! L2-penalised logistic regression
//!
//! Minimises `½‖w‖² + C·Σᵢ log(1 + exp(-sᵢ(xᵢ·w + b)))` with `sᵢ = ±1`. The
//! `liblinear` solver also penalises the intercept.

use super::linalg::{log_one_plus_exp_neg, sigmoid};
use super::models::{check_n_features, check_training_data, Classifier};
use crate::error::{MinerError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Optimisation algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Solver {
    /// Truncated Newton with conjugate-gradient inner solves
    NewtonCg,
    /// Limited-memory BFGS
    Lbfgs,
    /// Trust-region style Newton that also penalises the intercept
    Liblinear,
    /// Stochastic average gradient
    Sag,
}

impl Solver {
    /// Parse a solver name
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "newton-cg" => Ok(Solver::NewtonCg),
            "lbfgs" => Ok(Solver::Lbfgs),
            "liblinear" => Ok(Solver::Liblinear),
            "sag" => Ok(Solver::Sag),
            other => Err(MinerError::ConfigError(format!("Unknown solver '{}'", other))),
        }
    }

    /// Canonical solver name
    pub fn name(&self) -> &'static str {
        match self {
            Solver::NewtonCg => "newton-cg",
            Solver::Lbfgs => "lbfgs",
            Solver::Liblinear => "liblinear",
            Solver::Sag => "sag",
        }
    }
}

/// Logistic regression for binary classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: f64,
    /// Inverse regularization strength
    pub c: f64,
    /// Optimisation algorithm
    pub solver: Solver,
    /// Use the dual formulation (liblinear only)
    pub dual: bool,
    /// Stopping tolerance
    pub tol: f64,
    /// Maximum iterations (epochs for `sag`)
    pub max_iter: usize,
    /// Seed for the `sag` sample order
    pub random_state: Option<u64>,
    /// Iterations used by the last fit
    pub n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

/// Smooth objective shared by the batch solvers. Parameters are `[w, b]`.
struct Objective<'a> {
    x: &'a Array2<f64>,
    signs: Array1<f64>,
    c: f64,
    penalize_intercept: bool,
}

impl<'a> Objective<'a> {
    fn new(x: &'a Array2<f64>, y: &Array1<f64>, c: f64, penalize_intercept: bool) -> Self {
        Self {
            x,
            signs: y.mapv(|v| if v > 0.5 { 1.0 } else { -1.0 }),
            c,
            penalize_intercept,
        }
    }

    fn dim(&self) -> usize {
        self.x.ncols() + 1
    }

    fn margins(&self, theta: &Array1<f64>) -> Array1<f64> {
        let d = self.x.ncols();
        let w = theta.slice(ndarray::s![..d]);
        self.x.dot(&w) + theta[d]
    }

    fn reg_weight(&self, j: usize) -> f64 {
        if j < self.x.ncols() || self.penalize_intercept {
            1.0
        } else {
            0.0
        }
    }

    fn value(&self, theta: &Array1<f64>) -> f64 {
        let margins = self.margins(theta);
        let loss: f64 = margins
            .iter()
            .zip(self.signs.iter())
            .map(|(&m, &s)| log_one_plus_exp_neg(s * m))
            .sum();
        let reg: f64 = theta
            .iter()
            .enumerate()
            .map(|(j, &t)| 0.5 * self.reg_weight(j) * t * t)
            .sum();
        reg + self.c * loss
    }

    /// Gradient and the per-sample curvature `p(1-p)`
    fn gradient(&self, theta: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let d = self.x.ncols();
        let margins = self.margins(theta);

        // dℓ/dm = -s·σ(-s·m)
        let mut residual = Array1::<f64>::zeros(margins.len());
        let mut curvature = Array1::<f64>::zeros(margins.len());
        for i in 0..margins.len() {
            let s = self.signs[i];
            let q = sigmoid(-s * margins[i]);
            residual[i] = -s * q;
            curvature[i] = q * (1.0 - q);
        }

        let mut grad = Array1::<f64>::zeros(d + 1);
        grad.slice_mut(ndarray::s![..d])
            .assign(&(self.x.t().dot(&residual) * self.c));
        grad[d] = self.c * residual.sum();
        for j in 0..=d {
            grad[j] += self.reg_weight(j) * theta[j];
        }

        (grad, curvature)
    }

    fn hessian_vec(&self, curvature: &Array1<f64>, v: &Array1<f64>) -> Array1<f64> {
        let d = self.x.ncols();
        let xv = self.x.dot(&v.slice(ndarray::s![..d])) + v[d];
        let weighted = &xv * curvature;

        let mut hv = Array1::<f64>::zeros(d + 1);
        hv.slice_mut(ndarray::s![..d])
            .assign(&(self.x.t().dot(&weighted) * self.c));
        hv[d] = self.c * weighted.sum();
        for j in 0..=d {
            hv[j] += self.reg_weight(j) * v[j];
        }
        hv
    }
}

fn max_abs(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0f64, |acc, x| acc.max(x.abs()))
}

/// Backtracking line search along `direction`; returns the accepted step and value
fn armijo(
    objective: &Objective<'_>,
    theta: &Array1<f64>,
    value: f64,
    grad: &Array1<f64>,
    direction: &Array1<f64>,
) -> Option<(Array1<f64>, f64)> {
    let slope = grad.dot(direction);
    if slope >= 0.0 {
        return None;
    }

    let mut step = 1.0;
    for _ in 0..40 {
        let candidate = theta + &(direction * step);
        let candidate_value = objective.value(&candidate);
        if candidate_value <= value + 1e-4 * step * slope {
            return Some((candidate, candidate_value));
        }
        step *= 0.5;
    }
    None
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            c: 1.0,
            solver: Solver::Lbfgs,
            dual: false,
            tol: 1e-4,
            max_iter: 100,
            random_state: None,
            n_iter: 0,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set solver
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Request the dual formulation
    pub fn with_dual(mut self, dual: bool) -> Self {
        self.dual = dual;
        self
    }

    /// Set stopping tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) {
            return Err(MinerError::ConfigError(format!("C must be positive, got {}", self.c)));
        }
        if !(self.tol > 0.0) {
            return Err(MinerError::ConfigError(format!("tol must be positive, got {}", self.tol)));
        }
        if self.dual && self.solver != Solver::Liblinear {
            return Err(MinerError::ConfigError(format!(
                "dual formulation is only supported by liblinear, not {}",
                self.solver.name()
            )));
        }
        Ok(())
    }

    /// Signed distance to the decision boundary
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(MinerError::ModelNotFitted)?;
        check_n_features(coefficients.len(), x)?;
        Ok(x.dot(coefficients) + self.intercept)
    }

    fn fit_newton_cg(&mut self, objective: &Objective<'_>) -> Array1<f64> {
        let dim = objective.dim();
        let mut theta = Array1::<f64>::zeros(dim);
        let mut value = objective.value(&theta);

        for iter in 0..self.max_iter {
            let (grad, curvature) = objective.gradient(&theta);
            self.n_iter = iter;
            if max_abs(&grad) <= self.tol {
                return theta;
            }

            let direction = conjugate_gradient(objective, &curvature, &grad, dim);
            match armijo(objective, &theta, value, &grad, &direction) {
                Some((next, next_value)) => {
                    theta = next;
                    value = next_value;
                }
                None => break,
            }
        }

        tracing::debug!(solver = self.solver.name(), "Logistic regression did not converge");
        theta
    }

    fn fit_lbfgs(&mut self, objective: &Objective<'_>) -> Array1<f64> {
        const HISTORY: usize = 10;

        let dim = objective.dim();
        let mut theta = Array1::<f64>::zeros(dim);
        let mut value = objective.value(&theta);
        let (mut grad, _) = objective.gradient(&theta);
        let mut history: VecDeque<(Array1<f64>, Array1<f64>, f64)> = VecDeque::with_capacity(HISTORY);

        for iter in 0..self.max_iter {
            self.n_iter = iter;
            if max_abs(&grad) <= self.tol {
                return theta;
            }

            // Two-loop recursion
            let mut q = grad.clone();
            let mut alphas = Vec::with_capacity(history.len());
            for (s, y, rho) in history.iter().rev() {
                let alpha = rho * s.dot(&q);
                q = q - &(y * alpha);
                alphas.push(alpha);
            }
            let gamma = history
                .back()
                .map_or(1.0 / max_abs(&grad).max(1.0), |(s, y, _)| s.dot(y) / y.dot(y));
            let mut r = q * gamma;
            for ((s, y, rho), alpha) in history.iter().zip(alphas.iter().rev()) {
                let beta = rho * y.dot(&r);
                r = r + &(s * (alpha - beta));
            }
            let direction = -r;

            let (next, next_value) = match armijo(objective, &theta, value, &grad, &direction) {
                Some(accepted) => accepted,
                None => break,
            };
            let (next_grad, _) = objective.gradient(&next);

            let s = &next - &theta;
            let y = &next_grad - &grad;
            let sy = s.dot(&y);
            if sy > 1e-12 {
                if history.len() == HISTORY {
                    history.pop_front();
                }
                history.push_back((s, y, 1.0 / sy));
            }

            theta = next;
            value = next_value;
            grad = next_grad;
        }

        tracing::debug!(solver = self.solver.name(), "Logistic regression did not converge");
        theta
    }

    fn fit_sag(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Array1<f64> {
        let (n, d) = x.dim();
        // sag works on the objective divided by C·n
        let alpha = 1.0 / (self.c * n as f64);
        let max_sq_sum = x
            .rows()
            .into_iter()
            .map(|row| row.dot(&row))
            .fold(0.0f64, f64::max);
        let step = 1.0 / (0.25 * (max_sq_sum + 1.0) + alpha);

        let mut rng = match self.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut w = Array1::<f64>::zeros(d);
        let mut b = 0.0;
        let mut memory = vec![0.0; n];
        let mut seen = vec![false; n];
        let mut n_seen = 0usize;
        let mut sum_grad = Array1::<f64>::zeros(d);
        let mut sum_grad_b = 0.0;

        for epoch in 0..self.max_iter {
            self.n_iter = epoch + 1;
            let w_before = w.clone();
            let b_before = b;

            for _ in 0..n {
                let i = rng.gen_range(0..n);
                let row = x.row(i);
                let g = sigmoid(row.dot(&w) + b) - y[i];

                if !seen[i] {
                    seen[i] = true;
                    n_seen += 1;
                }
                let delta = g - memory[i];
                memory[i] = g;
                sum_grad.scaled_add(delta, &row);
                sum_grad_b += delta;

                let scale = step / n_seen as f64;
                w *= 1.0 - step * alpha;
                w.scaled_add(-scale, &sum_grad);
                b -= scale * sum_grad_b;
            }

            let max_weight = w.iter().chain(std::iter::once(&b)).fold(0.0f64, |a, v| a.max(v.abs()));
            let max_change = (&w - &w_before)
                .iter()
                .chain(std::iter::once(&(b - b_before)))
                .fold(0.0f64, |a, v| a.max(v.abs()));
            if max_weight == 0.0 || max_change / max_weight <= self.tol {
                return pack(&w, b);
            }
        }

        tracing::debug!(solver = self.solver.name(), "Logistic regression did not converge");
        pack(&w, b)
    }
}

fn pack(w: &Array1<f64>, b: f64) -> Array1<f64> {
    let mut theta = Array1::<f64>::zeros(w.len() + 1);
    theta.slice_mut(ndarray::s![..w.len()]).assign(w);
    theta[w.len()] = b;
    theta
}

/// Approximately solve `H p = -g` with conjugate gradient
fn conjugate_gradient(
    objective: &Objective<'_>,
    curvature: &Array1<f64>,
    grad: &Array1<f64>,
    dim: usize,
) -> Array1<f64> {
    let mut p = Array1::<f64>::zeros(dim);
    let mut r = -grad;
    let mut d = r.clone();
    let mut rs = r.dot(&r);
    let tolerance = (0.5f64.min(rs.sqrt().sqrt()) * rs.sqrt()).powi(2);

    for _ in 0..dim.max(10) {
        if rs <= tolerance {
            break;
        }
        let hd = objective.hessian_vec(curvature, &d);
        let curv = d.dot(&hd);
        if curv <= 0.0 {
            break;
        }
        let step = rs / curv;
        p.scaled_add(step, &d);
        r.scaled_add(-step, &hd);
        let rs_next = r.dot(&r);
        d = &r + &(d * (rs_next / rs));
        rs = rs_next;
    }

    if p.iter().all(|v| *v == 0.0) {
        -grad
    } else {
        p
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_data(x, y)?;
        self.validate()?;

        let d = x.ncols();
        let theta = match self.solver {
            Solver::NewtonCg => self.fit_newton_cg(&Objective::new(x, y, self.c, false)),
            Solver::Liblinear => self.fit_newton_cg(&Objective::new(x, y, self.c, true)),
            Solver::Lbfgs => self.fit_lbfgs(&Objective::new(x, y, self.c, false)),
            Solver::Sag => self.fit_sag(x, y),
        };

        if theta.iter().any(|v| !v.is_finite()) {
            return Err(MinerError::TrainingError(format!(
                "{} produced non-finite coefficients",
                self.solver.name()
            )));
        }

        self.coefficients = Some(theta.slice(ndarray::s![..d]).to_owned());
        self.intercept = theta[d];
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }
}
