//! Kernel functions shared by the kernel classifiers

use crate::error::{MinerError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Kernel function type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Radial Basis Function (Gaussian): K(x, y) = exp(-γ * ||x - y||²)
    RBF { gamma: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::RBF { gamma: 1.0 }
    }
}

impl KernelType {
    /// Build a kernel from its name and an RBF width; `gamma` is ignored by `linear`
    pub fn from_name(name: &str, gamma: f64) -> Result<Self> {
        match name {
            "linear" => Ok(KernelType::Linear),
            "rbf" => {
                if !(gamma > 0.0) || !gamma.is_finite() {
                    return Err(MinerError::ConfigError(format!(
                        "RBF gamma must be positive, got {}",
                        gamma
                    )));
                }
                Ok(KernelType::RBF { gamma })
            }
            other => Err(MinerError::ConfigError(format!("Unknown kernel '{}'", other))),
        }
    }

    /// Kernel name
    pub fn name(&self) -> &'static str {
        match self {
            KernelType::Linear => "linear",
            KernelType::RBF { .. } => "rbf",
        }
    }

    /// Kernel between two vectors
    pub fn compute(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            KernelType::Linear => a.dot(&b),
            KernelType::RBF { gamma } => {
                let sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * sq).exp()
            }
        }
    }

    /// Kernel matrix between the rows of `a` and the rows of `b`
    pub fn matrix(&self, a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
        let mut k = a.dot(&b.t());
        if let KernelType::RBF { gamma } = *self {
            let a_norms: Array1<f64> = a.map_axis(Axis(1), |row| row.dot(&row));
            let b_norms: Array1<f64> = b.map_axis(Axis(1), |row| row.dot(&row));
            Zip::indexed(&mut k).par_for_each(|(i, j), v| {
                let sq = (a_norms[i] + b_norms[j] - 2.0 * *v).max(0.0);
                *v = (-gamma * sq).exp();
            });
        }
        k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_matrix_matches_pairwise() {
        let a = array![[0.0, 1.0], [2.0, 3.0], [1.0, -1.0]];
        let b = array![[1.0, 1.0], [0.5, 2.0]];

        for kernel in [KernelType::Linear, KernelType::RBF { gamma: 0.3 }] {
            let k = kernel.matrix(&a, &b);
            assert_eq!(k.dim(), (3, 2));
            for i in 0..3 {
                for j in 0..2 {
                    let expected = kernel.compute(a.row(i), b.row(j));
                    assert!((k[[i, j]] - expected).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_rbf_diagonal_is_one() {
        let a = array![[3.0, 4.0], [-1.0, 0.5]];
        let k = KernelType::RBF { gamma: 2.0 }.matrix(&a, &a);
        assert!((k[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((k[[1, 1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(KernelType::from_name("linear", 0.0).unwrap(), KernelType::Linear);
        assert_eq!(
            KernelType::from_name("rbf", 0.5).unwrap(),
            KernelType::RBF { gamma: 0.5 }
        );
        assert!(KernelType::from_name("rbf", 0.0).is_err());
        assert!(KernelType::from_name("poly", 1.0).is_err());
    }
}
