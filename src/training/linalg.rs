//! Small dense linear-algebra kernels for symmetric positive-definite systems

use ndarray::{Array1, Array2};

/// Lower-triangular Cholesky factor `L` with `A = L Lᵀ`, or `None` if `A` is not
/// positive definite.
pub fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return None;
    }

    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

/// Cholesky with a small ridge added when the plain factorization fails
pub fn cholesky_regularized(a: &Array2<f64>) -> Option<Array2<f64>> {
    if let Some(l) = cholesky(a) {
        return Some(l);
    }

    let n = a.nrows();
    let scale = a.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    let mut ridge = 1e-10 * scale.max(1e-12);
    for _ in 0..6 {
        let mut a_reg = a.clone();
        for k in 0..n {
            a_reg[[k, k]] += ridge;
        }
        if let Some(l) = cholesky(&a_reg) {
            return Some(l);
        }
        ridge *= 100.0;
    }
    None
}

/// Solve `L Lᵀ x = b` given the Cholesky factor
pub fn cholesky_solve_factor(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // Forward substitution: L * y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

/// Solve the SPD system `A x = b`
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    if a.nrows() != b.len() {
        return None;
    }
    cholesky_regularized(a).map(|l| cholesky_solve_factor(&l, b))
}

/// Inverse of an SPD matrix, falling back to Gauss-Jordan elimination
pub fn spd_inverse(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    match cholesky_regularized(a) {
        Some(l) => {
            let mut inv = Array2::zeros((n, n));
            for col in 0..n {
                let mut e = Array1::zeros(n);
                e[col] = 1.0;
                inv.column_mut(col).assign(&cholesky_solve_factor(&l, &e));
            }
            Some(inv)
        }
        None => matrix_inverse(a),
    }
}

/// Matrix inversion using Gauss-Jordan elimination with partial pivoting
pub fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // Augmented matrix [M | I]
    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..2 * n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Some(aug.slice(ndarray::s![.., n..]).to_owned())
}

/// Numerically stable logistic sigmoid
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + exp(-z))` without overflow
pub fn log_one_plus_exp_neg(z: f64) -> f64 {
    if z > 0.0 {
        (-z).exp().ln_1p()
    } else {
        -z + z.exp().ln_1p()
    }
}
