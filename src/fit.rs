//! Least-squares polynomial fitting
//!
//! Fits low-degree polynomials (degree ≤ 2 in practice) by solving the
//! normal equations with Gaussian elimination and partial pivoting.
//! A singular system (duplicate x positions, too little spread) is
//! surfaced as a typed [`FitError`], never a numeric panic.

use thiserror::Error;

/// R² reported when the total sum of squares is zero (constant series).
///
/// A deliberate degenerate-case policy carried from the source data
/// model; overridable per call site.
pub const DEGENERATE_R_SQUARED: f64 = 0.0;

/// Errors from the least-squares solver.
#[derive(Debug, Error)]
pub enum FitError {
    /// The normal equations are singular; no unique fit exists.
    #[error("model could not be fit: {0}")]
    Degenerate(String),

    /// Fewer points than coefficients requested.
    #[error("need at least {needed} points for a degree-{degree} fit, got {got}")]
    TooFewPoints {
        needed: usize,
        got: usize,
        degree: usize,
    },
}

/// A fitted polynomial, coefficients in ascending order of degree.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Coefficients, constant term first.
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// Degree of the polynomial.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Evaluate at `x` via Horner's scheme.
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// The linear coefficient, i.e. the slope for a degree-1 fit.
    pub fn linear_term(&self) -> f64 {
        self.coeffs.get(1).copied().unwrap_or(0.0)
    }
}

/// Fit `y = c0 + c1·x + … + cd·x^d` by least squares.
///
/// # Arguments
/// * `x`, `y` - sample positions and values (equal length, programmer
///   error otherwise)
/// * `degree` - polynomial degree, `x.len()` must exceed it
///
/// # Errors
/// [`FitError::TooFewPoints`] when under-determined,
/// [`FitError::Degenerate`] when the normal equations are singular
/// (e.g. all x identical).
pub fn fit_polynomial(x: &[f64], y: &[f64], degree: usize) -> Result<Polynomial, FitError> {
    assert_eq!(x.len(), y.len(), "x/y sample length mismatch");

    let n = x.len();
    let m = degree + 1;
    if n < m {
        return Err(FitError::TooFewPoints {
            needed: m,
            got: n,
            degree,
        });
    }

    // Normal equations: A[i][j] = Σ x^(i+j), b[i] = Σ y·x^i
    let mut powers = vec![0.0_f64; 2 * degree + 1];
    let mut rhs = vec![0.0_f64; m];
    for (&xi, &yi) in x.iter().zip(y) {
        let mut xp = 1.0;
        for (k, p) in powers.iter_mut().enumerate() {
            *p += xp;
            if k < m {
                rhs[k] += yi * xp;
            }
            xp *= xi;
        }
    }

    let matrix: Vec<Vec<f64>> = (0..m)
        .map(|i| (0..m).map(|j| powers[i + j]).collect())
        .collect();

    let coeffs = solve_linear_system(matrix, rhs)?;
    Ok(Polynomial { coeffs })
}

/// R² = 1 − SS_res/SS_tot for observed vs predicted values.
///
/// When SS_tot is (numerically) zero the fit quality is undefined;
/// `degenerate` is reported instead; pass [`DEGENERATE_R_SQUARED`]
/// for the source-compatible default.
pub fn r_squared(observed: &[f64], predicted: &[f64], degenerate: f64) -> f64 {
    assert_eq!(observed.len(), predicted.len(), "observed/predicted length mismatch");
    if observed.is_empty() {
        return degenerate;
    }

    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    let ss_tot: f64 = observed.iter().map(|&v| (v - mean).powi(2)).sum();
    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(&o, &p)| (o - p).powi(2))
        .sum();

    if ss_tot > 1e-12 {
        1.0 - ss_res / ss_tot
    } else {
        degenerate
    }
}

/// Gaussian elimination with partial pivoting.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, FitError> {
    let n = b.len();

    // Singularity tolerance scaled to the matrix magnitude
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    let tolerance = (scale * 1e-12).max(1e-12);

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < tolerance {
            return Err(FitError::Degenerate(
                "singular normal equations (no x spread)".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0_f64; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in row + 1..n {
            acc -= a[row][k] * solution[k];
        }
        solution[row] = acc / a[row][row];
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0]; // y = 1 + 2x
        let poly = fit_polynomial(&x, &y, 1).unwrap();
        assert!((poly.coefficients()[0] - 1.0).abs() < 1e-9);
        assert!((poly.linear_term() - 2.0).abs() < 1e-9);
        assert!((poly.eval(10.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_exact_quadratic() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|&v| 2.0 + 0.5 * v + 3.0 * v * v).collect();
        let poly = fit_polynomial(&x, &y, 2).unwrap();
        assert_eq!(poly.degree(), 2);
        assert!((poly.eval(5.0) - (2.0 + 2.5 + 75.0)).abs() < 1e-6);
    }

    #[test]
    fn test_fit_noisy_line_slope_sign() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [10.0, 11.2, 11.9, 13.1, 13.8, 15.2];
        let poly = fit_polynomial(&x, &y, 1).unwrap();
        assert!(poly.linear_term() > 0.9);
    }

    #[test]
    fn test_fit_identical_x_is_degenerate() {
        let x = [2.0, 2.0, 2.0];
        let y = [1.0, 2.0, 3.0];
        match fit_polynomial(&x, &y, 1) {
            Err(FitError::Degenerate(_)) => {}
            other => panic!("expected Degenerate, got {:?}", other),
        }
    }

    #[test]
    fn test_fit_too_few_points() {
        match fit_polynomial(&[1.0], &[1.0], 1) {
            Err(FitError::TooFewPoints { needed: 2, got: 1, .. }) => {}
            other => panic!("expected TooFewPoints, got {:?}", other),
        }
    }

    #[test]
    fn test_r_squared_perfect_fit() {
        let y = [1.0, 2.0, 3.0];
        assert!((r_squared(&y, &y, DEGENERATE_R_SQUARED) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared_constant_series_uses_degenerate_value() {
        let y = [5.0, 5.0, 5.0];
        let pred = [5.0, 5.0, 5.0];
        assert_eq!(r_squared(&y, &pred, DEGENERATE_R_SQUARED), 0.0);
        assert_eq!(r_squared(&y, &pred, -1.0), -1.0);
    }

    #[test]
    fn test_r_squared_in_unit_interval_for_least_squares_fit() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = [10.0, 12.0, 11.0, 13.0, 12.5, 14.0, 13.0, 15.0, 14.5, 16.0];
        let poly = fit_polynomial(&x, &y, 1).unwrap();
        let predicted: Vec<f64> = x.iter().map(|&v| poly.eval(v)).collect();
        let r2 = r_squared(&y, &predicted, DEGENERATE_R_SQUARED);
        assert!((0.0..=1.0).contains(&r2), "r² out of range: {}", r2);
    }
}
