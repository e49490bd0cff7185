//! Root finding for rate-of-return problems
//!
//! Newton iteration with the derivative estimated by the secant through the two
//! most recent iterates, so callers only supply `f(r)`. Shared by RATE, IRR and
//! XIRR.

use crate::error::{CalcError, CalcResult};

/// Convergence is declared once a step moves the estimate by less than this
pub const TOLERANCE: f64 = 1e-10;

/// Upper bound on iterations before reporting non-convergence
pub const MAX_ITERATIONS: u32 = 100;

/// Relative offset used to seed the second secant point from the guess
const SECANT_SEED: f64 = 1e-4;

/// Tolerance and iteration cap for [`find_root_with`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

/// Find a root of `f` starting from `guess` with the default configuration
pub fn find_root<F>(f: F, guess: f64) -> CalcResult<f64>
where
    F: Fn(f64) -> f64,
{
    find_root_with(f, guess, &SolverConfig::default())
}

/// Find a root of `f` starting from `guess`.
///
/// # Arguments
/// * `f` - Function whose root is sought; may return NaN outside its domain
/// * `guess` - Starting estimate
/// * `config` - Step tolerance and iteration cap
///
/// # Returns
/// * `CalcResult<f64>` - The root, or `CalcError::NonConvergence` when the cap is
///   reached, the secant slope vanishes, or an iterate leaves the finite domain
pub fn find_root_with<F>(f: F, guess: f64, config: &SolverConfig) -> CalcResult<f64>
where
    F: Fn(f64) -> f64,
{
    if !guess.is_finite() {
        return Err(non_convergence(0, guess));
    }

    let mut p0 = guess;
    let mut p1 = if guess >= 0.0 {
        guess * (1.0 + SECANT_SEED) + SECANT_SEED
    } else {
        guess * (1.0 + SECANT_SEED) - SECANT_SEED
    };
    let mut q0 = f(p0);
    let mut q1 = f(p1);

    // Keep the point with the smaller residual as the most recent iterate
    if q1.abs() < q0.abs() {
        std::mem::swap(&mut p0, &mut p1);
        std::mem::swap(&mut q0, &mut q1);
    }

    for iteration in 0..config.max_iterations {
        if !q0.is_finite() || !q1.is_finite() {
            return Err(non_convergence(iteration, p1));
        }
        if q1 == 0.0 {
            return Ok(p1);
        }
        if q1 == q0 {
            // Flat secant: no usable derivative estimate
            return Err(non_convergence(iteration, p1));
        }

        let next = if q1.abs() > q0.abs() {
            (-q0 / q1 * p1 + p0) / (1.0 - q0 / q1)
        } else {
            (-q1 / q0 * p0 + p1) / (1.0 - q1 / q0)
        };

        if !next.is_finite() {
            return Err(non_convergence(iteration, p1));
        }

        if (next - p1).abs() < config.tolerance {
            return Ok(next);
        }

        p0 = p1;
        q0 = q1;
        p1 = next;
        q1 = f(p1);
    }

    Err(non_convergence(config.max_iterations, p1))
}

fn non_convergence(iterations: u32, last_estimate: f64) -> CalcError {
    CalcError::NonConvergence {
        iterations,
        last_estimate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_square_root() {
        let root = find_root(|x| x * x - 2.0, 1.0).unwrap();
        assert_abs_diff_eq!(root, std::f64::consts::SQRT_2, epsilon = 1e-10);
    }

    #[test]
    fn test_negative_root_from_positive_guess() {
        // (1+r)^4 = 0.5 has its root below zero
        let root = find_root(|r| (1.0 + r).powi(4) - 0.5, 0.1).unwrap();
        assert_abs_diff_eq!(root, 0.5_f64.powf(0.25) - 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_constant_function_reports_non_convergence() {
        let err = find_root(|_| 1.0, 0.1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumericalNonConvergence);
    }

    #[test]
    fn test_no_real_root_reports_non_convergence() {
        let err = find_root(|x| x * x + 1.0, 0.1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumericalNonConvergence);
    }

    #[test]
    fn test_iteration_cap_is_respected() {
        let config = SolverConfig {
            tolerance: 1e-12,
            max_iterations: 2,
        };
        let err = find_root_with(|x| x.powi(3) - 1000.0, 0.5, &config).unwrap_err();
        match err {
            CalcError::NonConvergence { iterations, .. } => assert_eq!(iterations, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_guess() {
        assert!(find_root(|x| x, f64::NAN).is_err());
    }
}
