//! BFGS (Broyden–Fletcher–Goldfarb–Shanno) quasi-Newton minimizer.

use crate::optimization::{
    CostFunction, EndCriteria, EndCriteriaType, Minimizer, OptimizationResult,
};
use hl_core::{ensure, errors::Result, Real};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C1: Real = 1e-4;

/// Backtracking halvings before the line search gives up.
const MAX_BACKTRACKS: usize = 64;

/// BFGS quasi-Newton minimizer.
///
/// Maintains a dense approximation to the inverse Hessian, updated after
/// every accepted step, and searches along `-H·∇f` with Armijo
/// backtracking. The trial step is first shortened to
/// [`EndCriteria::max_step`] when one is set. Points where the objective is
/// not finite are rejected by the line search, so a cost function can mark
/// parameters outside its domain with `NaN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bfgs;

impl Bfgs {
    /// Create a new BFGS minimizer.
    pub fn new() -> Self {
        Self
    }
}

impl Minimizer for Bfgs {
    fn minimize(
        &self,
        cost: &dyn CostFunction,
        initial: &DVector<Real>,
        criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        ensure!(!initial.is_empty(), "cannot minimize over an empty vector");
        ensure!(
            criteria.max_iterations > 0,
            "max_iterations must be positive"
        );
        if let Some(max_step) = criteria.max_step {
            ensure!(max_step > 0.0, "max_step must be positive, got {max_step}");
        }

        let n = initial.len();
        let mut x = initial.clone();
        let mut value = cost.value(&x);
        let finish = |x: DVector<Real>, value: Real, iterations: usize, end_type| {
            debug!(iterations, value, ?end_type, "bfgs finished");
            Ok(OptimizationResult {
                x,
                value,
                iterations,
                end_type,
            })
        };

        if !value.is_finite() {
            return finish(x, value, 0, EndCriteriaType::Failure);
        }
        let mut grad = cost.gradient(&x);
        if grad.iter().any(|g| !g.is_finite()) {
            return finish(x, value, 0, EndCriteriaType::Failure);
        }

        let mut h_inv = DMatrix::<Real>::identity(n, n);
        let mut first_update = true;

        for iteration in 0..criteria.max_iterations {
            let grad_norm = grad.norm();
            trace!(iteration, value, grad_norm, "bfgs iteration");
            if grad_norm <= criteria.gradient_norm_epsilon {
                return finish(x, value, iteration, EndCriteriaType::GradientNormEpsilon);
            }

            // Search direction p = -H⁻¹·∇f, reset to steepest descent if the
            // approximation has lost positive definiteness.
            let mut direction = -(&h_inv * &grad);
            let mut slope = grad.dot(&direction);
            if !(slope < 0.0) {
                h_inv = DMatrix::identity(n, n);
                first_update = true;
                direction = -grad.clone();
                slope = -grad_norm * grad_norm;
            }

            let mut alpha = 1.0;
            if let Some(max_step) = criteria.max_step {
                let len = direction.norm();
                if len > max_step {
                    alpha = max_step / len;
                }
            }

            // Backtracking line search (Armijo condition).
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let step = &direction * alpha;
                if step.norm() <= criteria.step_epsilon {
                    return finish(x, value, iteration, EndCriteriaType::StepEpsilon);
                }
                let candidate = &x + &step;
                let candidate_value = cost.value(&candidate);
                if candidate_value.is_finite()
                    && candidate_value <= value + ARMIJO_C1 * alpha * slope
                {
                    accepted = Some((candidate, candidate_value, step));
                    break;
                }
                alpha *= 0.5;
            }
            let Some((x_new, value_new, s)) = accepted else {
                return finish(x, value, iteration, EndCriteriaType::Failure);
            };

            let grad_new = cost.gradient(&x_new);
            if grad_new.iter().any(|g| !g.is_finite()) {
                return finish(x_new, value_new, iteration + 1, EndCriteriaType::Failure);
            }

            let scale = value.abs().max(value_new.abs()).max(1.0);
            if (value - value_new).abs() <= criteria.function_epsilon * scale {
                return finish(x_new, value_new, iteration + 1, EndCriteriaType::FunctionEpsilon);
            }
            if s.norm() <= criteria.step_epsilon {
                return finish(x_new, value_new, iteration + 1, EndCriteriaType::StepEpsilon);
            }

            // H⁻¹ ← (I - ρ·s·yᵀ)·H⁻¹·(I - ρ·y·sᵀ) + ρ·s·sᵀ,  ρ = 1/(sᵀy)
            let y = &grad_new - &grad;
            let sy = s.dot(&y);
            if sy > 1e-12 * s.norm() * y.norm() {
                if first_update {
                    h_inv = DMatrix::identity(n, n) * (sy / y.dot(&y));
                    first_update = false;
                }
                let rho = 1.0 / sy;
                let left = DMatrix::identity(n, n) - (&s * y.transpose()) * rho;
                h_inv = &left * &h_inv * left.transpose() + (&s * s.transpose()) * rho;
            }

            x = x_new;
            value = value_new;
            grad = grad_new;
        }

        finish(x, value, criteria.max_iterations, EndCriteriaType::MaxIterations)
    }
}
