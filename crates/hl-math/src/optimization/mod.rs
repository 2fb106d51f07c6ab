//! Optimization framework: cost functions, end criteria and the
//! [`Minimizer`] abstraction the calibrator is written against.

pub mod bfgs;

pub use bfgs::Bfgs;

use hl_core::{errors::Result, Real, Size};
use nalgebra::DVector;

// ── Cost function trait ───────────────────────────────────────────────────────

/// A scalar objective over a real parameter vector.
///
/// Implementations may return a non-finite value for parameter vectors
/// outside their domain; minimizers treat such points as rejected.
pub trait CostFunction {
    /// Evaluate the objective at `x`.
    fn value(&self, x: &DVector<Real>) -> Real;

    /// Step used by the default finite-difference gradient.
    fn finite_difference_step(&self) -> Real {
        1e-6
    }

    /// Gradient of the objective. The default uses central differences,
    /// falling back to a one-sided difference when one neighbour lies
    /// outside the domain.
    fn gradient(&self, x: &DVector<Real>) -> DVector<Real> {
        let h = self.finite_difference_step();
        let mut grad = DVector::zeros(x.len());
        let mut f0 = None;
        for j in 0..x.len() {
            let mut xp = x.clone();
            xp[j] += h;
            let mut xm = x.clone();
            xm[j] -= h;
            let fp = self.value(&xp);
            let fm = self.value(&xm);
            grad[j] = match (fp.is_finite(), fm.is_finite()) {
                (true, true) => (fp - fm) / (2.0 * h),
                (true, false) => (fp - *f0.get_or_insert_with(|| self.value(x))) / h,
                (false, true) => (*f0.get_or_insert_with(|| self.value(x)) - fm) / h,
                (false, false) => Real::NAN,
            };
        }
        grad
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// Criteria to stop an optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct EndCriteria {
    /// Maximum number of iterations.
    pub max_iterations: Size,
    /// Stop when the gradient norm drops to this value.
    pub gradient_norm_epsilon: Real,
    /// Stop when `|f_k - f_{k+1}| <= ε · max(|f_k|, |f_{k+1}|, 1)`.
    pub function_epsilon: Real,
    /// Stop when the accepted (or attempted) step norm drops to this value.
    pub step_epsilon: Real,
    /// Upper bound on the norm of a single step, if any.
    pub max_step: Option<Real>,
}

impl EndCriteria {
    /// Create end criteria with one tolerance shared by the gradient,
    /// function and step tests.
    pub fn new(max_iterations: Size, accuracy: Real) -> Self {
        Self {
            max_iterations,
            gradient_norm_epsilon: accuracy,
            function_epsilon: accuracy,
            step_epsilon: accuracy,
            max_step: None,
        }
    }

    /// Cap the norm of each step.
    pub fn with_max_step(mut self, max_step: Real) -> Self {
        self.max_step = Some(max_step);
        self
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self::new(1000, 1e-8)
    }
}

/// The reason an optimization terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCriteriaType {
    /// Gradient norm below the gradient epsilon.
    GradientNormEpsilon,
    /// Relative function change below the function epsilon.
    FunctionEpsilon,
    /// Step norm below the step epsilon.
    StepEpsilon,
    /// Iteration budget exhausted.
    MaxIterations,
    /// The objective or its gradient became non-finite, or no acceptable
    /// step could be found.
    Failure,
}

impl EndCriteriaType {
    /// `true` for the three convergence codes.
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            Self::GradientNormEpsilon | Self::FunctionEpsilon | Self::StepEpsilon
        )
    }
}

/// Result of an optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameter values (best point found).
    pub x: DVector<Real>,
    /// Objective at `x`.
    pub value: Real,
    /// Number of completed iterations.
    pub iterations: Size,
    /// Reason for termination.
    pub end_type: EndCriteriaType,
}

// ── Minimizer ────────────────────────────────────────────────────────────────

/// An unconstrained minimizer.
///
/// Object safe so callers can hold a `Box<dyn Minimizer>` and swap
/// algorithms without touching the objective.
pub trait Minimizer {
    /// Minimize `cost` starting from `initial`.
    ///
    /// Termination is reported through [`OptimizationResult::end_type`];
    /// `Err` is reserved for invalid inputs (e.g. empty starting vector).
    fn minimize(
        &self,
        cost: &dyn CostFunction,
        initial: &DVector<Real>,
        criteria: &EndCriteria,
    ) -> Result<OptimizationResult>;
}


#[cfg(test)]
mod tests {
    use super::test_functions::*;
    use super::*;
    use approx::assert_abs_diff_eq;

    /// (x - 1)² on x >= 0, undefined below.
    struct HalfLine;
    impl CostFunction for HalfLine {
        fn value(&self, x: &DVector<Real>) -> Real {
            if x[0] < 0.0 {
                Real::NAN
            } else {
                (x[0] - 1.0).powi(2)
            }
        }
    }

    #[test]
    fn central_difference_gradient() {
        let g = ShiftedQuadratic.gradient(&DVector::from_vec(vec![0.0, 0.0, 0.0]));
        assert_abs_diff_eq!(g[0], -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(g[1], -4.0, epsilon = 1e-6);
        assert_abs_diff_eq!(g[2], -6.0, epsilon = 1e-6);
    }

    #[test]
    fn one_sided_gradient_at_domain_edge() {
        // The backward neighbour of 0 falls outside the domain.
        let g = HalfLine.gradient(&DVector::from_vec(vec![0.0]));
        assert_abs_diff_eq!(g[0], -2.0, epsilon = 1e-5);
        let g = HalfLine.gradient(&DVector::from_vec(vec![-1.0]));
        assert!(g[0].is_nan());
    }

    #[test]
    fn shared_accuracy() {
        let ec = EndCriteria::new(50, 1e-10).with_max_step(0.05);
        assert_eq!(ec.max_iterations, 50);
        assert_eq!(ec.gradient_norm_epsilon, 1e-10);
        assert_eq!(ec.function_epsilon, 1e-10);
        assert_eq!(ec.step_epsilon, 1e-10);
        assert_eq!(ec.max_step, Some(0.05));
    }

    #[test]
    fn convergence_codes() {
        assert!(EndCriteriaType::GradientNormEpsilon.is_converged());
        assert!(EndCriteriaType::FunctionEpsilon.is_converged());
        assert!(EndCriteriaType::StepEpsilon.is_converged());
        assert!(!EndCriteriaType::MaxIterations.is_converged());
        assert!(!EndCriteriaType::Failure.is_converged());
    }
}
