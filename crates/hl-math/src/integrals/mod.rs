//! Numerical integration.
//!
//! Fixed-grid composite rules: the number of integrand evaluations is known
//! up front and the result is a smooth function of any parameters the
//! integrand closes over.

use hl_core::{ensure, errors::Result, fail, Real, Size};

/// A numerical integrator over a finite interval.
pub trait Integrator {
    /// Integrate `f` on `[a, b]`.
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<Real>;
}

// ── Simpson ───────────────────────────────────────────────────────────────────

/// Composite Simpson's rule on a uniform grid.
///
/// `∫ₐᵇ f ≈ h/3 · [f(a) + 4·Σf(odd) + 2·Σf(even) + f(b)]` with `h = (b-a)/n`.
/// An odd interval count is rounded up to the next even number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpsonIntegral {
    intervals: Size,
}

impl SimpsonIntegral {
    /// Create a Simpson integrator using `intervals` sub-intervals.
    pub fn new(intervals: Size) -> Self {
        Self {
            intervals: intervals + intervals % 2,
        }
    }

    /// Number of sub-intervals actually used (always even).
    pub fn intervals(&self) -> Size {
        self.intervals
    }
}

impl Integrator for SimpsonIntegral {
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<Real> {
        ensure!(self.intervals > 0, "Simpson rule needs at least two intervals");
        ensure!(
            a.is_finite() && b.is_finite(),
            "integration bounds must be finite, got [{a}, {b}]"
        );
        if a == b {
            return Ok(0.0);
        }

        let n = self.intervals;
        let h = (b - a) / n as Real;
        let mut sum_odd = 0.0;
        let mut sum_even = 0.0;
        for i in 1..n {
            let x = a + i as Real * h;
            if i % 2 == 1 {
                sum_odd += f(x);
            } else {
                sum_even += f(x);
            }
        }
        let value = h / 3.0 * (f(a) + 4.0 * sum_odd + 2.0 * sum_even + f(b));

        if !value.is_finite() {
            fail!("Simpson integral on [{a}, {b}] is not finite ({value})");
        }
        Ok(value)
    }
}
