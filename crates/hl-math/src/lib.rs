//! # hl-math
//!
//! Mathematical utilities used by the Heston engines: composite quadrature,
//! quasi-Newton minimisation (over nalgebra vectors), the normal
//! distribution (via statrs), Gaussian random number generation and
//! mergeable statistics accumulators.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Probability distributions.
pub mod distributions;

/// Numerical integration.
pub mod integrals;

/// Cost functions, end criteria and minimizers.
pub mod optimization;

/// Random number generators.
pub mod random_numbers;

/// Statistics accumulators.
pub mod statistics;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use distributions::{normal_cdf, normal_cdf_inverse, normal_pdf};
pub use integrals::{Integrator, SimpsonIntegral};
pub use optimization::{
    Bfgs, CostFunction, EndCriteria, EndCriteriaType, Minimizer, OptimizationResult,
};
pub use random_numbers::{
    GaussianRng, InverseCumulativeNormalRng, MersenneTwisterUniformRng, StandardNormalRng,
};
pub use statistics::Statistics;
