//! # hl-methods
//!
//! Numerical methods: the Monte Carlo simulation framework.
//!
//! # Modules
//!
//! * [`monte_carlo`] — sample pricing, seeding, parallel aggregation

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Monte Carlo simulation: seeding, sample pricing, statistics.
pub mod monte_carlo;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use monte_carlo::{MonteCarloModel, MonteCarloResult, MonteCarloSettings, PathPricer};
