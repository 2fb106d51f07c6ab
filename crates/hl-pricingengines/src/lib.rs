//! # hl-pricingengines
//!
//! Pricing engines for the Heston model.
//!
//! ## Engines
//!
//! | Engine | Method | Payoffs |
//! |--------|--------|---------|
//! | [`AnalyticHestonEngine`] | characteristic-function quadrature | European |
//! | [`McHestonEngine`] | QE path simulation | European, Asian, Lookback |
//!
//! [`black_scholes_price`] is the constant-volatility reference the
//! Heston price collapses to as the vol-of-vol goes to zero.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Vanilla ──────────────────────────────────────────────────────────────
pub mod analytic_european_engine;
pub mod analytic_heston_engine;

// ── Monte Carlo ──────────────────────────────────────────────────────────
pub mod mc_heston_engine;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use analytic_european_engine::black_scholes_price;
pub use analytic_heston_engine::{AnalyticHestonEngine, HestonIntegration};
pub use mc_heston_engine::McHestonEngine;
