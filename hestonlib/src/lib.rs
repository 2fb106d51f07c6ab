//! # hestonlib
//!
//! Heston stochastic-volatility option pricing and calibration.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on this crate rather than the individual
//! `hl-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! hestonlib = "0.1"
//! ```
//!
//! ```rust
//! use hestonlib::models::HestonModel;
//! use hestonlib::pricingengines::AnalyticHestonEngine;
//!
//! let model = HestonModel::from_params(0.05, 100.0, 2.0, 0.06, 0.4, -0.5, 0.04)?;
//! let engine = AnalyticHestonEngine::new(model);
//! let call = engine.call_price(100.0, 1.0)?;
//! let put = engine.put_price(100.0, 1.0)?;
//!
//! // Put–call parity.
//! let forward_gap = 100.0 - 100.0 * (-0.05_f64).exp();
//! assert!((call - put - forward_gap).abs() < 1e-6);
//! # Ok::<(), hestonlib::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use hl_core as core;

/// Numerical building blocks: quadrature, optimisation, RNG, statistics.
pub use hl_math as math;

/// The Heston process and its variance-path simulator.
pub use hl_processes as processes;

/// Option descriptions and market quotes.
pub use hl_instruments as instruments;

/// The calibratable Heston model.
pub use hl_models as models;

/// Monte Carlo driver.
pub use hl_methods as methods;

/// Semi-analytic and Monte Carlo pricing engines.
pub use hl_pricingengines as pricingengines;

/// Least-squares calibration to observed call prices.
pub use hl_calibration as calibration;
