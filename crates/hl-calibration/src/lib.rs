//! # hl-calibration
//!
//! Fits the five Heston parameters to observed European call prices by
//! minimising the sum of squared pricing errors of the semi-analytic
//! engine.
//!
//! ```text
//! Calibrator ── objective ──> AnalyticHestonEngine (one per evaluation)
//!     │
//!     └── Minimizer (BFGS by default)
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calibrator;

pub use calibrator::{CalibrationOutcome, CalibrationReport, CalibrationSettings, Calibrator};
