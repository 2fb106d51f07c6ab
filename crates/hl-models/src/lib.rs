//! # hl-models
//!
//! Calibratable models.
//!
//! ```text
//! CalibratedModel
//! └── HestonModel
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Infrastructure ───────────────────────────────────────────────────────
pub mod calibrated_model;

// ── Equity models ────────────────────────────────────────────────────────
pub mod heston_model;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use calibrated_model::CalibratedModel;
pub use heston_model::HestonModel;
