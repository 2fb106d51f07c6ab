//! # hl-processes
//!
//! The Heston stochastic-volatility process:
//!
//! ```text
//! dS = r·S dt + √v·S dW₁
//! dv = κ(θ − v) dt + σ √v dW₂
//! dW₁·dW₂ = ρ dt
//! ```
//!
//! [`HestonProcess`] holds the validated model parameters;
//! [`VarianceProcessSimulator`] evolves the joint (spot, variance) state.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod heston_process;

pub use heston_process::{HestonProcess, HestonState, VarianceProcessSimulator};
