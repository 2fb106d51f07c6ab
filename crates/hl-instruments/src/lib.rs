//! # hl-instruments
//!
//! Instrument descriptions: payoffs, the [`OptionSpec`] variant priced by
//! the engines, and the [`MarketQuote`] consumed by calibration.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod market_quote;
pub mod option;
pub mod payoff;

pub use market_quote::MarketQuote;
pub use option::{check_monitoring_times, OptionSpec};
pub use payoff::{OptionType, PlainVanillaPayoff};
