//! Error types for hestonlib.
//!
//! Every failure kind the pricers, the simulator and the calibrator can
//! report is a variant of a single `thiserror`-derived enum. Boundary checks
//! go through the `ensure!` macro, numerical breakdowns through `fail!`.

use crate::Real;
use thiserror::Error;

/// The top-level error type used throughout hestonlib.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A non-positive rate, spot, volatility, time, step or path count, or an
    /// out-of-range payoff input.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// `2κθ ≤ σ²`: the variance process can reach zero, which the
    /// discretisation cannot handle.
    #[error("Feller condition violated: 2·κ·θ = {} <= σ² = {}", 2.0 * .kappa * .theta, .sigma * .sigma)]
    FellerConditionViolated {
        /// Mean-reversion speed.
        kappa: Real,
        /// Long-run variance.
        theta: Real,
        /// Volatility of variance.
        sigma: Real,
    },

    /// Malformed option description (e.g. Asian monitoring times).
    #[error("invalid option specification: {0}")]
    InvalidOptionSpec(String),

    /// `calibrate` was called before an initial guess was supplied.
    #[error("no initial parameter guess has been set")]
    MissingGuess,

    /// The minimizer stopped for a reason other than convergence or the
    /// iteration budget.
    #[error("calibration failed: {0}")]
    CalibrationFailed(String),

    /// General numerical failure (non-finite intermediate results and the
    /// like).
    #[error("{0}")]
    Runtime(String),
}

/// Shorthand `Result` type used throughout hestonlib.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boundary precondition check.
///
/// Returns `Err(Error::InvalidParameter(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use hl_core::{ensure, errors::Error};
/// fn positive(x: f64) -> hl_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::InvalidParameter(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::InvalidParameter(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use hl_core::{fail, errors::Error};
/// fn always_err() -> hl_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feller_message_shows_both_sides() {
        let e = Error::FellerConditionViolated {
            kappa: 2.0,
            theta: 0.04,
            sigma: 0.5,
        };
        let msg = e.to_string();
        assert!(msg.contains("0.16"), "{msg}");
        assert!(msg.contains("0.25"), "{msg}");
    }

    #[test]
    fn ensure_maps_to_invalid_parameter() {
        fn check(n: usize) -> Result<usize> {
            ensure!(n > 0, "path count must be positive, got {n}");
            Ok(n)
        }
        assert_eq!(check(3), Ok(3));
        assert_eq!(
            check(0),
            Err(Error::InvalidParameter(
                "path count must be positive, got 0".into()
            ))
        );
    }

    #[test]
    fn fail_maps_to_runtime() {
        fn broken() -> Result<()> {
            fail!("integral is {}", Real::NAN);
        }
        assert!(matches!(broken(), Err(Error::Runtime(_))));
    }
}
