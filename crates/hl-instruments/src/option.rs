//! Option descriptions priced by the Heston engines.

use crate::payoff::{OptionType, PlainVanillaPayoff};
use hl_core::{ensure, errors::Error, errors::Result, Real, Time};

/// An option contract, dispatched on by the Monte Carlo engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionSpec {
    /// Payoff on the terminal spot.
    European {
        /// Call/put and strike.
        payoff: PlainVanillaPayoff,
        /// Exercise time in years.
        maturity: Time,
    },
    /// Payoff on the arithmetic average of the spot at `monitoring_times`.
    Asian {
        /// Call/put and strike, applied to the average.
        payoff: PlainVanillaPayoff,
        /// Exercise time in years; the payoff is discounted from here.
        maturity: Time,
        /// Strictly increasing, positive, and no later than `maturity`.
        monitoring_times: Vec<Time>,
    },
    /// Floating-strike lookback call: terminal spot minus the running
    /// minimum of the spot.
    Lookback {
        /// Exercise time in years.
        maturity: Time,
    },
}

impl OptionSpec {
    /// A European option.
    pub fn european(option_type: OptionType, strike: Real, maturity: Time) -> Result<Self> {
        let spec = Self::European {
            payoff: PlainVanillaPayoff::new(option_type, strike),
            maturity,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// An arithmetic-average Asian option.
    pub fn asian(
        option_type: OptionType,
        strike: Real,
        maturity: Time,
        monitoring_times: Vec<Time>,
    ) -> Result<Self> {
        let spec = Self::Asian {
            payoff: PlainVanillaPayoff::new(option_type, strike),
            maturity,
            monitoring_times,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// A floating-strike lookback call.
    pub fn lookback(maturity: Time) -> Result<Self> {
        let spec = Self::Lookback { maturity };
        spec.validate()?;
        Ok(spec)
    }

    /// Exercise time.
    pub fn maturity(&self) -> Time {
        match self {
            Self::European { maturity, .. }
            | Self::Asian { maturity, .. }
            | Self::Lookback { maturity } => *maturity,
        }
    }

    /// Check the contract terms.
    ///
    /// Non-positive strikes or maturities are `InvalidParameter`; a bad
    /// monitoring schedule is `InvalidOptionSpec`.
    pub fn validate(&self) -> Result<()> {
        let maturity = self.maturity();
        ensure!(
            maturity > 0.0 && maturity.is_finite(),
            "maturity must be positive, got {maturity}"
        );
        match self {
            Self::European { payoff, .. } => check_strike(payoff),
            Self::Asian {
                payoff,
                monitoring_times,
                ..
            } => {
                check_strike(payoff)?;
                check_monitoring_times(monitoring_times, maturity)
            }
            Self::Lookback { .. } => Ok(()),
        }
    }
}

fn check_strike(payoff: &PlainVanillaPayoff) -> Result<()> {
    let k = payoff.strike;
    ensure!(k > 0.0 && k.is_finite(), "strike must be positive, got {k}");
    Ok(())
}

/// Validate an Asian monitoring schedule against the exercise time.
///
/// At least one time; the first strictly positive; strictly increasing;
/// the last no later than `exercise`.
pub fn check_monitoring_times(times: &[Time], exercise: Time) -> Result<()> {
    let invalid = |msg: String| Err(Error::InvalidOptionSpec(msg));

    let (Some(&first), Some(&last)) = (times.first(), times.last()) else {
        return invalid("need at least one monitoring time".into());
    };
    if !(first > 0.0) {
        return invalid(format!("first monitoring time must be positive, got {first}"));
    }
    if let Some(w) = times.windows(2).find(|w| !(w[0] < w[1])) {
        return invalid(format!(
            "monitoring times must be strictly increasing, got {} then {}",
            w[0], w[1]
        ));
    }
    if last > exercise {
        return invalid(format!(
            "last monitoring time {last} is after the exercise time {exercise}"
        ));
    }
    Ok(())
}
