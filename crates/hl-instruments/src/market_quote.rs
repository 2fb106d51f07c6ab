//! Observed option prices used as calibration targets.

use hl_core::{ensure, errors::Result, Price, Real, Time};

/// An observed European call price.
///
/// Immutable once built: the fields are only readable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketQuote {
    strike: Real,
    maturity: Time,
    price: Price,
}

impl MarketQuote {
    /// Create a quote; strike, maturity and price must all be positive.
    pub fn new(strike: Real, maturity: Time, price: Price) -> Result<Self> {
        ensure!(
            strike > 0.0 && strike.is_finite(),
            "quote strike must be positive, got {strike}"
        );
        ensure!(
            maturity > 0.0 && maturity.is_finite(),
            "quote maturity must be positive, got {maturity}"
        );
        ensure!(
            price > 0.0 && price.is_finite(),
            "quote price must be positive, got {price}"
        );
        Ok(Self {
            strike,
            maturity,
            price,
        })
    }

    /// Strike.
    pub fn strike(&self) -> Real {
        self.strike
    }

    /// Maturity in years.
    pub fn maturity(&self) -> Time {
        self.maturity
    }

    /// Observed price.
    pub fn price(&self) -> Price {
        self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_core::Error;

    #[test]
    fn valid_quote() {
        let q = MarketQuote::new(80.0, 1.0, 25.72).unwrap();
        assert_eq!(q.strike(), 80.0);
        assert_eq!(q.maturity(), 1.0);
        assert_eq!(q.price(), 25.72);
    }

    #[test]
    fn non_positive_fields_rejected() {
        for (k, t, p) in [(0.0, 1.0, 1.0), (80.0, 0.0, 1.0), (80.0, 1.0, 0.0), (80.0, 1.0, -2.0)] {
            assert!(matches!(
                MarketQuote::new(k, t, p),
                Err(Error::InvalidParameter(_))
            ));
        }
        assert!(MarketQuote::new(Real::NAN, 1.0, 1.0).is_err());
    }
}
