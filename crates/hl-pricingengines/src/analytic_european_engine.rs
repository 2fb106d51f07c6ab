//! Black–Scholes closed form.
//!
//! A Heston model with vanishing vol-of-vol and `θ = v0` has the constant
//! variance `v0`, so its European prices converge to these at volatility
//! `√v0`.

use hl_core::{Rate, Real, Time, Volatility};
use hl_instruments::OptionType;
use hl_math::distributions::normal_cdf;

/// Black–Scholes price of a European option without dividends.
///
/// $$C = S N(d_1) - K e^{-rT} N(d_2)$$
/// $$P = K e^{-rT} N(-d_2) - S N(-d_1)$$
///
/// where $d_{1,2} = \frac{\ln(S/K) + (r \pm \sigma^2/2)T}{\sigma\sqrt{T}}$.
/// Expired options return their intrinsic value; zero volatility returns
/// the discounted forward intrinsic value.
pub fn black_scholes_price(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    risk_free_rate: Rate,
    volatility: Volatility,
    time_to_expiry: Time,
) -> Real {
    let phi = option_type.sign();
    let t = time_to_expiry;

    if t <= 0.0 {
        return (phi * (spot - strike)).max(0.0);
    }

    let r = risk_free_rate;
    let df_r = (-r * t).exp();
    let std_dev = volatility * t.sqrt();

    if std_dev <= 1e-15 {
        return (phi * (spot - strike * df_r)).max(0.0);
    }

    let d1 = ((spot / strike).ln() + (r + 0.5 * volatility * volatility) * t) / std_dev;
    let d2 = d1 - std_dev;

    phi * (spot * normal_cdf(phi * d1) - strike * df_r * normal_cdf(phi * d2))
}
