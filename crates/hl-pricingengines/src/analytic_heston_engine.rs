//! Analytic (semi-analytic) Heston model pricing engine.
//!
//! Prices European options under the Heston stochastic volatility model by
//! composite Simpson integration of the characteristic function.

use std::f64::consts::PI;

use hl_core::{ensure, errors::Result, Real, Size, Time};
use hl_instruments::OptionType;
use hl_math::integrals::{Integrator, SimpsonIntegral};
use hl_models::HestonModel;
use num_complex::Complex64;
use tracing::debug;

// ── Configuration ────────────────────────────────────────────────────────────

/// Standard deviations of log spot covered by the extended upper bound.
const TAIL_STD_DEVS: Real = 10.0;

/// Floor on the mean variance used to size the range.
const MIN_MEAN_VARIANCE: Real = 1e-4;

/// Cap on the extended upper bound.
const MAX_UPPER_BOUND: Real = 1e5;

/// Quadrature settings for the probability integrals.
///
/// The integral over `[0, ∞)` is truncated to `[lower_bound, upper_bound]`
/// and evaluated with `intervals` Simpson panels. The integrand decays like
/// `exp(−φ²·v̄T/2)`, `v̄` being the mean variance up to `T`, so short
/// maturities need a longer range: [`truncation`](Self::truncation) extends
/// the upper bound to `10/√(v̄T)` when that is larger, keeping the panel
/// width. The defaults reproduce prices to well beyond five significant
/// digits for equity-like parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonIntegration {
    /// Lower truncation point; the integrand is singular-looking at 0 but
    /// has a finite limit.
    pub lower_bound: Real,
    /// Upper truncation point.
    pub upper_bound: Real,
    /// Number of Simpson sub-intervals.
    pub intervals: Size,
}

impl Default for HestonIntegration {
    fn default() -> Self {
        Self {
            lower_bound: 1e-8,
            upper_bound: 200.0,
            intervals: 4000,
        }
    }
}

impl HestonIntegration {
    /// Set the truncation interval.
    pub fn with_bounds(mut self, lower_bound: Real, upper_bound: Real) -> Self {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
        self
    }

    /// Set the number of Simpson sub-intervals.
    pub fn with_intervals(mut self, intervals: Size) -> Self {
        self.intervals = intervals;
        self
    }

    /// Require `0 < lower_bound < upper_bound < ∞` and at least one interval.
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = (self.lower_bound, self.upper_bound);
        ensure!(
            lo > 0.0 && hi.is_finite() && lo < hi,
            "integration bounds must satisfy 0 < lower < upper, got [{lo}, {hi}]"
        );
        ensure!(self.intervals > 0, "integration needs at least one interval");
        Ok(())
    }

    /// Upper bound and panel count for a maturity whose mean variance is
    /// `mean_variance`.
    pub fn truncation(&self, mean_variance: Real, maturity: Time) -> (Real, Size) {
        let std_dev = (mean_variance.max(MIN_MEAN_VARIANCE) * maturity).sqrt();
        let needed = (TAIL_STD_DEVS / std_dev).min(MAX_UPPER_BOUND);
        if !(needed > self.upper_bound) {
            return (self.upper_bound, self.intervals);
        }
        let width = (self.upper_bound - self.lower_bound) / self.intervals as Real;
        let intervals = ((needed - self.lower_bound) / width).ceil() as Size;
        (needed, intervals)
    }
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// Semi-analytic Heston pricing engine.
///
/// The call price is $C = S_0 P_0 - K e^{-rT} P_1$ where
///
/// $$P_j = \frac{1}{2} + \frac{1}{\pi} \int_0^\infty
/// \mathrm{Re}\!\left[\frac{e^{-i\phi\ln K}\,f_j(\phi)}{i\phi}\right] d\phi$$
///
/// and $f_j$ is the characteristic function of the log spot under the
/// share measure ($j = 0$) or the risk-neutral measure ($j = 1$). Puts
/// follow from parity. The two integrals are evaluated concurrently.
///
/// Unlike the Monte Carlo engine this one does not require the Feller
/// condition or `ρ ∈ [−1, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticHestonEngine {
    model: HestonModel,
    integration: HestonIntegration,
}

/// The two probability integrals of the pricing formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    /// `u = 1/2`, `b = κ − ρσ`.
    Share,
    /// `u = −1/2`, `b = κ`.
    RiskNeutral,
}

impl AnalyticHestonEngine {
    /// Create a new Heston engine with the default quadrature settings.
    pub fn new(model: HestonModel) -> Self {
        Self {
            model,
            integration: HestonIntegration::default(),
        }
    }

    /// Use `integration` instead of the default quadrature settings.
    pub fn with_integration(mut self, integration: HestonIntegration) -> Self {
        self.integration = integration;
        self
    }

    /// The priced model.
    pub fn model(&self) -> &HestonModel {
        &self.model
    }

    /// Quadrature settings.
    pub fn integration(&self) -> &HestonIntegration {
        &self.integration
    }

    /// European call price.
    ///
    /// `maturity == 0` gives the intrinsic value and `strike == 0` gives
    /// `S0`. Negative or non-finite inputs are `InvalidParameter`.
    pub fn call_price(&self, strike: Real, maturity: Time) -> Result<Real> {
        check_terms(strike, maturity)?;
        let s0 = self.model.s0();
        if maturity == 0.0 {
            return Ok((s0 - strike).max(0.0));
        }
        if strike == 0.0 {
            return Ok(s0);
        }

        let (p0, p1) = self.probabilities(strike, maturity)?;
        let df = (-self.model.risk_free_rate() * maturity).exp();
        let call = s0 * p0 - strike * df * p1;
        debug!(strike, maturity, p0, p1, call, "Heston analytic call");
        Ok(call)
    }

    /// European put price, from put-call parity.
    pub fn put_price(&self, strike: Real, maturity: Time) -> Result<Real> {
        check_terms(strike, maturity)?;
        if maturity == 0.0 {
            return Ok((strike - self.model.s0()).max(0.0));
        }
        let call = self.call_price(strike, maturity)?;
        let df = (-self.model.risk_free_rate() * maturity).exp();
        Ok(call - self.model.s0() + strike * df)
    }

    /// European price for either option type.
    pub fn price(&self, option_type: OptionType, strike: Real, maturity: Time) -> Result<Real> {
        match option_type {
            OptionType::Call => self.call_price(strike, maturity),
            OptionType::Put => self.put_price(strike, maturity),
        }
    }

    /// The exercise probabilities `(P0, P1)` of the pricing formula, for
    /// strictly positive `strike` and `maturity`.
    pub fn probabilities(&self, strike: Real, maturity: Time) -> Result<(Real, Real)> {
        check_terms(strike, maturity)?;
        ensure!(
            strike > 0.0 && maturity > 0.0,
            "probabilities need positive strike and maturity, got K={strike}, T={maturity}"
        );
        self.integration.validate()?;

        let log_moneyness = (self.model.s0() / strike).ln();
        let (upper, intervals) = self
            .integration
            .truncation(self.mean_variance(maturity), maturity);
        let grid = (SimpsonIntegral::new(intervals), upper);
        let (p0, p1) = rayon::join(
            || self.probability(Branch::Share, grid, log_moneyness, maturity),
            || self.probability(Branch::RiskNeutral, grid, log_moneyness, maturity),
        );
        Ok((p0?, p1?))
    }

    /// `θ + (v0 − θ)(1 − e^{−κT})/(κT)`, the expected variance averaged over
    /// `[0, T]`.
    fn mean_variance(&self, t: Time) -> Real {
        let m = &self.model;
        let kt = m.kappa() * t;
        if kt.abs() < 1e-8 {
            return m.v0();
        }
        m.theta() + (m.v0() - m.theta()) * (1.0 - (-kt).exp()) / kt
    }

    fn probability(
        &self,
        branch: Branch,
        (rule, upper): (SimpsonIntegral, Real),
        log_moneyness: Real,
        t: Time,
    ) -> Result<Real> {
        let integral = rule.integrate(
            |phi| self.integrand(branch, phi, log_moneyness, t),
            self.integration.lower_bound,
            upper,
        )?;
        Ok(0.5 + integral / PI)
    }

    /// `Re[exp(C + D·v0 + iφ·ln(S0/K)) / (iφ)]`.
    fn integrand(&self, branch: Branch, phi: Real, log_moneyness: Real, t: Time) -> Real {
        let m = &self.model;
        let (kappa, theta, sigma, rho) = (m.kappa(), m.theta(), m.sigma(), m.rho());
        let (u, b) = match branch {
            Branch::Share => (0.5, kappa - rho * sigma),
            Branch::RiskNeutral => (-0.5, kappa),
        };
        let i = Complex64::i();
        let sigma2 = sigma * sigma;

        let rho_sigma_phi = Complex64::new(0.0, rho * sigma * phi);
        let beta = b - rho_sigma_phi;
        // Principal root; this form keeps ln(...) below on its principal
        // branch for all φ.
        let d = ((rho_sigma_phi - b).powi(2) - sigma2 * Complex64::new(-phi * phi, 2.0 * u * phi))
            .sqrt();
        let g = (beta - d) / (beta + d);
        let e = (-d * t).exp();

        let c = i * (m.risk_free_rate() * phi * t)
            + (kappa * theta / sigma2) * ((beta - d) * t - 2.0 * ((1.0 - g * e) / (1.0 - g)).ln());
        let big_d = (beta - d) / sigma2 * ((1.0 - e) / (1.0 - g * e));

        ((c + big_d * m.v0() + i * (phi * log_moneyness)).exp() / (i * phi)).re
    }
}

impl From<HestonModel> for AnalyticHestonEngine {
    fn from(model: HestonModel) -> Self {
        Self::new(model)
    }
}

fn check_terms(strike: Real, maturity: Time) -> Result<()> {
    ensure!(
        strike >= 0.0 && strike.is_finite(),
        "strike must be non-negative, got {strike}"
    );
    ensure!(
        maturity >= 0.0 && maturity.is_finite(),
        "maturity must be non-negative, got {maturity}"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytic_european_engine::black_scholes_price;
    use approx::assert_abs_diff_eq;
    use hl_core::Error;
    use proptest::prelude::*;

    fn engine(kappa: Real, theta: Real, sigma: Real, rho: Real, v0: Real) -> AnalyticHestonEngine {
        let model = HestonModel::from_params(0.05, 100.0, kappa, theta, sigma, rho, v0).unwrap();
        AnalyticHestonEngine::new(model)
    }

    /// With vanishing vol-of-vol and θ = v0 the variance is constant.
    #[test]
    fn heston_close_to_bs_low_vol_of_vol() {
        let e = engine(2.0, 0.04, 0.01, 0.0, 0.04);
        for strike in [80.0, 100.0, 120.0] {
            let heston = e.call_price(strike, 1.0).unwrap();
            let bs = black_scholes_price(OptionType::Call, 100.0, strike, 0.05, 0.20, 1.0);
            assert_abs_diff_eq!(heston, bs, epsilon = 2e-3);
        }
    }

    #[test]
    fn heston_put_close_to_bs_low_vol_of_vol() {
        let e = engine(2.0, 0.04, 0.01, 0.0, 0.04);
        for strike in [80.0, 100.0, 120.0] {
            let heston = e.put_price(strike, 1.0).unwrap();
            let bs = black_scholes_price(OptionType::Put, 100.0, strike, 0.05, 0.20, 1.0);
            assert_abs_diff_eq!(heston, bs, epsilon = 2e-3);
        }
    }

    /// Fang & Oosterlee (2008) Heston test case, 5.785155450 at zero rate.
    /// Struck at the forward the price does not depend on `r`.
    #[test]
    fn matches_published_reference_price() {
        let e = engine(1.5768, 0.0398, 0.5751, -0.5711, 0.0175);
        let forward = 100.0 * 0.05_f64.exp();
        let call = e.call_price(forward, 1.0).unwrap();
        assert_abs_diff_eq!(call, 5.785_155_450, epsilon = 1e-6);
    }

    #[test]
    fn truncation_widens_for_short_maturities() {
        let cfg = HestonIntegration::default();
        assert_eq!(cfg.truncation(0.04, 1.0), (200.0, 4000));

        let (upper, intervals) = cfg.truncation(0.04, 1.0 / 252.0);
        assert_abs_diff_eq!(upper, 10.0 / (0.04_f64 / 252.0).sqrt(), epsilon = 1e-9);
        assert!(upper > 700.0);
        // Panel width is kept.
        assert_abs_diff_eq!(upper / intervals as Real, 0.05, epsilon = 1e-4);

        let (upper, _) = cfg.truncation(Real::NAN, 1e-12);
        assert_eq!(upper, 1e5);
    }

    #[test]
    fn short_maturity_prices_converged_and_non_negative() {
        let e = engine(2.0, 0.04, 0.3, -0.7, 0.04);
        let wide = e.with_integration(
            HestonIntegration::default()
                .with_bounds(1e-8, 3000.0)
                .with_intervals(150_000),
        );
        for maturity in [1.0 / 252.0, 1.0 / 52.0] {
            for strike in [80.0, 90.0, 100.0, 110.0, 120.0] {
                let call = e.call_price(strike, maturity).unwrap();
                let put = e.put_price(strike, maturity).unwrap();
                assert!(call > -1e-9 && put > -1e-9, "K={strike} T={maturity}: {call} {put}");
                let reference = wide.call_price(strike, maturity).unwrap();
                assert_abs_diff_eq!(call, reference, epsilon = 1e-7);
            }
        }
        let atm = e.call_price(100.0, 1.0 / 252.0).unwrap();
        assert_abs_diff_eq!(atm, 0.512_464, epsilon = 5e-5);
    }

    #[test]
    fn default_quadrature_is_converged() {
        let e = engine(2.0, 0.04, 0.3, -0.7, 0.04);
        let fine = e.with_integration(
            HestonIntegration::default()
                .with_bounds(1e-8, 400.0)
                .with_intervals(16_000),
        );
        for (strike, maturity) in [(90.0, 0.5), (100.0, 1.0), (120.0, 2.0)] {
            let coarse = e.call_price(strike, maturity).unwrap();
            let reference = fine.call_price(strike, maturity).unwrap();
            assert_abs_diff_eq!(coarse, reference, epsilon = 1e-5);
        }
    }

    /// Negative correlation fattens the left tail, positive the right.
    #[test]
    fn heston_skew_follows_rho() {
        let neg = engine(2.0, 0.04, 0.4, -0.7, 0.04);
        let pos = engine(2.0, 0.04, 0.4, 0.7, 0.04);
        let put_neg = neg.put_price(80.0, 1.0).unwrap();
        let put_pos = pos.put_price(80.0, 1.0).unwrap();
        assert!(put_neg > put_pos, "neg-rho put={put_neg}, pos-rho put={put_pos}");

        let call_neg = neg.call_price(120.0, 1.0).unwrap();
        let call_pos = pos.call_price(120.0, 1.0).unwrap();
        assert!(call_pos > call_neg, "pos-rho call={call_pos}, neg-rho call={call_neg}");
    }

    #[test]
    fn degenerate_terms() {
        let e = engine(2.0, 0.04, 0.3, -0.7, 0.04);
        assert_abs_diff_eq!(e.call_price(90.0, 0.0).unwrap(), 10.0);
        assert_abs_diff_eq!(e.put_price(90.0, 0.0).unwrap(), 0.0);
        assert_abs_diff_eq!(e.put_price(110.0, 0.0).unwrap(), 10.0);
        assert_abs_diff_eq!(e.call_price(0.0, 1.0).unwrap(), 100.0);
        assert_abs_diff_eq!(e.put_price(0.0, 1.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn negative_terms_rejected() {
        let e = engine(2.0, 0.04, 0.3, -0.7, 0.04);
        assert!(matches!(e.call_price(-1.0, 1.0), Err(Error::InvalidParameter(_))));
        assert!(matches!(e.put_price(100.0, -0.5), Err(Error::InvalidParameter(_))));
        assert!(matches!(
            e.call_price(100.0, Real::NAN),
            Err(Error::InvalidParameter(_))
        ));
        assert!(e.probabilities(100.0, 0.0).is_err());
    }

    #[test]
    fn invalid_integration_rejected() {
        let e = engine(2.0, 0.04, 0.3, -0.7, 0.04)
            .with_integration(HestonIntegration::default().with_bounds(10.0, 1.0));
        assert!(matches!(e.call_price(100.0, 1.0), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn call_decreases_with_strike() {
        let e = engine(1.5, 0.05, 0.5, -0.5, 0.03);
        let prices: Vec<Real> = [70.0, 85.0, 100.0, 115.0, 130.0]
            .iter()
            .map(|&k| e.call_price(k, 1.5).unwrap())
            .collect();
        assert!(prices.windows(2).all(|w| w[0] > w[1]), "{prices:?}");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn parity_and_no_arbitrage_bounds(
            kappa in 0.5..5.0f64,
            theta in 0.02..0.12f64,
            sigma in 0.1..0.5f64,
            rho in -0.7..0.3f64,
            v0 in 0.03..0.12f64,
            strike in 70.0..140.0f64,
            maturity in 0.5..2.0f64,
        ) {
            let e = engine(kappa, theta, sigma, rho, v0);
            let call = e.call_price(strike, maturity).unwrap();
            let put = e.put_price(strike, maturity).unwrap();
            let df = (-0.05 * maturity).exp();

            prop_assert!((call - put - (100.0 - strike * df)).abs() < 1e-9);
            prop_assert!(call >= (100.0 - strike * df).max(0.0) - 1e-3, "call={}", call);
            prop_assert!(call <= 100.0 + 1e-3, "call={}", call);
            prop_assert!(put >= -1e-3, "put={}", put);
        }
    }
}
