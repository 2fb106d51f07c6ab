//! Calibration session: quotes, a starting guess, and the fit.
//!
//! The objective is the sum over quotes of `(model call − observed)²`,
//! evaluated with a fresh [`AnalyticHestonEngine`] for every candidate
//! parameter vector `[κ, θ, σ, ρ, v0]`. Candidates the model rejects (for
//! example `σ ≤ 0`) evaluate to `NaN`, which the minimizer treats as outside
//! the domain.

use hl_core::{ensure, errors::Error, errors::Result, Rate, Real, Size, Time};
use hl_instruments::MarketQuote;
use hl_math::optimization::{Bfgs, CostFunction, EndCriteria, EndCriteriaType, Minimizer};
use hl_models::{CalibratedModel, HestonModel};
use hl_pricingengines::{AnalyticHestonEngine, HestonIntegration};
use nalgebra::DVector;
use rayon::prelude::*;
use tracing::{info, trace, warn};

// ── Settings ─────────────────────────────────────────────────────────────────

/// Calibration configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationSettings {
    /// Tolerance shared by the gradient, function and step tests.
    pub accuracy: Real,
    /// Iteration budget of the minimizer.
    pub max_iterations: Size,
    /// Largest parameter-space step per iteration.
    pub max_step: Real,
    /// Finite-difference step of the objective gradient.
    pub diff_step: Real,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            accuracy: 1e-15,
            max_iterations: 1000,
            max_step: 0.05,
            diff_step: 1e-6,
        }
    }
}

impl CalibrationSettings {
    /// Set the convergence tolerance.
    pub fn with_accuracy(mut self, accuracy: Real) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: Size) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the step cap.
    pub fn with_max_step(mut self, max_step: Real) -> Self {
        self.max_step = max_step;
        self
    }

    /// Set the finite-difference step.
    pub fn with_diff_step(mut self, diff_step: Real) -> Self {
        self.diff_step = diff_step;
        self
    }

    /// Require a positive iteration budget, a non-negative accuracy and
    /// positive steps.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_iterations > 0,
            "maximum number of iterations must be positive"
        );
        ensure!(
            self.accuracy >= 0.0 && self.accuracy.is_finite(),
            "accuracy must be non-negative, got {}",
            self.accuracy
        );
        ensure!(
            self.max_step > 0.0 && self.max_step.is_finite(),
            "maximum step must be positive, got {}",
            self.max_step
        );
        ensure!(
            self.diff_step > 0.0 && self.diff_step.is_finite(),
            "finite-difference step must be positive, got {}",
            self.diff_step
        );
        Ok(())
    }
}

// ── Outcome ──────────────────────────────────────────────────────────────────

/// State of the last calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationOutcome {
    /// `calibrate` has not completed.
    #[default]
    NotStarted,
    /// The minimizer met one of its convergence tests.
    FinishedOk,
    /// The iteration budget ran out; the best parameters found are kept.
    FailedMaxIterations,
    /// The minimizer failed; parameters are unchanged.
    FailedOther,
}

/// Summary of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationReport {
    /// How the run ended.
    pub outcome: CalibrationOutcome,
    /// Fitted model.
    pub model: HestonModel,
    /// Sum of squared pricing errors of `model` over the session quotes.
    pub pricing_error: Real,
    /// Minimizer iterations.
    pub iterations: Size,
}

impl CalibrationReport {
    /// Fitted parameters as `[κ, θ, σ, ρ, v0]`.
    pub fn parameters(&self) -> [Real; 5] {
        self.model.param_array()
    }
}

// ── Calibrator ───────────────────────────────────────────────────────────────

/// A calibration session.
///
/// Holds the fixed market inputs `r` and `S0`, the observed quotes, the
/// current best parameters (seeded by [`set_guess`](Self::set_guess)) and
/// the outcome of the last [`calibrate`](Self::calibrate) call. The
/// minimizer is pluggable and defaults to [`Bfgs`].
#[derive(Debug, Clone)]
pub struct Calibrator<M: Minimizer = Bfgs> {
    risk_free_rate: Rate,
    s0: Real,
    settings: CalibrationSettings,
    integration: HestonIntegration,
    minimizer: M,
    quotes: Vec<MarketQuote>,
    model: Option<HestonModel>,
    outcome: CalibrationOutcome,
}

impl Calibrator {
    /// Create an empty session minimizing with BFGS.
    ///
    /// `risk_free_rate` and `s0` must be positive.
    pub fn new(risk_free_rate: Rate, s0: Real, settings: CalibrationSettings) -> Result<Self> {
        ensure!(
            risk_free_rate > 0.0 && risk_free_rate.is_finite(),
            "risk-free rate must be positive, got {risk_free_rate}"
        );
        ensure!(
            s0 > 0.0 && s0.is_finite(),
            "initial spot must be positive, got {s0}"
        );
        settings.validate()?;
        Ok(Self {
            risk_free_rate,
            s0,
            settings,
            integration: HestonIntegration::default(),
            minimizer: Bfgs::new(),
            quotes: Vec::new(),
            model: None,
            outcome: CalibrationOutcome::NotStarted,
        })
    }
}

impl<M: Minimizer> Calibrator<M> {
    /// Replace the minimizer.
    pub fn with_minimizer<N: Minimizer>(self, minimizer: N) -> Calibrator<N> {
        Calibrator {
            risk_free_rate: self.risk_free_rate,
            s0: self.s0,
            settings: self.settings,
            integration: self.integration,
            minimizer,
            quotes: self.quotes,
            model: self.model,
            outcome: self.outcome,
        }
    }

    /// Quadrature settings of the pricing engine used by the objective.
    pub fn with_integration(mut self, integration: HestonIntegration) -> Self {
        self.integration = integration;
        self
    }

    /// Set the starting point of the next calibration.
    pub fn set_guess(
        &mut self,
        kappa: Real,
        theta: Real,
        sigma: Real,
        rho: Real,
        v0: Real,
    ) -> Result<()> {
        let model =
            HestonModel::from_params(self.risk_free_rate, self.s0, kappa, theta, sigma, rho, v0)?;
        self.model = Some(model);
        Ok(())
    }

    /// Record an observed European call price.
    pub fn add_observed_option(&mut self, strike: Real, maturity: Time, price: Real) -> Result<()> {
        self.quotes.push(MarketQuote::new(strike, maturity, price)?);
        Ok(())
    }

    /// Record a validated quote.
    pub fn add_quote(&mut self, quote: MarketQuote) {
        self.quotes.push(quote);
    }

    /// Quotes in insertion order.
    pub fn quotes(&self) -> &[MarketQuote] {
        &self.quotes
    }

    /// Configuration.
    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    /// Outcome of the last calibration.
    pub fn outcome(&self) -> CalibrationOutcome {
        self.outcome
    }

    /// Sum of squared differences between `model`'s call prices and the
    /// observed prices.
    pub fn pricing_error(&self, model: &HestonModel) -> Result<Real> {
        sum_squared_errors(model, &self.quotes, self.integration)
    }

    /// Outcome of the last calibration and the pricing error of the current
    /// parameters.
    pub fn status(&self) -> Result<(CalibrationOutcome, Real)> {
        let model = self.current()?;
        Ok((self.outcome, self.pricing_error(&model)?))
    }

    /// Current parameters as a model ready for pricing.
    pub fn calibrated_model(&self) -> Result<HestonModel> {
        self.current()
    }

    fn current(&self) -> Result<HestonModel> {
        self.model.ok_or(Error::MissingGuess)
    }

    /// Fit the parameters to the quotes.
    ///
    /// Convergence gives [`CalibrationOutcome::FinishedOk`] and an
    /// exhausted iteration budget [`CalibrationOutcome::FailedMaxIterations`];
    /// both keep the minimizer's parameters. Any other termination sets
    /// [`CalibrationOutcome::FailedOther`], keeps the previous parameters and
    /// returns `CalibrationFailed`.
    pub fn calibrate(&mut self) -> Result<CalibrationReport> {
        self.outcome = CalibrationOutcome::NotStarted;
        let guess = self.current()?;
        ensure!(!self.quotes.is_empty(), "calibration needs at least one quote");

        let objective = Objective {
            base: guess,
            quotes: &self.quotes,
            integration: self.integration,
            diff_step: self.settings.diff_step,
        };
        let criteria = EndCriteria::new(self.settings.max_iterations, self.settings.accuracy)
            .with_max_step(self.settings.max_step);
        let initial = DVector::from_vec(guess.params());
        info!(quotes = self.quotes.len(), guess = ?guess.param_array(), "calibration started");

        let result = match self.minimizer.minimize(&objective, &initial, &criteria) {
            Ok(result) => result,
            Err(e) => return Err(self.fail(format!("minimizer rejected the problem: {e}"))),
        };

        let outcome = match result.end_type {
            t if t.is_converged() => CalibrationOutcome::FinishedOk,
            EndCriteriaType::MaxIterations => CalibrationOutcome::FailedMaxIterations,
            t => {
                return Err(self.fail(format!(
                    "minimizer terminated with {t:?} after {} iterations",
                    result.iterations
                )))
            }
        };

        let mut model = guess;
        if let Err(e) = model.set_params(result.x.as_slice()) {
            return Err(self.fail(format!("minimizer returned invalid parameters: {e}")));
        }
        let pricing_error = self.pricing_error(&model)?;
        self.model = Some(model);
        self.outcome = outcome;

        if outcome == CalibrationOutcome::FailedMaxIterations {
            warn!(
                iterations = result.iterations,
                pricing_error, "calibration hit the iteration limit"
            );
        } else {
            info!(
                iterations = result.iterations,
                pricing_error,
                params = ?model.param_array(),
                "calibration finished"
            );
        }

        Ok(CalibrationReport {
            outcome,
            model,
            pricing_error,
            iterations: result.iterations,
        })
    }

    fn fail(&mut self, message: String) -> Error {
        self.outcome = CalibrationOutcome::FailedOther;
        warn!(%message, "calibration failed");
        Error::CalibrationFailed(message)
    }
}

// ── Objective ────────────────────────────────────────────────────────────────

fn sum_squared_errors(
    model: &HestonModel,
    quotes: &[MarketQuote],
    integration: HestonIntegration,
) -> Result<Real> {
    let engine = AnalyticHestonEngine::new(*model).with_integration(integration);
    let errors = quotes
        .par_iter()
        .map(|q| {
            let price = engine.call_price(q.strike(), q.maturity())?;
            Ok((price - q.price()).powi(2))
        })
        .collect::<Result<Vec<Real>>>()?;
    Ok(errors.iter().sum())
}

struct Objective<'a> {
    base: HestonModel,
    quotes: &'a [MarketQuote],
    integration: HestonIntegration,
    diff_step: Real,
}

impl CostFunction for Objective<'_> {
    fn value(&self, x: &DVector<Real>) -> Real {
        let mut model = self.base;
        let sse = model
            .set_params(x.as_slice())
            .and_then(|()| sum_squared_errors(&model, self.quotes, self.integration))
            .unwrap_or(Real::NAN);
        trace!(params = ?x.as_slice(), sse, "calibration objective");
        sse
    }

    fn finite_difference_step(&self) -> Real {
        self.diff_step
    }
}
