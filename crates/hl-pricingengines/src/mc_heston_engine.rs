//! Monte Carlo Heston engine for European, Asian and lookback payoffs.
//!
//! Every sample is one path, or one antithetic pair whose value is the
//! average of the two discounted payoffs. Paths are driven by
//! [`VarianceProcessSimulator`] and aggregated by [`MonteCarloModel`].

use hl_core::{errors::Result, DiscountFactor, Real, Size, Time};
use hl_instruments::{OptionSpec, PlainVanillaPayoff};
use hl_math::random_numbers::GaussianRng;
use hl_methods::monte_carlo::{MonteCarloModel, MonteCarloResult, MonteCarloSettings, PathPricer};
use hl_models::HestonModel;
use hl_processes::{HestonState, VarianceProcessSimulator};
use tracing::debug;

/// Monte Carlo pricing engine for the Heston model.
///
/// Construction fails with `FellerConditionViolated` when `2κθ ≤ σ²`, with
/// `InvalidParameter` when `ρ ∉ [−1, 1]` or when the path or step count is
/// zero.
#[derive(Debug, Clone, Copy)]
pub struct McHestonEngine {
    model: HestonModel,
    simulator: VarianceProcessSimulator,
    settings: MonteCarloSettings,
}

impl McHestonEngine {
    /// Create a new engine.
    pub fn new(model: HestonModel, settings: MonteCarloSettings) -> Result<Self> {
        settings.validate()?;
        let simulator = VarianceProcessSimulator::new(model.process())?;
        Ok(Self {
            model,
            simulator,
            settings,
        })
    }

    /// The simulated model.
    pub fn model(&self) -> &HestonModel {
        &self.model
    }

    /// Run configuration.
    pub fn settings(&self) -> &MonteCarloSettings {
        &self.settings
    }

    /// Price `option`.
    ///
    /// The contract is validated before any path is simulated: bad strikes
    /// and maturities are `InvalidParameter`, a bad Asian monitoring
    /// schedule is `InvalidOptionSpec`.
    pub fn price(&self, option: &OptionSpec) -> Result<MonteCarloResult> {
        option.validate()?;
        let maturity = option.maturity();
        let discount = (-self.model.risk_free_rate() * maturity).exp();
        let path = PathSetup {
            simulator: self.simulator,
            s0: self.model.s0(),
            antithetic: self.settings.antithetic,
            discount,
        };
        debug!(
            ?option,
            paths = self.settings.paths,
            steps = self.settings.steps,
            antithetic = self.settings.antithetic,
            "Heston Monte Carlo"
        );

        let steps = self.settings.steps;
        let pricer: Box<dyn PathPricer> = match option {
            OptionSpec::European { payoff, maturity } => Box::new(EuropeanPathPricer {
                path,
                payoff: *payoff,
                maturity: *maturity,
                steps,
            }),
            OptionSpec::Asian {
                payoff,
                maturity,
                monitoring_times,
            } => Box::new(AsianPathPricer {
                path,
                payoff: *payoff,
                segments: segments(monitoring_times, *maturity, steps),
            }),
            OptionSpec::Lookback { maturity } => Box::new(LookbackPathPricer {
                path,
                dt: *maturity / steps as Real,
                steps,
            }),
        };

        let model = MonteCarloModel::from_settings(&self.settings);
        let stats = model.simulate(pricer.as_ref(), self.settings.samples())?;
        let result = MonteCarloResult::from_statistics(&stats, self.settings.paths_per_sample())?;
        debug!(price = result.price, error = result.error_estimate, "Heston Monte Carlo done");
        Ok(result)
    }
}

/// `(length, steps)` of each interval between consecutive monitoring times,
/// with steps proportional to the length and rounded up.
fn segments(monitoring_times: &[Time], maturity: Time, steps: Size) -> Vec<(Time, Size)> {
    let mut previous = 0.0;
    monitoring_times
        .iter()
        .map(|&t| {
            let length = t - previous;
            previous = t;
            let n = (length * steps as Real / maturity).ceil() as Size;
            (length, n.max(1))
        })
        .collect()
}

// ─── Path pricers ─────────────────────────────────────────────────────────────

/// What every pricer needs to start and discount a path.
#[derive(Debug, Clone, Copy)]
struct PathSetup {
    simulator: VarianceProcessSimulator,
    s0: Real,
    antithetic: bool,
    discount: DiscountFactor,
}

impl PathSetup {
    fn start(&self) -> HestonState {
        self.simulator.initial_state(self.s0)
    }
}

/// Payoff on the terminal spot.
struct EuropeanPathPricer {
    path: PathSetup,
    payoff: PlainVanillaPayoff,
    maturity: Time,
    steps: Size,
}

impl PathPricer for EuropeanPathPricer {
    fn value(&self, rng: &mut dyn GaussianRng) -> Result<Real> {
        let sim = &self.path.simulator;
        let undiscounted = if self.path.antithetic {
            let (a, b) = sim.terminal_spots_antithetic(rng, self.path.s0, self.maturity, self.steps)?;
            0.5 * (self.payoff.value(a) + self.payoff.value(b))
        } else {
            self.payoff
                .value(sim.terminal_spot(rng, self.path.s0, self.maturity, self.steps)?)
        };
        Ok(self.path.discount * undiscounted)
    }
}

/// Payoff on the arithmetic average of the monitored spots. The full state,
/// variance included, carries over from one segment to the next.
struct AsianPathPricer {
    path: PathSetup,
    payoff: PlainVanillaPayoff,
    segments: Vec<(Time, Size)>,
}

impl PathPricer for AsianPathPricer {
    fn value(&self, rng: &mut dyn GaussianRng) -> Result<Real> {
        let sim = &self.path.simulator;
        let fixings = self.segments.len() as Real;
        let undiscounted = if self.path.antithetic {
            let mut pair = (self.path.start(), self.path.start());
            let (mut sum_a, mut sum_b) = (0.0, 0.0);
            for &(length, steps) in &self.segments {
                pair = sim.simulate_antithetic(rng, pair, length, steps)?;
                sum_a += pair.0.spot;
                sum_b += pair.1.spot;
            }
            0.5 * (self.payoff.value(sum_a / fixings) + self.payoff.value(sum_b / fixings))
        } else {
            let mut state = self.path.start();
            let mut sum = 0.0;
            for &(length, steps) in &self.segments {
                state = sim.simulate(rng, state, length, steps)?;
                sum += state.spot;
            }
            self.payoff.value(sum / fixings)
        };
        Ok(self.path.discount * undiscounted)
    }
}

/// Floating-strike lookback call `S_T − min S`, the minimum running over
/// every step and the initial spot.
struct LookbackPathPricer {
    path: PathSetup,
    dt: Time,
    steps: Size,
}

impl PathPricer for LookbackPathPricer {
    fn value(&self, rng: &mut dyn GaussianRng) -> Result<Real> {
        let sim = &self.path.simulator;
        let mut plain = self.path.start();
        let mut mirror = plain;
        let mut min_plain = plain.spot;
        let mut min_mirror = mirror.spot;

        for _ in 0..self.steps {
            let z1 = rng.next_gaussian();
            let z2 = rng.next_gaussian();
            plain = sim.evolve(plain, self.dt, z1, z2);
            min_plain = min_plain.min(plain.spot);
            if self.path.antithetic {
                mirror = sim.evolve_mirror(mirror, self.dt, z1, z2);
                min_mirror = min_mirror.min(mirror.spot);
            }
        }

        let undiscounted = if self.path.antithetic {
            0.5 * ((plain.spot - min_plain) + (mirror.spot - min_mirror))
        } else {
            plain.spot - min_plain
        };
        Ok(self.path.discount * undiscounted)
    }
}
