//! Monte Carlo simulation framework.
//!
//! # Overview
//!
//! * [`PathPricer`] — simulates one sample and returns its discounted payoff
//! * [`MonteCarloModel`] — seeds, runs and aggregates samples
//! * [`MonteCarloSettings`] — path count, time steps, antithetic and
//!   parallel switches, base seed
//! * [`MonteCarloResult`] — price estimate with its standard error
//!
//! Sample `i` draws from its own generator seeded with `seed + i`, so a run
//! is reproducible and gives the same samples whether it is executed
//! sequentially or spread over the rayon pool. Partial [`Statistics`] are
//! merged after the parallel fold.

use hl_core::{ensure, errors::Result, fail, Real, Size};
use hl_math::random_numbers::{GaussianRng, InverseCumulativeNormalRng};
use hl_math::statistics::Statistics;
use rayon::prelude::*;
use tracing::debug;

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Monte Carlo run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloSettings {
    /// Number of simulated paths. With antithetic sampling the paths are
    /// grouped in `⌈paths/2⌉` mirrored pairs.
    pub paths: Size,
    /// Time steps per path.
    pub steps: Size,
    /// Use antithetic pairs.
    pub antithetic: bool,
    /// Spread samples over the rayon thread pool.
    pub parallel: bool,
    /// Base seed; sample `i` is seeded with `seed + i`.
    pub seed: u64,
}

impl Default for MonteCarloSettings {
    fn default() -> Self {
        Self {
            paths: 100_000,
            steps: 365,
            antithetic: true,
            parallel: true,
            seed: 42,
        }
    }
}

impl MonteCarloSettings {
    /// Set the number of paths.
    pub fn with_paths(mut self, paths: Size) -> Self {
        self.paths = paths;
        self
    }

    /// Set the number of time steps.
    pub fn with_steps(mut self, steps: Size) -> Self {
        self.steps = steps;
        self
    }

    /// Toggle antithetic sampling.
    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    /// Toggle parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Require positive path and step counts.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.paths > 0, "number of paths must be positive");
        ensure!(self.steps > 0, "number of time steps must be positive");
        Ok(())
    }

    /// Independent samples to draw: one per path, or one per antithetic
    /// pair.
    pub fn samples(&self) -> Size {
        if self.antithetic {
            self.paths.div_ceil(2)
        } else {
            self.paths
        }
    }

    /// Paths simulated per sample.
    pub fn paths_per_sample(&self) -> Size {
        if self.antithetic {
            2
        } else {
            1
        }
    }
}

// ─── PathPricer ───────────────────────────────────────────────────────────────

/// Simulates one sample and returns its discounted payoff.
///
/// For antithetic sampling a sample is a mirrored pair and the value is the
/// average of the two payoffs.
pub trait PathPricer: Send + Sync {
    /// Draw the sample from `rng` and price it.
    fn value(&self, rng: &mut dyn GaussianRng) -> Result<Real>;
}

impl<F> PathPricer for F
where
    F: Fn(&mut dyn GaussianRng) -> Result<Real> + Send + Sync,
{
    fn value(&self, rng: &mut dyn GaussianRng) -> Result<Real> {
        self(rng)
    }
}

// ─── MonteCarloModel ──────────────────────────────────────────────────────────

/// A Monte Carlo simulation orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct MonteCarloModel {
    seed: u64,
    parallel: bool,
}

impl MonteCarloModel {
    /// Create a new Monte Carlo model.
    pub fn new(seed: u64, parallel: bool) -> Self {
        Self { seed, parallel }
    }

    /// Model using the seed and execution mode of `settings`.
    pub fn from_settings(settings: &MonteCarloSettings) -> Self {
        Self::new(settings.seed, settings.parallel)
    }

    /// Run `samples` evaluations of `pricer` and return gathered statistics.
    ///
    /// The first error returned by the pricer aborts the run.
    pub fn simulate(&self, pricer: &dyn PathPricer, samples: Size) -> Result<Statistics> {
        ensure!(samples > 0, "number of samples must be positive");
        debug!(samples, parallel = self.parallel, seed = self.seed, "Monte Carlo run");

        let seed = self.seed;
        let sample = |i: Size| {
            let mut rng = InverseCumulativeNormalRng::new(seed.wrapping_add(i as u64));
            pricer.value(&mut rng)
        };

        let stats = if self.parallel {
            (0..samples)
                .into_par_iter()
                .try_fold(Statistics::new, |mut acc, i| -> Result<Statistics> {
                    acc.add(sample(i)?);
                    Ok(acc)
                })
                .try_reduce(Statistics::new, |mut a, b| {
                    a.merge(&b);
                    Ok(a)
                })?
        } else {
            let mut acc = Statistics::new();
            for i in 0..samples {
                acc.add(sample(i)?);
            }
            acc
        };

        debug!(mean = ?stats.mean(), error = ?stats.error_estimate(), "Monte Carlo done");
        Ok(stats)
    }
}

// ─── Result ───────────────────────────────────────────────────────────────────

/// A Monte Carlo price estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloResult {
    /// Sample mean of the discounted payoffs.
    pub price: Real,
    /// Standard error of `price`.
    pub error_estimate: Real,
    /// Number of simulated paths.
    pub samples: Size,
}

impl MonteCarloResult {
    /// Summarise `stats`, each sample of which covered `paths_per_sample`
    /// paths. A single sample has a zero error estimate.
    pub fn from_statistics(stats: &Statistics, paths_per_sample: Size) -> Result<Self> {
        let Some(price) = stats.mean() else {
            fail!("no Monte Carlo samples were drawn");
        };
        Ok(Self {
            price,
            error_estimate: stats.error_estimate().unwrap_or(0.0),
            samples: stats.samples() * paths_per_sample,
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hl_core::Error;
    use proptest::prelude::*;

    fn gaussian(rng: &mut dyn GaussianRng) -> Result<Real> {
        Ok(rng.next_gaussian())
    }

    #[test]
    fn settings_defaults_and_builders() {
        let s = MonteCarloSettings::default();
        assert_eq!((s.paths, s.steps, s.seed), (100_000, 365, 42));
        assert!(s.antithetic && s.parallel);

        let s = s.with_paths(7).with_steps(3).with_antithetic(false).with_seed(1);
        assert_eq!(s.samples(), 7);
        assert_eq!(s.with_antithetic(true).samples(), 4);
        assert_eq!(s.with_antithetic(true).paths_per_sample(), 2);
        assert!(s.with_paths(0).validate().is_err());
        assert!(s.with_steps(0).validate().is_err());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn gaussian_mean_is_near_zero() {
        let model = MonteCarloModel::new(7, true);
        let stats = model.simulate(&gaussian, 20_000).unwrap();
        let mean = stats.mean().unwrap();
        let err = stats.error_estimate().unwrap();
        assert!(mean.abs() < 5.0 * err, "mean = {mean}, error = {err}");
        assert_relative_eq!(stats.variance().unwrap(), 1.0, epsilon = 0.05);
    }

    #[test]
    fn zero_samples_rejected() {
        let model = MonteCarloModel::new(1, false);
        assert!(matches!(
            model.simulate(&gaussian, 0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn pricer_errors_propagate() {
        let failing = |rng: &mut dyn GaussianRng| -> Result<Real> {
            let z = rng.next_gaussian();
            if z > 2.0 {
                Err(Error::Runtime("bad sample".into()))
            } else {
                Ok(z)
            }
        };
        for parallel in [false, true] {
            let model = MonteCarloModel::new(3, parallel);
            assert!(matches!(
                model.simulate(&failing, 10_000),
                Err(Error::Runtime(_))
            ));
        }
    }

    #[test]
    fn result_counts_paths() {
        let stats = MonteCarloModel::new(5, false).simulate(&gaussian, 10).unwrap();
        let res = MonteCarloResult::from_statistics(&stats, 2).unwrap();
        assert_eq!(res.samples, 20);
        assert_eq!(res.price, stats.mean().unwrap());
        assert!(MonteCarloResult::from_statistics(&Statistics::new(), 1).is_err());

        let one = MonteCarloModel::new(5, false).simulate(&gaussian, 1).unwrap();
        let res = MonteCarloResult::from_statistics(&one, 1).unwrap();
        assert_eq!((res.samples, res.error_estimate), (1, 0.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn parallel_matches_sequential(seed in any::<u64>(), samples in 1usize..500) {
            let seq = MonteCarloModel::new(seed, false).simulate(&gaussian, samples).unwrap();
            let par = MonteCarloModel::new(seed, true).simulate(&gaussian, samples).unwrap();
            prop_assert_eq!(seq.samples(), par.samples());
            prop_assert!((seq.mean().unwrap() - par.mean().unwrap()).abs() < 1e-12);
            prop_assert_eq!(seq.minimum(), par.minimum());
            prop_assert_eq!(seq.maximum(), par.maximum());
        }
    }
}
