//! Heston stochastic volatility model.
//!
//! Wraps a [`HestonProcess`] and exposes its five free parameters as a flat
//! vector in the fixed order `[κ, θ, σ, ρ, v0]`. The rate and the spot are
//! market data and are never calibrated.

use crate::calibrated_model::CalibratedModel;
use hl_core::{ensure, errors::Result, Rate, Real, Volatility};
use hl_processes::HestonProcess;

/// Heston stochastic volatility model with calibration support.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonModel {
    process: HestonProcess,
}

impl HestonModel {
    /// Index of `κ` in the parameter vector.
    pub const KAPPA: usize = 0;
    /// Index of `θ` in the parameter vector.
    pub const THETA: usize = 1;
    /// Index of `σ` in the parameter vector.
    pub const SIGMA: usize = 2;
    /// Index of `ρ` in the parameter vector.
    pub const RHO: usize = 3;
    /// Index of `v0` in the parameter vector.
    pub const V0: usize = 4;
    /// Length of the parameter vector.
    pub const NUM_PARAMS: usize = 5;

    /// Create a new Heston model from its process.
    pub fn new(process: HestonProcess) -> Self {
        Self { process }
    }

    /// Create from individual parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn from_params(
        risk_free_rate: Rate,
        s0: Real,
        kappa: Real,
        theta: Volatility,
        sigma: Volatility,
        rho: Real,
        v0: Volatility,
    ) -> Result<Self> {
        HestonProcess::new(risk_free_rate, s0, kappa, theta, sigma, rho, v0).map(Self::new)
    }

    /// A copy of this model with `values` (in `[κ, θ, σ, ρ, v0]` order) in
    /// place of the current parameters.
    pub fn with_params(&self, values: &[Real]) -> Result<Self> {
        ensure!(
            values.len() == Self::NUM_PARAMS,
            "expected {} Heston parameters, got {}",
            Self::NUM_PARAMS,
            values.len()
        );
        Self::from_params(
            self.risk_free_rate(),
            self.s0(),
            values[Self::KAPPA],
            values[Self::THETA],
            values[Self::SIGMA],
            values[Self::RHO],
            values[Self::V0],
        )
    }

    /// Parameters as `[κ, θ, σ, ρ, v0]`.
    pub fn param_array(&self) -> [Real; 5] {
        [self.kappa(), self.theta(), self.sigma(), self.rho(), self.v0()]
    }

    /// Access the underlying process.
    pub fn process(&self) -> &HestonProcess {
        &self.process
    }

    /// Risk-free rate.
    pub fn risk_free_rate(&self) -> Rate {
        self.process.risk_free_rate()
    }

    /// Initial spot.
    pub fn s0(&self) -> Real {
        self.process.s0()
    }

    /// Initial variance.
    pub fn v0(&self) -> Volatility {
        self.process.v0()
    }

    /// Mean-reversion speed.
    pub fn kappa(&self) -> Real {
        self.process.kappa()
    }

    /// Long-run variance.
    pub fn theta(&self) -> Volatility {
        self.process.theta()
    }

    /// Vol-of-vol.
    pub fn sigma(&self) -> Volatility {
        self.process.sigma()
    }

    /// Spot-vol correlation.
    pub fn rho(&self) -> Real {
        self.process.rho()
    }

    /// Feller condition: `2κθ > σ²`.
    pub fn feller_satisfied(&self) -> bool {
        self.process.feller_satisfied()
    }
}

impl From<HestonProcess> for HestonModel {
    fn from(process: HestonProcess) -> Self {
        Self::new(process)
    }
}

impl CalibratedModel for HestonModel {
    fn params(&self) -> Vec<Real> {
        self.param_array().to_vec()
    }

    fn set_params(&mut self, values: &[Real]) -> Result<()> {
        *self = self.with_params(values)?;
        Ok(())
    }
}
