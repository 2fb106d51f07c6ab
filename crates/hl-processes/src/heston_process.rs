//! Heston model parameters and the quadratic-exponential path simulator.
//!
//! Per step of length `τ`, with independent standard normals `z₁, z₂`:
//!
//! ```text
//! dZ₁ = √τ·z₁
//! dZ₂ = √τ·(ρ·z₁ + √(1−ρ²)·z₂)
//! S  ← S + r·S·τ + √v·S·dZ₁
//! a   = (√v + γ·dZ₂) / (2(1 − βτ))
//! √v ← a + √(a² + ατ/(1 − βτ))
//! ```
//!
//! with `α = (4κθ − σ²)/8`, `β = −κ/2`, `γ = σ/2`. Under the Feller
//! condition `α > 0`, so the square root is real and the updated volatility
//! is strictly positive whatever the draw.
//!
//! # Antithetic convention
//!
//! The mirror path of an antithetic pair flips the sign of the spot
//! diffusion term only: its spot moves by `−√v·S·dZ₁` while its volatility
//! is updated with the same `dZ₂` as the plain path. Started from the same
//! state, both legs therefore share one variance path and differ in the
//! spot alone.

use hl_core::{ensure, errors::Error, errors::Result, Rate, Real, Size, Time, Volatility};
use hl_math::random_numbers::GaussianRng;

// ── Parameters ────────────────────────────────────────────────────────────────

/// The Heston model parameters.
///
/// * `risk_free_rate` — continuously compounded rate `r`
/// * `s0`    — initial spot
/// * `kappa` — mean-reversion speed of variance
/// * `theta` — long-run variance level
/// * `sigma` — volatility of variance
/// * `rho`   — correlation between the two Brownian motions
/// * `v0`    — initial variance
///
/// Construction checks `r > 0`, `s0 > 0`, `sigma > 0` and `v0 > 0`. Neither
/// the Feller condition nor the range of `rho` is enforced here; components
/// that need them check on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonProcess {
    risk_free_rate: Rate,
    s0: Real,
    kappa: Real,
    theta: Volatility,
    sigma: Volatility,
    rho: Real,
    v0: Volatility,
}

impl HestonProcess {
    /// Create a new parameter set.
    pub fn new(
        risk_free_rate: Rate,
        s0: Real,
        kappa: Real,
        theta: Volatility,
        sigma: Volatility,
        rho: Real,
        v0: Volatility,
    ) -> Result<Self> {
        ensure!(
            [risk_free_rate, s0, kappa, theta, sigma, rho, v0]
                .iter()
                .all(|x| x.is_finite()),
            "Heston parameters must be finite"
        );
        ensure!(
            risk_free_rate > 0.0,
            "risk-free rate must be positive, got {risk_free_rate}"
        );
        ensure!(s0 > 0.0, "initial spot must be positive, got {s0}");
        ensure!(sigma > 0.0, "vol-of-vol must be positive, got {sigma}");
        ensure!(v0 > 0.0, "initial variance must be positive, got {v0}");

        Ok(Self {
            risk_free_rate,
            s0,
            kappa,
            theta,
            sigma,
            rho,
            v0,
        })
    }

    /// Risk-free rate.
    pub fn risk_free_rate(&self) -> Rate {
        self.risk_free_rate
    }

    /// Initial spot.
    pub fn s0(&self) -> Real {
        self.s0
    }

    /// Mean-reversion speed.
    pub fn kappa(&self) -> Real {
        self.kappa
    }

    /// Long-run variance.
    pub fn theta(&self) -> Volatility {
        self.theta
    }

    /// Vol-of-vol.
    pub fn sigma(&self) -> Volatility {
        self.sigma
    }

    /// Spot/variance correlation.
    pub fn rho(&self) -> Real {
        self.rho
    }

    /// Initial variance.
    pub fn v0(&self) -> Volatility {
        self.v0
    }

    /// Feller condition: `2κθ > σ²`.
    pub fn feller_satisfied(&self) -> bool {
        2.0 * self.kappa * self.theta > self.sigma * self.sigma
    }

    /// `Err(FellerConditionViolated)` unless [`feller_satisfied`](Self::feller_satisfied).
    pub fn check_feller(&self) -> Result<()> {
        if self.feller_satisfied() {
            Ok(())
        } else {
            Err(Error::FellerConditionViolated {
                kappa: self.kappa,
                theta: self.theta,
                sigma: self.sigma,
            })
        }
    }
}

// ── Simulator ─────────────────────────────────────────────────────────────────

/// Joint state of a simulated path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HestonState {
    /// Asset price.
    pub spot: Real,
    /// Instantaneous variance.
    pub variance: Volatility,
}

/// Path simulator for the Heston process using the quadratic-exponential
/// step described in the module docs.
///
/// Holds no mutable state: randomness comes from the caller's
/// [`GaussianRng`], so one simulator is shared freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct VarianceProcessSimulator {
    risk_free_rate: Rate,
    v0: Volatility,
    rho: Real,
    rho_bar: Real,
    alpha: Real,
    beta: Real,
    gamma: Real,
}

impl VarianceProcessSimulator {
    /// Create a simulator for `process`.
    ///
    /// Fails with `FellerConditionViolated` if `2κθ ≤ σ²` and with
    /// `InvalidParameter` if `ρ ∉ [−1, 1]`.
    pub fn new(process: &HestonProcess) -> Result<Self> {
        process.check_feller()?;
        let rho = process.rho();
        ensure!(
            (-1.0..=1.0).contains(&rho),
            "correlation must lie in [-1, 1], got {rho}"
        );
        let kappa = process.kappa();
        let sigma = process.sigma();
        Ok(Self {
            risk_free_rate: process.risk_free_rate(),
            v0: process.v0(),
            rho,
            rho_bar: (1.0 - rho * rho).sqrt(),
            alpha: (4.0 * kappa * process.theta() - sigma * sigma) / 8.0,
            beta: -0.5 * kappa,
            gamma: 0.5 * sigma,
        })
    }

    /// State at time zero for the given spot.
    pub fn initial_state(&self, spot: Real) -> HestonState {
        HestonState {
            spot,
            variance: self.v0,
        }
    }

    /// Advance `state` by one step of length `dt` driven by the independent
    /// standard normals `z1` (spot) and `z2` (variance, before correlation).
    #[inline]
    pub fn evolve(&self, state: HestonState, dt: Time, z1: Real, z2: Real) -> HestonState {
        self.step(state, dt, z1, z2, 1.0)
    }

    /// The antithetic counterpart of [`evolve`](Self::evolve) for the same
    /// draws: the spot diffusion term changes sign, the variance update
    /// does not.
    #[inline]
    pub fn evolve_mirror(
        &self,
        state: HestonState,
        dt: Time,
        z1: Real,
        z2: Real,
    ) -> HestonState {
        self.step(state, dt, z1, z2, -1.0)
    }

    #[inline]
    fn step(
        &self,
        state: HestonState,
        dt: Time,
        z1: Real,
        z2: Real,
        spot_sign: Real,
    ) -> HestonState {
        let sqrt_dt = dt.sqrt();
        let dz1 = sqrt_dt * z1;
        let dz2 = sqrt_dt * (self.rho * z1 + self.rho_bar * z2);

        let vol = state.variance.sqrt();
        let spot = state.spot
            + self.risk_free_rate * state.spot * dt
            + spot_sign * vol * state.spot * dz1;

        let denom = 1.0 - self.beta * dt;
        let a = (vol + self.gamma * dz2) / (2.0 * denom);
        let vol = a + (a * a + self.alpha * dt / denom).sqrt();

        HestonState {
            spot,
            variance: vol * vol,
        }
    }

    /// Simulate from `state` over `horizon` in `steps` equal steps.
    pub fn simulate<G: GaussianRng + ?Sized>(
        &self,
        rng: &mut G,
        state: HestonState,
        horizon: Time,
        steps: Size,
    ) -> Result<HestonState> {
        check_inputs(state, horizon, steps)?;
        let dt = horizon / steps as Real;
        let mut state = state;
        for _ in 0..steps {
            let z1 = rng.next_gaussian();
            let z2 = rng.next_gaussian();
            state = self.evolve(state, dt, z1, z2);
        }
        Ok(state)
    }

    /// Simulate an antithetic pair from `(plain, mirror)` over `horizon` in
    /// `steps` equal steps. Both paths consume the same draws; the mirror
    /// advances with [`evolve_mirror`](Self::evolve_mirror).
    pub fn simulate_antithetic<G: GaussianRng + ?Sized>(
        &self,
        rng: &mut G,
        (plain, mirror): (HestonState, HestonState),
        horizon: Time,
        steps: Size,
    ) -> Result<(HestonState, HestonState)> {
        check_inputs(plain, horizon, steps)?;
        check_inputs(mirror, horizon, steps)?;
        let dt = horizon / steps as Real;
        let (mut plain, mut mirror) = (plain, mirror);
        for _ in 0..steps {
            let z1 = rng.next_gaussian();
            let z2 = rng.next_gaussian();
            plain = self.evolve(plain, dt, z1, z2);
            mirror = self.evolve_mirror(mirror, dt, z1, z2);
        }
        Ok((plain, mirror))
    }

    /// Terminal spot after `horizon`, starting from `spot` and `v0`.
    pub fn terminal_spot<G: GaussianRng + ?Sized>(
        &self,
        rng: &mut G,
        spot: Real,
        horizon: Time,
        steps: Size,
    ) -> Result<Real> {
        self.simulate(rng, self.initial_state(spot), horizon, steps)
            .map(|s| s.spot)
    }

    /// Terminal spots of an antithetic pair started from `spot` and `v0`.
    pub fn terminal_spots_antithetic<G: GaussianRng + ?Sized>(
        &self,
        rng: &mut G,
        spot: Real,
        horizon: Time,
        steps: Size,
    ) -> Result<(Real, Real)> {
        let start = self.initial_state(spot);
        self.simulate_antithetic(rng, (start, start), horizon, steps)
            .map(|(p, m)| (p.spot, m.spot))
    }
}

fn check_inputs(state: HestonState, horizon: Time, steps: Size) -> Result<()> {
    ensure!(horizon > 0.0, "horizon must be positive, got {horizon}");
    ensure!(steps > 0, "step count must be positive");
    ensure!(state.spot > 0.0, "spot must be positive, got {}", state.spot);
    ensure!(
        state.variance >= 0.0,
        "variance must be non-negative, got {}",
        state.variance
    );
    Ok(())
}
