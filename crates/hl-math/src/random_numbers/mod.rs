//! Random number generators.
//!
//! [`GaussianRng`] is the standard-normal sampler interface consumed by the
//! path simulator. Two implementations are provided: an inverse-CDF
//! transform of a Mersenne Twister stream, and any `rand` generator sampled
//! through `rand_distr::StandardNormal`.

use hl_core::Real;
use rand::Rng;
use rand_distr::StandardNormal;
use rand_mt::Mt19937GenRand64;

/// A source of independent standard-normal deviates.
pub trait GaussianRng {
    /// Draw the next standard-normal deviate.
    fn next_gaussian(&mut self) -> Real;

    /// Fill `out` with independent deviates.
    fn fill(&mut self, out: &mut [Real]) {
        for x in out {
            *x = self.next_gaussian();
        }
    }
}

impl<G: GaussianRng + ?Sized> GaussianRng for &mut G {
    fn next_gaussian(&mut self) -> Real {
        (**self).next_gaussian()
    }

    fn fill(&mut self, out: &mut [Real]) {
        (**self).fill(out)
    }
}

/// A uniform pseudo-random number generator based on the Mersenne Twister
/// MT19937-64 algorithm.
#[derive(Clone)]
pub struct MersenneTwisterUniformRng {
    rng: Mt19937GenRand64,
}

impl MersenneTwisterUniformRng {
    /// Create a new generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt19937GenRand64::new(seed),
        }
    }

    /// Generate the next uniform deviate in `[0, 1)`.
    pub fn next_real(&mut self) -> Real {
        // 53 random mantissa bits
        (self.rng.next_u64() >> 11) as Real * (1.0 / (1u64 << 53) as Real)
    }
}

/// Standard-normal deviates by inverting the normal CDF on Mersenne Twister
/// uniforms.
#[derive(Clone)]
pub struct InverseCumulativeNormalRng {
    inner: MersenneTwisterUniformRng,
}

impl InverseCumulativeNormalRng {
    /// Create a new generator backed by a Mersenne Twister with the given
    /// seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: MersenneTwisterUniformRng::new(seed),
        }
    }
}

impl GaussianRng for InverseCumulativeNormalRng {
    fn next_gaussian(&mut self) -> Real {
        // Reject exact 0, which maps to -∞.
        let u = loop {
            let u = self.inner.next_real();
            if u > 0.0 {
                break u;
            }
        };
        crate::distributions::normal_cdf_inverse(u)
    }
}

/// Standard-normal deviates drawn from any `rand` generator.
#[derive(Debug, Clone)]
pub struct StandardNormalRng<R> {
    rng: R,
}

impl<R: Rng> StandardNormalRng<R> {
    /// Wrap `rng`.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> GaussianRng for StandardNormalRng<R> {
    fn next_gaussian(&mut self) -> Real {
        self.rng.sample(StandardNormal)
    }
}
