//! Statistics accumulator with exact merging of partial results.

use hl_core::{Real, Size};

/// Incremental statistics accumulator.
///
/// Tracks count, mean, the sum of squared deviations (Welford's update),
/// min and max. Two accumulators fed disjoint samples can be combined with
/// [`Statistics::merge`], which is how per-thread partial results are
/// reduced.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    count: Size,
    mean: Real,
    m2: Real,
    min: Real,
    max: Real,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    /// Create a new empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: Real::INFINITY,
            max: Real::NEG_INFINITY,
        }
    }

    /// Add a sample.
    pub fn add(&mut self, x: Real) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as Real;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Fold the samples of `other` into `self` (Chan et al. pairwise update).
    pub fn merge(&mut self, other: &Statistics) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let (na, nb) = (self.count as Real, other.count as Real);
        let n = na + nb;
        let delta = other.mean - self.mean;
        self.mean += delta * nb / n;
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Number of samples.
    pub fn samples(&self) -> Size {
        self.count
    }

    /// Sample mean, `None` if empty.
    pub fn mean(&self) -> Option<Real> {
        (self.count > 0).then_some(self.mean)
    }

    /// Unbiased variance. `None` for fewer than 2 samples.
    pub fn variance(&self) -> Option<Real> {
        (self.count > 1).then(|| self.m2.max(0.0) / (self.count as Real - 1.0))
    }

    /// Standard deviation. `None` for fewer than 2 samples.
    pub fn std_dev(&self) -> Option<Real> {
        self.variance().map(Real::sqrt)
    }

    /// Standard error of the mean, `σ / √n`.
    pub fn error_estimate(&self) -> Option<Real> {
        self.std_dev().map(|s| s / (self.count as Real).sqrt())
    }

    /// Smallest sample, `None` if empty.
    pub fn minimum(&self) -> Option<Real> {
        (self.count > 0).then_some(self.min)
    }

    /// Largest sample, `None` if empty.
    pub fn maximum(&self) -> Option<Real> {
        (self.count > 0).then_some(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    fn collect(xs: &[Real]) -> Statistics {
        let mut s = Statistics::new();
        xs.iter().for_each(|&x| s.add(x));
        s
    }

    #[test]
    fn basic_statistics() {
        let s = collect(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(s.samples(), 5);
        assert_abs_diff_eq!(s.mean().unwrap(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.variance().unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(s.std_dev().unwrap(), 2.5_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(s.error_estimate().unwrap(), 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(s.minimum(), Some(1.0));
        assert_eq!(s.maximum(), Some(5.0));
    }

    #[test]
    fn empty_and_single_sample() {
        let s = Statistics::new();
        assert!(s.mean().is_none());
        assert!(s.variance().is_none());
        assert!(s.error_estimate().is_none());
        assert!(s.minimum().is_none());

        let one = collect(&[7.0]);
        assert_eq!(one.mean(), Some(7.0));
        assert!(one.variance().is_none());
    }

    #[test]
    fn large_offset_keeps_variance() {
        let s = collect(&[1e9 + 1.0, 1e9 + 2.0, 1e9 + 3.0]);
        assert_abs_diff_eq!(s.variance().unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn merging_with_empty_is_identity() {
        let mut s = collect(&[1.5, 2.5]);
        let before = s.clone();
        s.merge(&Statistics::new());
        assert_eq!(s, before);

        let mut empty = Statistics::new();
        empty.merge(&before);
        assert_eq!(empty, before);
    }

    proptest! {
        #[test]
        fn merge_matches_single_pass(
            xs in prop::collection::vec(-100.0f64..100.0, 2..60),
            split in 0usize..60,
        ) {
            let split = split.min(xs.len());
            let whole = collect(&xs);
            let (left, right) = xs.split_at(split);
            let mut a = collect(left);
            a.merge(&collect(right));

            prop_assert_eq!(a.samples(), whole.samples());
            assert_relative_eq!(a.mean().unwrap(), whole.mean().unwrap(), epsilon = 1e-9, max_relative = 1e-9);
            assert_relative_eq!(a.variance().unwrap(), whole.variance().unwrap(), epsilon = 1e-7, max_relative = 1e-9);
            prop_assert_eq!(a.minimum(), whole.minimum());
            prop_assert_eq!(a.maximum(), whole.maximum());
        }
    }
}
