//! Streaming statistics used to aggregate metrics without buffering them.
//!
//! The accumulators are plain values with single-writer semantics: share one between
//! threads only behind external synchronization, or keep one per worker.
//!
//! `NaN` inputs are skipped without touching any state. Instruments write `NaN` for
//! values they could not compute (for example percent aligned before alignment has
//! run), and those must not poison a lane's average.
//!
//! # Examples
//!
//! ```rust
//! use interop::RunningVariance;
//!
//! let mut acc = RunningVariance::<f32>::new();
//! for value in [1.0, 2.0, f32::NAN, 3.0] {
//!     acc.push(value);
//! }
//! assert_eq!(acc.mean(), 2.0);
//! assert_eq!(acc.variance(), 1.0);
//! ```

use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Value kinds the accumulators accept: `u32`, `u64`, `f32` and `f64`.
pub trait Numeric: sealed::Sealed + Copy {
    fn to_f64(self) -> f64;
}

impl Numeric for u32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Numeric for u64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Numeric for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Numeric for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// Online weighted mean and variance (Welford's algorithm generalized to weights).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunningVariance<T: Numeric> {
    weighted: bool,
    weight_sum: f64,
    weight_sq_sum: f64,
    mean: f64,
    sq_dev: f64,
    kind: PhantomData<T>,
}

impl<T: Numeric> Default for RunningVariance<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Numeric> RunningVariance<T> {
    /// Accumulator where every value has weight 1.
    pub fn new() -> Self {
        Self {
            weighted: false,
            weight_sum: 0.0,
            weight_sq_sum: 0.0,
            mean: 0.0,
            sq_dev: 0.0,
            kind: PhantomData,
        }
    }

    /// Accumulator that honours the weights given to [`push_weighted`](Self::push_weighted).
    pub fn weighted() -> Self {
        Self {
            weighted: true,
            ..Self::new()
        }
    }

    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    pub fn push(&mut self, value: T) {
        self.push_weighted(value, 1.0);
    }

    /// Adds `value` with `weight`. The weight is ignored by unweighted accumulators.
    pub fn push_weighted(&mut self, value: T, weight: f64) {
        self.accept(value.to_f64(), weight);
    }

    /// Applies one observation, returning the weight it was given or `None` if it
    /// was skipped.
    fn accept(&mut self, value: f64, weight: f64) -> Option<f64> {
        let weight = if self.weighted { weight } else { 1.0 };
        if value.is_nan() || weight.is_nan() {
            return None;
        }

        self.weight_sum += weight;
        self.weight_sq_sum += weight * weight;
        if self.weight_sum == weight {
            self.mean = value;
            self.sq_dev = 0.0;
            return Some(weight);
        }

        let delta = value - self.mean;
        self.mean += (weight / self.weight_sum) * delta;
        // second factor uses the updated mean
        self.sq_dev += weight * delta * (value - self.mean);
        Some(weight)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Weighted sample variance; `0` until the total weight exceeds 1 and at least two
    /// observations carry weight.
    pub fn variance(&self) -> f64 {
        if self.weight_sum <= 1.0 {
            return 0.0;
        }
        let denominator = self.weight_sum - self.weight_sq_sum / self.weight_sum;
        if denominator > 0.0 {
            self.sq_dev / denominator
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Total weight pushed (the count for unweighted accumulators).
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    pub fn weight_sq_sum(&self) -> f64 {
        self.weight_sq_sum
    }

    pub fn is_empty(&self) -> bool {
        self.weight_sum == 0.0
    }
}

/// [`RunningVariance`] that also keeps the running (weighted) sum of values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunningSummary<T: Numeric> {
    variance: RunningVariance<T>,
    sum: f64,
}

impl<T: Numeric> Default for RunningSummary<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Numeric> RunningSummary<T> {
    pub fn new() -> Self {
        Self {
            variance: RunningVariance::new(),
            sum: 0.0,
        }
    }

    pub fn weighted() -> Self {
        Self {
            variance: RunningVariance::weighted(),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: T) {
        self.push_weighted(value, 1.0);
    }

    pub fn push_weighted(&mut self, value: T, weight: f64) {
        let value = value.to_f64();
        if let Some(weight) = self.variance.accept(value, weight) {
            self.sum += weight * value;
        }
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the values pushed, `NaN` if none were.
    pub fn mean_or_nan(&self) -> f64 {
        if self.variance.is_empty() {
            f64::NAN
        } else {
            self.variance.mean()
        }
    }

    pub fn mean(&self) -> f64 {
        self.variance.mean()
    }

    pub fn variance(&self) -> f64 {
        self.variance.variance()
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.std_dev()
    }

    pub fn weight_sum(&self) -> f64 {
        self.variance.weight_sum()
    }

    pub fn is_empty(&self) -> bool {
        self.variance.is_empty()
    }
}

/// Plain incremental mean.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunningAverage {
    count: u64,
    average: f64,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Numeric>(&mut self, value: T) {
        self.count += 1;
        self.average += (value.to_f64() - self.average) / self.count as f64;
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
