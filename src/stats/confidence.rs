//! Confidence intervals for rates and proportions.
//!
//! The observed number of events `O` is treated as Poisson distributed. A
//! rate `r = O / n` has limits `O_lower / n` and `O_upper / n`, where the
//! limits on `O` come from one of two methods:
//!
//! - **Exact**: `O_lower = χ²(α/2; 2O) / 2` and
//!   `O_upper = χ²(1 − α/2; 2O + 2) / 2`, where `χ²(p; k)` is the `p`
//!   quantile of the chi-squared distribution with `k` degrees of freedom.
//! - **Byar's**: `O_lower = O(1 − 1/9O − z/3√O)³` and
//!   `O_upper = (O+1)(1 − 1/9(O+1) + z/3√(O+1))³`, with `z` the
//!   `1 − α/2` standard normal quantile. Used from ten events upwards;
//!   smaller counts fall back to the exact method.

use std::f64::consts::SQRT_2;

use statrs::function::erf::erf_inv;
use statrs::function::gamma::gamma_lr;

use crate::config::ConfidenceMethod;

/// Event count from which Byar's approximation replaces the exact method
pub const BYARS_THRESHOLD: f64 = 10.0;

const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-14;

/// Lower and upper bounds for an observed count over a denominator
///
/// `numerator` is the number of observed events (≥ 0) and `denominator`
/// the population or time at risk (> 0).
pub trait ConfidenceInterval {
    fn lower_bound(&self, numerator: f64, denominator: f64, alpha: f64) -> f64;

    fn upper_bound(&self, numerator: f64, denominator: f64, alpha: f64) -> f64;

    /// Both bounds as `(lower, upper)`
    fn bounds(&self, numerator: f64, denominator: f64, alpha: f64) -> (f64, f64) {
        (
            self.lower_bound(numerator, denominator, alpha),
            self.upper_bound(numerator, denominator, alpha),
        )
    }
}

/// Exact chi-squared limits
#[derive(Debug, Clone, Copy, Default)]
pub struct ChiSquaredInterval;

impl ConfidenceInterval for ChiSquaredInterval {
    fn lower_bound(&self, numerator: f64, denominator: f64, alpha: f64) -> f64 {
        // χ² with zero degrees of freedom sits entirely at zero
        if numerator <= 0.0 {
            return 0.0;
        }
        chi_squared_ppf(alpha / 2.0, 2.0 * numerator) / 2.0 / denominator
    }

    fn upper_bound(&self, numerator: f64, denominator: f64, alpha: f64) -> f64 {
        chi_squared_ppf(1.0 - alpha / 2.0, 2.0 * numerator + 2.0) / 2.0 / denominator
    }
}

/// Byar's approximation with exact limits below [`BYARS_THRESHOLD`] events
#[derive(Debug, Clone, Copy, Default)]
pub struct ByarsInterval;

impl ConfidenceInterval for ByarsInterval {
    fn lower_bound(&self, numerator: f64, denominator: f64, alpha: f64) -> f64 {
        if !numerator.is_finite() {
            return 0.0;
        }
        if numerator < BYARS_THRESHOLD {
            return ChiSquaredInterval.lower_bound(numerator, denominator, alpha);
        }

        let z = normal_ppf(1.0 - alpha / 2.0);
        let c = 1.0 / (9.0 * numerator);
        let b = 3.0 * numerator.sqrt();
        numerator * (1.0 - c - z / b).powi(3) / denominator
    }

    fn upper_bound(&self, numerator: f64, denominator: f64, alpha: f64) -> f64 {
        if numerator < BYARS_THRESHOLD {
            return ChiSquaredInterval.upper_bound(numerator, denominator, alpha);
        }

        let shifted = numerator + 1.0;
        let z = normal_ppf(1.0 - alpha / 2.0);
        let c = 1.0 / (9.0 * shifted);
        let b = 3.0 * shifted.sqrt();
        shifted * (1.0 - c + z / b).powi(3) / denominator
    }
}

impl ConfidenceInterval for ConfidenceMethod {
    fn lower_bound(&self, numerator: f64, denominator: f64, alpha: f64) -> f64 {
        match self {
            Self::Byars => ByarsInterval.lower_bound(numerator, denominator, alpha),
            Self::Exact => ChiSquaredInterval.lower_bound(numerator, denominator, alpha),
        }
    }

    fn upper_bound(&self, numerator: f64, denominator: f64, alpha: f64) -> f64 {
        match self {
            Self::Byars => ByarsInterval.upper_bound(numerator, denominator, alpha),
            Self::Exact => ChiSquaredInterval.upper_bound(numerator, denominator, alpha),
        }
    }
}

/// Standard normal quantile
#[must_use]
pub fn normal_ppf(p: f64) -> f64 {
    SQRT_2 * erf_inv(2.0 * p - 1.0)
}

/// Chi-squared quantile for `df` degrees of freedom
///
/// Inverts the regularized lower incomplete gamma function by bisection,
/// which converges for every `p` in `(0, 1)` without needing a starting
/// guess close to the root.
#[must_use]
pub fn chi_squared_ppf(p: f64, df: f64) -> f64 {
    if df <= 0.0 || p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let shape = df / 2.0;
    let cdf = |x: f64| gamma_lr(shape, x / 2.0);

    let mut lo = 0.0;
    let mut hi = df.max(1.0);
    while cdf(hi) < p {
        lo = hi;
        hi *= 2.0;
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= TOLERANCE * hi {
            break;
        }
    }

    0.5 * (lo + hi)
}
