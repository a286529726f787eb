//! Exact odds for the uniform-random baseline.
//!
//! Every participant is modelled as an independent uniform draw from
//! `{0..K}`. The single-round probability that N draws sum to T is counted
//! exactly with inclusion–exclusion over bounded compositions:
//!
//! ```text
//! P(N, K, T) = Σ_{i=0}^{⌊T/(K+1)⌋} (−1)^i · C(N, i) · C(T − i(K+1) + N − 1, N − 1) / (K+1)^N
//! ```
//!
//! Counts are accumulated in `u128`. When any intermediate value overflows,
//! the same sum is recomputed with arbitrary-precision integers, so the count
//! stays exact and only the final ratio is rounded to `f64`. Probabilities
//! below the smallest subnormal `f64` round to 0.
//!
//! Multi-round values treat rounds as independent Bernoulli trials and use
//! double precision throughout. A minimum round count that does not fit in
//! `u64` is reported as [`RoundsNeeded::ExceedsRange`].

use std::fmt;

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::params::GameParameters;

/// Largest distribution [`sum_distribution`] will materialize.
pub const MAX_DISTRIBUTION_LEN: u64 = 1 << 24;

/// Minimum number of rounds needed to reach a target confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundsNeeded {
    /// The confidence is reached after this many rounds.
    Finite(u64),
    /// The target sum can never be hit, so no number of rounds suffices.
    Unreachable,
    /// Reachable, but only after more than `u64::MAX` rounds.
    ExceedsRange,
}

impl RoundsNeeded {
    /// Returns the finite round count, if any.
    #[must_use]
    pub const fn finite(self) -> Option<u64> {
        match self {
            Self::Finite(x) => Some(x),
            Self::Unreachable | Self::ExceedsRange => None,
        }
    }

    /// Returns true if the target can never be reached.
    #[must_use]
    pub const fn is_unreachable(self) -> bool {
        matches!(self, Self::Unreachable)
    }
}

impl fmt::Display for RoundsNeeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(x) => write!(f, "{x}"),
            Self::Unreachable => write!(f, "∞"),
            Self::ExceedsRange => write!(f, "more than {}", u64::MAX),
        }
    }
}

/// One point of the cumulative success curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    /// Number of rounds played.
    pub rounds: u64,
    /// Probability of at least one success within `rounds`.
    pub probability: f64,
}

/// Probability that `n` uniform draws from `[0, k]` sum to exactly `t`.
///
/// # Errors
///
/// Returns `ValidationError::InvalidParameter` if `n == 0`.
pub fn single_round_probability(n: u32, k: u32, t: i64) -> Result<f64, ValidationError> {
    validate_participants(n)?;
    let max_sum = u64::from(n) * u64::from(k);
    let Ok(t) = u64::try_from(t) else {
        return Ok(0.0);
    };
    if t > max_sum {
        return Ok(0.0);
    }

    match exact_count(n, k, t) {
        Some((count, total)) => Ok(count as f64 / total as f64),
        None => Ok(big_probability(n, k, t)),
    }
}

/// Probability of every reachable sum `0..=n·k`, by iterative convolution.
///
/// # Errors
///
/// Returns `ValidationError::InvalidParameter` if `n == 0` or the
/// distribution would exceed `MAX_DISTRIBUTION_LEN` entries.
pub fn sum_distribution(n: u32, k: u32) -> Result<Vec<f64>, ValidationError> {
    validate_participants(n)?;
    let len = u64::from(n) * u64::from(k) + 1;
    if len > MAX_DISTRIBUTION_LEN {
        return Err(ValidationError::parameter(
            "range_max",
            format!("sum distribution of {len} entries exceeds {MAX_DISTRIBUTION_LEN}"),
        ));
    }

    let width = k as usize + 1;
    let weight = 1.0 / width as f64;
    let mut dist = vec![1.0_f64];
    for _ in 0..n {
        let mut next = vec![0.0_f64; dist.len() + width - 1];
        // Sliding window over the last `width` entries of `dist`.
        let mut window = 0.0;
        for (s, slot) in next.iter_mut().enumerate() {
            if let Some(&p) = dist.get(s) {
                window += p;
            }
            if s >= width {
                if let Some(&p) = dist.get(s - width) {
                    window -= p;
                }
            }
            *slot = window.max(0.0) * weight;
        }
        dist = next;
    }
    Ok(dist)
}

/// Probability of at least one success in `x` independent rounds.
///
/// Equal to `1 − (1 − p1)^x`; `x == 0` yields 0.
///
/// # Errors
///
/// Same as [`single_round_probability`].
pub fn probability_in_x_rounds(n: u32, k: u32, t: i64, x: u64) -> Result<f64, ValidationError> {
    let p1 = single_round_probability(n, k, t)?;
    Ok(cumulative(p1, x))
}

/// Smallest round count whose cumulative success probability reaches
/// `target_prob`.
///
/// # Errors
///
/// Returns `ValidationError::InvalidParameter` if `n == 0` or `target_prob`
/// is not in `[0, 1)`.
pub fn rounds_for_target_probability(
    n: u32,
    k: u32,
    t: i64,
    target_prob: f64,
) -> Result<RoundsNeeded, ValidationError> {
    validate_target_probability(target_prob)?;
    let p1 = single_round_probability(n, k, t)?;
    Ok(rounds_needed(p1, target_prob))
}

/// Cumulative success probability for `1..=max_rounds`.
///
/// # Errors
///
/// Same as [`single_round_probability`].
pub fn probability_growth(
    n: u32,
    k: u32,
    t: i64,
    max_rounds: u64,
) -> Result<Vec<GrowthPoint>, ValidationError> {
    let p1 = single_round_probability(n, k, t)?;
    Ok(growth(p1, max_rounds))
}

/// Odds bound to one set of game parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityModel {
    params: GameParameters,
    single_round: f64,
}

impl ProbabilityModel {
    /// Computes the single-round probability for `params`.
    pub fn for_game(params: &GameParameters) -> Result<Self, ValidationError> {
        params.validate()?;
        let single_round =
            single_round_probability(params.participant_count, params.range_max, params.target)?;
        Ok(Self {
            params: *params,
            single_round,
        })
    }

    /// The parameters this model describes.
    #[must_use]
    pub const fn params(&self) -> &GameParameters {
        &self.params
    }

    /// Probability of success in a single round.
    #[must_use]
    pub const fn single_round(&self) -> f64 {
        self.single_round
    }

    /// Probability of at least one success in `x` rounds.
    #[must_use]
    pub fn in_rounds(&self, x: u64) -> f64 {
        cumulative(self.single_round, x)
    }

    /// Probability of success within the game's own `max_rounds`.
    #[must_use]
    pub fn within_max_rounds(&self) -> f64 {
        self.in_rounds(u64::from(self.params.max_rounds))
    }

    /// Minimum rounds to reach `target_prob`.
    pub fn rounds_for(&self, target_prob: f64) -> Result<RoundsNeeded, ValidationError> {
        validate_target_probability(target_prob)?;
        Ok(rounds_needed(self.single_round, target_prob))
    }

    /// Cumulative success curve for `1..=max_rounds`.
    #[must_use]
    pub fn growth(&self, max_rounds: u64) -> Vec<GrowthPoint> {
        growth(self.single_round, max_rounds)
    }
}

fn validate_participants(n: u32) -> Result<(), ValidationError> {
    if n == 0 {
        return Err(ValidationError::parameter("participant_count", "must be >= 1"));
    }
    Ok(())
}

fn validate_target_probability(target_prob: f64) -> Result<(), ValidationError> {
    if !(0.0..1.0).contains(&target_prob) {
        return Err(ValidationError::parameter(
            "target_prob",
            format!("{target_prob} is not in [0, 1)"),
        ));
    }
    Ok(())
}

/// Exact `(favourable, total)` counts, or `None` on `u128` overflow.
///
/// Caller guarantees `0 <= t <= n·k`.
fn exact_count(n: u32, k: u32, t: u64) -> Option<(u128, u128)> {
    let n64 = u64::from(n);
    let width = u64::from(k) + 1;
    let total = u128::from(width).checked_pow(n)?;

    let mut positive: u128 = 0;
    let mut negative: u128 = 0;
    for i in 0..=(t / width).min(n64) {
        // i·width <= t, so the upper argument never goes negative.
        let upper = t - i * width + n64 - 1;
        let term = binomial(n64, i)?.checked_mul(binomial(upper, n64 - 1)?)?;
        if i % 2 == 0 {
            positive = positive.checked_add(term)?;
        } else {
            negative = negative.checked_add(term)?;
        }
    }
    Some((positive.checked_sub(negative)?, total))
}

/// Inclusion–exclusion over `BigInt`, for inputs where `u128` overflows.
///
/// Caller guarantees `0 <= t <= n·k`.
fn big_probability(n: u32, k: u32, t: u64) -> f64 {
    let n64 = u64::from(n);
    let width = u64::from(k) + 1;

    let mut count = BigInt::zero();
    for i in 0..=(t / width).min(n64) {
        let upper = t - i * width + n64 - 1;
        let term = big_binomial(n64, i) * big_binomial(upper, n64 - 1);
        if i % 2 == 0 {
            count += term;
        } else {
            count -= term;
        }
    }
    let total = BigInt::from(width).pow(n);

    BigRational::new(count, total)
        .to_f64()
        .filter(|p| p.is_finite())
        .map_or(0.0, |p| p.clamp(0.0, 1.0))
}

fn big_binomial(n: u64, r: u64) -> BigInt {
    if r > n {
        return BigInt::zero();
    }
    let r = r.min(n - r);
    let mut acc = BigInt::one();
    for i in 0..r {
        acc *= BigInt::from(n - i);
        acc /= BigInt::from(i + 1);
    }
    acc
}

/// `C(n, r)`, zero when `r > n`.
fn binomial(n: u64, r: u64) -> Option<u128> {
    if r > n {
        return Some(0);
    }
    let r = r.min(n - r);
    let mut acc: u128 = 1;
    for i in 0..r {
        acc = acc.checked_mul(u128::from(n - i))? / u128::from(i + 1);
    }
    Some(acc)
}

fn cumulative(p1: f64, x: u64) -> f64 {
    if x == 0 || p1 <= 0.0 {
        return 0.0;
    }
    if p1 >= 1.0 {
        return 1.0;
    }
    // 1 - (1 - p1)^x without cancellation for small p1.
    -(x as f64 * (-p1).ln_1p()).exp_m1()
}

fn rounds_needed(p1: f64, target_prob: f64) -> RoundsNeeded {
    if p1 <= 0.0 {
        return RoundsNeeded::Unreachable;
    }
    if target_prob <= 0.0 {
        return RoundsNeeded::Finite(0);
    }
    if p1 >= 1.0 {
        return RoundsNeeded::Finite(1);
    }

    let estimate = ((-target_prob).ln_1p() / (-p1).ln_1p()).ceil();
    if !estimate.is_finite() || estimate >= u64::MAX as f64 {
        return RoundsNeeded::ExceedsRange;
    }

    // The closed form can be off by one either way after rounding.
    let mut x = (estimate as u64).max(1);
    for _ in 0..64 {
        if x > 1 && cumulative(p1, x - 1) >= target_prob {
            x -= 1;
        } else {
            break;
        }
    }
    for _ in 0..64 {
        if cumulative(p1, x) < target_prob {
            match x.checked_add(1) {
                Some(next) => x = next,
                None => return RoundsNeeded::ExceedsRange,
            }
        } else {
            break;
        }
    }
    if cumulative(p1, x) < target_prob {
        return RoundsNeeded::ExceedsRange;
    }
    RoundsNeeded::Finite(x)
}

fn growth(p1: f64, max_rounds: u64) -> Vec<GrowthPoint> {
    (1..=max_rounds)
        .map(|rounds| GrowthPoint {
            rounds,
            probability: cumulative(p1, rounds),
        })
        .collect()
}
