//! Minkowski distance of order p between two weighted vectors.
//!
//! d(x, y) = (Σ |x_i − y_i|^p)^(1/p)
//!
//! The power sum is accumulated in f64. The root is taken in 96-bit decimal
//! arithmetic (`rust_decimal`) and rounded half-to-even to
//! [`DISTANCE_DECIMALS`] places, so p=2 on a 3-4-5 triangle yields exactly
//! `5.000` rather than `4.999999…`. Sums beyond the decimal range fall back to
//! f64 `powf` with the same rounding.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use crate::constants::DISTANCE_DECIMALS;
use crate::error::{Result, ScoreError};

/// Minkowski distance between `x` and `y`, rounded to three decimals.
///
/// Fails on empty input, on differing lengths, and on a non-positive or
/// non-finite order.
pub fn minkowski_distance(x: &[f64], y: &[f64], p: f64) -> Result<f64> {
    if !p.is_finite() || p <= 0.0 {
        return Err(ScoreError::InvalidOrder(p));
    }
    if x.len() != y.len() {
        return Err(ScoreError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if x.is_empty() {
        return Err(ScoreError::EmptyVectors);
    }

    let sum: f64 = if p == 1.0 {
        x.iter().zip(y).map(|(a, b)| (a - b).abs()).sum()
    } else {
        x.iter().zip(y).map(|(a, b)| (a - b).abs().powf(p)).sum()
    };
    Ok(p_root(sum, p))
}

/// `value^(1/p)` rounded to [`DISTANCE_DECIMALS`] places.
pub fn p_root(value: f64, p: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    if let Some(root) = decimal_root(value, p) {
        let rounded =
            root.round_dp_with_strategy(DISTANCE_DECIMALS, RoundingStrategy::MidpointNearestEven);
        // Parsing the decimal text yields the f64 nearest to the rounded value.
        if let Ok(v) = rounded.to_string().parse::<f64>() {
            return v;
        }
    }
    tracing::debug!(value, p, "power sum outside decimal range, using f64 root");
    round_f64(value.powf(1.0 / p))
}

fn decimal_root(value: f64, p: f64) -> Option<Decimal> {
    let base = Decimal::from_f64_retain(value)?;
    if p == 1.0 {
        return Some(base);
    }
    if p == 2.0 {
        return base.sqrt();
    }
    let exponent = Decimal::ONE.checked_div(Decimal::from_f64(p)?)?;
    base.checked_powd(exponent)
}

fn round_f64(v: f64) -> f64 {
    let scale = 10f64.powi(DISTANCE_DECIMALS as i32);
    (v * scale).round_ties_even() / scale
}
