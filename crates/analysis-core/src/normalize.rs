//! Normalization primitives shared by every scoring stage.
//!
//! Scores pass through a logistic S-curve rather than a linear clamp:
//! mid-range values stay roughly linear and values far outside a metric's
//! configured range saturate toward 0 or 1.

/// Neutral normalized score used whenever a value cannot be placed on a curve.
pub const NEUTRAL: f64 = 0.5;

/// Steepness of the logistic curve: a fraction of 0 or 1 maps to `scaled = ∓3`.
const SIGMOID_STEEPNESS: f64 = 6.0;

/// Map a linear fraction (0 = range minimum, 1 = range maximum) to [0, 1].
///
/// The fraction is not clamped beforehand. Non-finite input returns exactly
/// [`NEUTRAL`].
pub fn sigmoid(fraction: f64) -> f64 {
    if !fraction.is_finite() {
        return NEUTRAL;
    }
    let scaled = (fraction - 0.5) * SIGMOID_STEEPNESS;
    (1.0 / (1.0 + (-scaled).exp())).clamp(0.0, 1.0)
}

/// Linear position of `value` inside `[min, max]`, unclamped.
/// Returns `None` when the range is degenerate.
pub fn linear_fraction(value: f64, min: f64, max: f64) -> Option<f64> {
    let width = max - min;
    if !(width > 0.0) || !width.is_finite() {
        return None;
    }
    Some((value - min) / width)
}

/// Clamp `value` into `[low, high]` and rescale it to a [0, 1] fraction.
pub fn clamp_rescale(value: f64, low: f64, high: f64) -> f64 {
    if !(high > low) {
        return NEUTRAL;
    }
    (value.clamp(low, high) - low) / (high - low)
}

/// `ln(max(x, 0) + 1)`, used to tame heavy-tailed metrics.
pub fn log1p_floor(value: f64) -> f64 {
    value.max(0.0).ln_1p()
}

/// Compute the mean of a data slice. Returns `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Relative change from `prior` to `current`, measured against `|prior|` so a
/// shrinking loss reads as growth. `None` when `prior` is zero.
pub fn relative_change(current: f64, prior: f64) -> Option<f64> {
    if prior == 0.0 {
        return None;
    }
    let change = (current - prior) / prior.abs();
    change.is_finite().then_some(change)
}

/// `numerator / denominator` when the denominator is non-zero and the result is finite.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}
