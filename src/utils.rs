// Utility functions

/// Rounds `value` to `places` decimal digits.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Rounding for correlations, betas and ratios.
pub fn round4(value: f64) -> f64 {
    round_to(value, 4)
}

/// Rounding for volatility figures and week-over-week deltas.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Replaces NaN and infinities with 0.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
