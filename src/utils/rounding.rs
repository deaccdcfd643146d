//! Rounding helpers shared by the analytics engines.
//!
//! Scores are rounded half-up (`floor(x + 0.5)`), so `-1.005 * 100` rounds toward
//! positive infinity instead of away from zero as `f64::round` would.

pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to `decimals` places with half-up semantics.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    round_half_up(value * factor) / factor
}

pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
