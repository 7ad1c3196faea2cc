//! Upstream temperature conversion
//!
//! The upstream API reports Kelvin when no `units` parameter is sent.

/// Offset between Kelvin and Celsius
const KELVIN_OFFSET: f64 = 273.15;

/// Convert an upstream (Kelvin) temperature to Celsius, rounded to two decimals
pub fn to_celsius(kelvin: f64) -> f64 {
    round2(kelvin - KELVIN_OFFSET)
}

/// Round to two decimals, ties to even
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
