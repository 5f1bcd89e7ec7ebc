//! Air quality index by piecewise linear interpolation over breakpoints.

use crate::{config::AirIndexConfig, model::PollutantValues};

/// Interpolated level of `value` within `breakpoints`.
///
/// Levels are the 1-based positions of the breakpoints. Values outside the
/// table are clamped to its first or last level, and a value sitting exactly
/// on a breakpoint yields that breakpoint's level. Returns `None` for an
/// empty table.
pub fn sub_index(value: f64, breakpoints: &[f64]) -> Option<f64> {
    let last = breakpoints.len().checked_sub(1)?;

    let high = breakpoints.iter().position(|&b| b >= value).unwrap_or(last);
    let low = breakpoints.iter().rposition(|&b| b <= value).unwrap_or(0);

    let (level_low, level_high) = (breakpoints[low], breakpoints[high]);
    let (index_low, index_high) = (level(breakpoints, level_low), level(breakpoints, level_high));

    // on a breakpoint, or clamped at either end of the table
    if level_low == level_high {
        return Some(index_low);
    }

    Some(index_low + (index_high - index_low) * (value - level_low) / (level_high - level_low))
}

// Repeated breakpoints share the level of their first occurrence.
fn level(breakpoints: &[f64], breakpoint: f64) -> f64 {
    let position = breakpoints
        .iter()
        .position(|&b| b == breakpoint)
        .unwrap_or(0);

    (position + 1) as f64
}

/// The worst sub-index across the pollutants present, or `None` when no
/// pollutant with a breakpoint table has a value.
pub fn air_quality_index(values: &PollutantValues, config: &AirIndexConfig) -> Option<f64> {
    values
        .present()
        .filter_map(|(pollutant, value)| sub_index(value, config.breakpoints(pollutant)))
        .reduce(f64::max)
}

// -- Tests -------------------------------------------------------------------
