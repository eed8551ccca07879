// SPDX-License-Identifier: Apache-2.0

use macropulse_model::{Frequency, Observation};

/// Trailing window for z-scores against recent history.
pub const Z_LOOKBACK: usize = 60;

/// Percent change over `periods` steps, measured from the end of the series.
/// None when there is not enough history or the prior value is zero.
#[must_use]
pub fn pct_change(observations: &[Observation], periods: usize) -> Option<f64> {
    if observations.len() < periods + 1 {
        return None;
    }
    let current = observations[observations.len() - 1].value;
    let previous = observations[observations.len() - 1 - periods].value;
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous.abs() * 100.0)
}

/// Year-over-year percent change at the series' native frequency.
#[must_use]
pub fn yoy_change(observations: &[Observation], frequency: Frequency) -> Option<f64> {
    pct_change(observations, frequency.yoy_periods())
}

/// How many population standard deviations the last value sits from the mean
/// of the trailing window. A flat window yields 0; fewer than five points
/// yield None.
#[must_use]
pub fn z_score_vs_history(observations: &[Observation]) -> Option<f64> {
    let start = observations.len().saturating_sub(Z_LOOKBACK);
    let window = &observations[start..];
    if window.len() < 5 {
        return None;
    }
    let n = window.len() as f64;
    let mean = window.iter().map(|o| o.value).sum::<f64>() / n;
    let variance = window.iter().map(|o| (o.value - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 {
        return Some(0.0);
    }
    let current = window[window.len() - 1].value;
    Some((current - mean) / std)
}
