//! Reduction of hourly readings to daily averages

use crate::models::round2;

const HOURS_PER_DAY: usize = 24;

/// Average contiguous 24-hour blocks of `hourly` into `days` values.
///
/// Only the trailing block may be short; it is averaged over the readings it
/// has. Missing readings (`None`) are skipped and a block without any reading
/// averages to 0. Results are rounded to two decimals.
#[must_use]
pub fn daily_averages(hourly: &[Option<f64>], days: usize) -> Vec<f64> {
    (0..days)
        .map(|day| {
            let start = (day * HOURS_PER_DAY).min(hourly.len());
            let end = (start + HOURS_PER_DAY).min(hourly.len());
            let readings: Vec<f64> = hourly[start..end].iter().flatten().copied().collect();
            if readings.is_empty() {
                0.0
            } else {
                round2(readings.iter().sum::<f64>() / readings.len() as f64)
            }
        })
        .collect()
}

/// Mean of `values`, `None` when empty
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
