//! Differencing and integration of time series
//!
//! ARIMA models work on the `d`-times differenced series and map forecasts
//! back to the original scale by integrating from the last observed levels.

use crate::{MathError, Result};

/// Apply first differencing `d` times
///
/// Returns an error when the series is too short to difference `d` times
/// and still leave at least one value.
pub fn difference(series: &[f64], d: usize) -> Result<Vec<f64>> {
    if series.len() <= d {
        return Err(MathError::InsufficientData(format!(
            "Cannot difference {} values {} times",
            series.len(),
            d
        )));
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }

    Ok(result)
}

/// Last value of every differencing level `0..d` of `original`
///
/// Element `k` is the last value of the series differenced `k` times. These
/// are the starting points needed to integrate forecasts back up.
pub fn integration_anchors(original: &[f64], d: usize) -> Result<Vec<f64>> {
    let mut anchors = Vec::with_capacity(d);
    for level in 0..d {
        let diffed = difference(original, level)?;
        match diffed.last() {
            Some(&last) => anchors.push(last),
            None => {
                return Err(MathError::InsufficientData(
                    "Empty series cannot anchor an integration".to_string(),
                ))
            }
        }
    }

    Ok(anchors)
}

/// Integrate forecasts made on the `d`-times differenced scale
///
/// `anchors` must come from [`integration_anchors`] on the same history.
pub fn integrate(differenced: &[f64], anchors: &[f64]) -> Vec<f64> {
    let mut result = differenced.to_vec();

    // Undo the innermost difference first
    for &anchor in anchors.iter().rev() {
        let mut level = anchor;
        result = result
            .iter()
            .map(|&delta| {
                level += delta;
                level
            })
            .collect();
    }

    result
}
