//! Lag and rolling-window statistics over an ordered series
//!
//! All functions look backwards from the end of the slice, so the last
//! element is the most recent value. Short series are handled with
//! zero-fill (lags) and partial windows (rolling statistics) instead of errors.

use statrs::statistics::Statistics;

/// The value `k` steps back from the end of the series, where `k = 1` is the
/// most recent value. Returns 0.0 when the series holds fewer than `k` values
/// or when `k` is zero.
pub fn lag(values: &[f64], k: usize) -> f64 {
    if k == 0 || values.len() < k {
        return 0.0;
    }
    values[values.len() - k]
}

/// The trailing window of at most `window` values.
pub fn tail(values: &[f64], window: usize) -> &[f64] {
    let start = values.len().saturating_sub(window);
    &values[start..]
}

/// Arithmetic mean of the last `window` values, or of all values when fewer
/// exist. Returns 0.0 for an empty series.
pub fn rolling_mean(values: &[f64], window: usize) -> f64 {
    let slice = tail(values, window);
    if slice.is_empty() {
        return 0.0;
    }
    slice.iter().sum::<f64>() / slice.len() as f64
}

/// Sample standard deviation (n - 1 denominator) of the last `window`
/// values. Returns 0.0 when fewer than two values are available.
pub fn rolling_std(values: &[f64], window: usize) -> f64 {
    let slice = tail(values, window);
    if slice.len() < 2 {
        return 0.0;
    }
    let std = slice.iter().std_dev();
    if std.is_finite() {
        std
    } else {
        0.0
    }
}
