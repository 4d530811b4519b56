// =============================================================================
// Simple Moving Average (SMA) and rolling standard deviation
// =============================================================================
//
// Trailing-window statistics aligned 1:1 with the input:
//   out[i] = None                        for i < period - 1
//   out[i] = f(values[i+1-period ..= i]) otherwise
//
// A window that contains a non-finite value yields `None` at that position.
// =============================================================================

/// Trailing arithmetic mean over `period` values.
///
/// Output length always equals `values.len()`. `period == 0` yields all `None`.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |window| {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    })
}

/// Trailing sample standard deviation (Bessel's correction, `n - 1`).
///
/// A window of one value has no sample deviation, so `period < 2` yields all
/// `None`.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; values.len()];
    }
    rolling(values, period, |window| {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    })
}

fn rolling<F>(values: &[f64], period: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    for end in period - 1..values.len() {
        let window = &values[end + 1 - period..=end];
        if window.iter().all(|v| v.is_finite()) {
            out[end] = stat(window).filter(|v| v.is_finite());
        }
    }
    out
}
