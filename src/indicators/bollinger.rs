// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the rolling *sample* standard
// deviation (n - 1 denominator). The dashboard always uses 20 periods and
// k = 2.
// =============================================================================

use serde::Serialize;

use super::sma::{rolling_mean, rolling_std};

pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_NUM_STD: f64 = 2.0;

/// Band series aligned 1:1 with the input closes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerBands {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate the full band series for `closes`.
///
/// Positions before `period - 1` are `None` in all three bands.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let middle = rolling_mean(closes, period);
    let std_dev = rolling_std(closes, period);

    let offset = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&std_dev)
            .map(|(m, s)| Some((*m)? + sign * num_std * (*s)?))
            .collect()
    };
    let upper = offset(1.0);
    let lower = offset(-1.0);

    BollingerBands {
        middle,
        upper,
        lower,
    }
}

/// The dashboard's 20-period, 2σ bands.
pub fn standard_bollinger(closes: &[f64]) -> BollingerBands {
    calculate_bollinger(closes, BOLLINGER_PERIOD, BOLLINGER_NUM_STD)
}
