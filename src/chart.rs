// =============================================================================
// Chart overlays and rendering configuration
// =============================================================================
//
// Given validated bars and the user's display options:
//   - one SMA overlay per selected MAV window (ascending, fixed colors)
//   - the 20-period / 2σ Bollinger apparatus, always computed
//   - a ChartConfig naming what the renderer should draw
//
// The ChartConfig is the whole contract with the renderer: candles, optional
// volume panel, optional overlay lines.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::indicators::bollinger::{standard_bollinger, BollingerBands};
use crate::indicators::sma::rolling_mean;
use crate::types::PriceBar;

/// Selectable MAV windows and their fixed display colors.
pub const MAV_COLORS: [(usize, &str); 6] = [
    (5, "red"),
    (10, "green"),
    (20, "blue"),
    (30, "purple"),
    (60, "orange"),
    (120, "brown"),
];

pub const CANDLE_UP_COLOR: &str = "red";
pub const CANDLE_DOWN_COLOR: &str = "blue";
const BAND_EDGE_COLOR: &str = "blue";
const BAND_MIDDLE_COLOR: &str = "orange";

pub fn mav_color(window: usize) -> Option<&'static str> {
    MAV_COLORS
        .iter()
        .find(|(w, _)| *w == window)
        .map(|(_, c)| *c)
}

/// Sort ascending and deduplicate so color and legend order never depend on
/// click order. Unsupported windows are rejected.
pub fn sort_mav_selection(windows: &[usize]) -> Result<Vec<usize>, ChartError> {
    if let Some(&bad) = windows.iter().find(|w| mav_color(**w).is_none()) {
        return Err(ChartError::InvalidMavWindow { window: bad });
    }
    let mut sorted = windows.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    Ok(sorted)
}

// =============================================================================
// Overlay series
// =============================================================================

/// A named series aligned 1:1 with the bars; `None` where undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Everything derived from the bars for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlays {
    /// One per selected window, ascending.
    pub mavs: Vec<OverlaySeries>,
    /// Computed whether or not it is displayed.
    pub bollinger: BollingerBands,
}

/// `windows` must already be sorted (see [`sort_mav_selection`]).
pub fn derive_overlays(bars: &[PriceBar], windows: &[usize]) -> Overlays {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let mavs = windows
        .iter()
        .map(|&w| OverlaySeries {
            name: format!("MA{w}"),
            values: rolling_mean(&closes, w),
        })
        .collect();

    Overlays {
        mavs,
        bollinger: standard_bollinger(&closes),
    }
}

// =============================================================================
// ChartConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MavOverlay {
    pub window: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledLine {
    pub series: OverlaySeries,
    pub color: &'static str,
    pub dashed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerLines {
    pub upper: StyledLine,
    pub middle: StyledLine,
    pub lower: StyledLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleColors {
    pub up: &'static str,
    pub down: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub overlays: Vec<MavOverlay>,
    pub bollinger: Option<BollingerLines>,
    pub show_volume: bool,
    pub candle_colors: CandleColors,
    pub legend: Vec<LegendEntry>,
}

/// User-facing toggles for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub mavs: Vec<usize>,
    pub show_volume: bool,
    pub show_bollinger: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            mavs: vec![5, 10, 20],
            show_volume: true,
            show_bollinger: true,
        }
    }
}

fn dashed(name: &str, values: &[Option<f64>], color: &'static str) -> StyledLine {
    StyledLine {
        series: OverlaySeries {
            name: name.to_string(),
            values: values.to_vec(),
        },
        color,
        dashed: true,
    }
}

/// `windows` must already be sorted (see [`sort_mav_selection`]).
pub fn build_chart_config(
    windows: &[usize],
    bands: &BollingerBands,
    show_volume: bool,
    show_bollinger: bool,
) -> ChartConfig {
    let overlays: Vec<MavOverlay> = windows
        .iter()
        .filter_map(|&w| mav_color(w).map(|color| MavOverlay { window: w, color }))
        .collect();

    let legend = overlays
        .iter()
        .map(|o| LegendEntry {
            label: format!("{}일 MAV", o.window),
            color: o.color,
        })
        .collect();

    let bollinger = show_bollinger.then(|| BollingerLines {
        upper: dashed("Upper", &bands.upper, BAND_EDGE_COLOR),
        middle: dashed("MB", &bands.middle, BAND_MIDDLE_COLOR),
        lower: dashed("Lower", &bands.lower, BAND_EDGE_COLOR),
    });

    ChartConfig {
        overlays,
        bollinger,
        show_volume,
        candle_colors: CandleColors {
            up: CANDLE_UP_COLOR,
            down: CANDLE_DOWN_COLOR,
        },
        legend,
    }
}

/// Overlays plus config for validated bars.
pub fn prepare_chart(
    bars: &[PriceBar],
    options: &DisplayOptions,
) -> Result<(Overlays, ChartConfig), ChartError> {
    let windows = sort_mav_selection(&options.mavs)?;
    let overlays = derive_overlays(bars, &windows);
    let config = build_chart_config(
        &windows,
        &overlays.bollinger,
        options.show_volume,
        options.show_bollinger,
    );
    Ok((overlays, config))
}
