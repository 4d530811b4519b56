// =============================================================================
// Chart pipeline error taxonomy
// =============================================================================
//
// The two data-fetch boundaries (catalog, series) never return these; they
// hand back an empty result plus a diagnostic. The session turns those empty
// results into a `ChartError` so the API layer can stop the flow and report.
// =============================================================================

use crate::types::Market;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    /// Request body could not be decoded.
    InvalidRequest { reason: String },
    /// Market identifier outside the supported set.
    UnknownMarket { market: String },
    /// Listing call failed or returned no rows.
    CatalogUnavailable { market: Market },
    /// Neither the display name nor the symbol code is in the catalog.
    UnknownInstrument { market: Market, query: String },
    /// MAV window outside {5, 10, 20, 30, 60, 120}.
    InvalidMavWindow { window: usize },
    /// Provider data call failed; `diagnostic` names the symbol.
    SeriesFetchFailed { symbol: String, diagnostic: String },
    /// Fetch succeeded but returned too few bars to chart.
    InsufficientData {
        symbol: String,
        bars: usize,
        required: usize,
    },
}

impl ChartError {
    /// Stable machine-readable tag for API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::UnknownMarket { .. } => "unknown_market",
            Self::CatalogUnavailable { .. } => "catalog_unavailable",
            Self::UnknownInstrument { .. } => "unknown_instrument",
            Self::InvalidMavWindow { .. } => "invalid_mav_window",
            Self::SeriesFetchFailed { .. } => "series_fetch_failed",
            Self::InsufficientData { .. } => "insufficient_data",
        }
    }
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::UnknownMarket { market } => write!(f, "unknown market '{market}'"),
            Self::CatalogUnavailable { market } => {
                write!(f, "instrument listing for {market} is unavailable")
            }
            Self::UnknownInstrument { market, query } => {
                write!(f, "'{query}' is not listed on {market}")
            }
            Self::InvalidMavWindow { window } => {
                write!(f, "unsupported moving-average window {window}")
            }
            Self::SeriesFetchFailed { diagnostic, .. } => f.write_str(diagnostic),
            Self::InsufficientData {
                symbol,
                bars,
                required,
            } => write!(
                f,
                "not enough data for {symbol} in the selected period: {bars} bars, need at least {required}"
            ),
        }
    }
}

impl std::error::Error for ChartError {}
