// =============================================================================
// Series Preparer
// =============================================================================
//
// fetch → normalize columns → PriceBar sequence.
//
// Provider errors stop here: the caller gets an empty bar sequence plus a
// diagnostic naming the symbol. Successful non-empty results are memoized per
// (symbol, start, end).
// =============================================================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use super::normalize::{normalize_columns, to_price_bars};
use crate::memo::Memo;
use crate::provider::MarketDataProvider;
use crate::types::PriceBar;

/// Bars for one (symbol, range) request. Empty `bars` with a `diagnostic`
/// means the fetch failed; empty without one means the range had no data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreparedSeries {
    pub bars: Vec<PriceBar>,
    pub diagnostic: Option<String>,
}

impl PreparedSeries {
    pub fn failed(diagnostic: String) -> Self {
        Self {
            bars: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

type SeriesKey = (String, NaiveDate, NaiveDate);

pub struct SeriesPreparer {
    provider: Arc<dyn MarketDataProvider>,
    cache: Memo<SeriesKey, PreparedSeries>,
}

impl SeriesPreparer {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            cache: Memo::new(),
        }
    }

    pub async fn prepare_series(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PreparedSeries {
        let key = (symbol.to_string(), start, end);
        self.cache
            .get_or_load(key, || self.fetch(symbol, start, end), |s| !s.is_empty())
            .await
    }

    #[instrument(skip(self), name = "series::fetch")]
    async fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PreparedSeries {
        let mut frame = match self.provider.daily(symbol, start, end).await {
            Ok(frame) => frame,
            Err(e) => return fetch_failed(symbol, &e),
        };

        let applied = normalize_columns(&mut frame);
        if !applied.is_empty() {
            debug!(symbol, rules = ?applied, "columns normalized");
        }

        match to_price_bars(&frame) {
            Ok(bars) => {
                info!(symbol, %start, %end, bars = bars.len(), "series prepared");
                PreparedSeries {
                    bars,
                    diagnostic: None,
                }
            }
            Err(e) => fetch_failed(symbol, &e),
        }
    }
}

fn fetch_failed(symbol: &str, e: &anyhow::Error) -> PreparedSeries {
    let diagnostic = format!("data load error: {e:#}. check the symbol code: {symbol}");
    error!(symbol, error = %diagnostic, "series fetch failed");
    PreparedSeries::failed(diagnostic)
}
