// =============================================================================
// Column normalization and frame → bar conversion
// =============================================================================
//
// Rules, applied in order, each a no-op when its column is absent:
//   1. drop `Change`       (pre-computed pct change, unused)
//   2. drop `Adj Close`    (unadjusted `Close` is canonical)
//   3. `Volume_USDT` → `Volume` (quote-currency volume; one volume survives)
//
// Re-applying the rules to a normalized frame changes nothing.
// =============================================================================

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::debug;

use crate::provider::RawFrame;
use crate::types::PriceBar;

pub const CHANGE: &str = "Change";
pub const ADJ_CLOSE: &str = "Adj Close";
pub const QUOTE_VOLUME: &str = "Volume_USDT";
pub const VOLUME: &str = "Volume";

/// Apply the three normalization rules in place. Returns the names of the
/// rules that changed something.
pub fn normalize_columns(frame: &mut RawFrame) -> Vec<&'static str> {
    let mut applied = Vec::new();
    if frame.drop_column(CHANGE) {
        applied.push("drop_change");
    }
    if frame.drop_column(ADJ_CLOSE) {
        applied.push("drop_adj_close");
    }
    if frame.rename_column(QUOTE_VOLUME, VOLUME) {
        applied.push("rename_quote_volume");
    }
    applied
}

/// Turn a normalized frame into bars sorted strictly ascending by date.
///
/// - duplicate dates keep the last row
/// - rows with a non-finite open/high/low/close are dropped
/// - volume is rounded and clamped at zero; a missing column means zero
pub fn to_price_bars(frame: &RawFrame) -> Result<Vec<PriceBar>> {
    let open = frame.column("Open").context("series has no 'Open' column")?;
    let high = frame.column("High").context("series has no 'High' column")?;
    let low = frame.column("Low").context("series has no 'Low' column")?;
    let close = frame.column("Close").context("series has no 'Close' column")?;
    let volume = frame.column(VOLUME);

    let mut by_date: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();
    let mut dropped = 0usize;

    for (i, &date) in frame.dates.iter().enumerate() {
        let (o, h, l, c) = (open[i], high[i], low[i], close[i]);
        if !(o.is_finite() && h.is_finite() && l.is_finite() && c.is_finite()) {
            dropped += 1;
            continue;
        }
        let v = volume
            .map(|col| col[i])
            .filter(|v| v.is_finite())
            .map_or(0, |v| v.max(0.0).round() as u64);

        by_date.insert(
            date,
            PriceBar {
                date,
                open: o,
                high: h,
                low: l,
                close: c,
                volume: v,
            },
        );
    }

    if dropped > 0 {
        debug!(dropped, "rows with missing prices dropped");
    }
    Ok(by_date.into_values().collect())
}
