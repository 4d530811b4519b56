// =============================================================================
// Market Data Provider
// =============================================================================
//
// The seam between the dashboard core and whatever serves listings and daily
// bars. `HttpProvider` talks to the public venue endpoints; tests use the
// in-memory `fake::FakeProvider`.

pub mod client;
pub mod frame;

#[cfg(test)]
pub mod fake;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::Market;

pub use client::HttpProvider;
pub use frame::{ListingFrame, RawFrame};

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Instrument listing for an exchange-backed market.
    async fn listing(&self, market: Market) -> Result<ListingFrame>;

    /// Daily bars for `symbol` over the inclusive range `[start, end]`.
    async fn daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame>;
}
