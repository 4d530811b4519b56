//! In-memory provider for tests. Counts calls so cache behaviour is checkable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::{ListingFrame, MarketDataProvider, RawFrame};
use crate::types::Market;

#[derive(Default)]
pub struct FakeProvider {
    pub listings: HashMap<Market, ListingFrame>,
    pub series: HashMap<String, RawFrame>,
    pub listing_calls: AtomicUsize,
    pub daily_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, market: Market, listing: ListingFrame) -> Self {
        self.listings.insert(market, listing);
        self
    }

    pub fn with_series(mut self, symbol: &str, frame: RawFrame) -> Self {
        self.series.insert(symbol.to_string(), frame);
        self
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::Relaxed)
    }

    pub fn daily_calls(&self) -> usize {
        self.daily_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    async fn listing(&self, market: Market) -> Result<ListingFrame> {
        self.listing_calls.fetch_add(1, Ordering::Relaxed);
        match self.listings.get(&market) {
            Some(l) => Ok(l.clone()),
            None => anyhow::bail!("listing endpoint for {market} unreachable"),
        }
    }

    async fn daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame> {
        self.daily_calls.fetch_add(1, Ordering::Relaxed);
        let frame = match self.series.get(symbol) {
            Some(f) => f,
            None => anyhow::bail!("no data found for {symbol}"),
        };

        // Honour the requested window like a real endpoint would.
        let keep: Vec<usize> = frame
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start && **d <= end)
            .map(|(i, _)| i)
            .collect();
        let mut out = RawFrame::new(keep.iter().map(|&i| frame.dates[i]).collect());
        for col in &frame.columns {
            out = out.with_column(
                col.name.clone(),
                keep.iter().map(|&i| col.values[i]).collect(),
            );
        }
        Ok(out)
    }
}

/// `n` consecutive calendar days starting 2024-01-01 with closes `1..=n`.
pub fn ohlcv_frame(n: usize) -> RawFrame {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let dates = (0..n)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let closes: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    RawFrame::new(dates)
        .with_column("Open", closes.iter().map(|c| c - 0.5).collect())
        .with_column("High", closes.iter().map(|c| c + 1.0).collect())
        .with_column("Low", closes.iter().map(|c| c - 1.0).collect())
        .with_column("Close", closes.clone())
        .with_column("Volume", vec![1000.0; n])
}
