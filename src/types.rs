// =============================================================================
// Shared types used across the candle dashboard
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which listing convention a market follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketFamily {
    /// Korean exchanges: listing rows carry a `Code` column.
    Domestic,
    /// US exchanges: listing rows carry a `Symbol` column.
    International,
    /// Fixed in-process table, no listing endpoint.
    Crypto,
}

/// Market / exchange selectable on the dashboard. Serialised upper-case,
/// deserialised through `FromStr` so any casing is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Krx,
    Kospi,
    Kosdaq,
    Konex,
    Nasdaq,
    Nyse,
    Amex,
    Crypto,
}

impl Default for Market {
    fn default() -> Self {
        Self::Krx
    }
}

impl Market {
    /// Every market in dashboard order.
    pub const ALL: [Market; 8] = [
        Self::Krx,
        Self::Kospi,
        Self::Kosdaq,
        Self::Konex,
        Self::Nasdaq,
        Self::Nyse,
        Self::Amex,
        Self::Crypto,
    ];

    pub fn family(self) -> MarketFamily {
        match self {
            Self::Krx | Self::Kospi | Self::Kosdaq | Self::Konex => MarketFamily::Domestic,
            Self::Nasdaq | Self::Nyse | Self::Amex => MarketFamily::International,
            Self::Crypto => MarketFamily::Crypto,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Krx => "KRX",
            Self::Kospi => "KOSPI",
            Self::Kosdaq => "KOSDAQ",
            Self::Konex => "KONEX",
            Self::Nasdaq => "NASDAQ",
            Self::Nyse => "NYSE",
            Self::Amex => "AMEX",
            Self::Crypto => "CRYPTO",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Market {
    type Err = crate::error::ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == upper)
            .ok_or(crate::error::ChartError::UnknownMarket {
                market: s.to_string(),
            })
    }
}

impl<'de> Deserialize<'de> for Market {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A tradable instrument as listed by a market catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub display_name: String,
    pub symbol_code: String,
    pub market: Market,
}

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
