// =============================================================================
// Catalog Loader
// =============================================================================
//
// Resolves a market to its instruments (display name → symbol code).
//
//   Domestic       provider listing, `Code` + `Name` columns
//   International  provider listing, `Symbol` + `Name` columns
//   Crypto         fixed six-pair table across Bithumb and Bitfinex
//
// Failures never escape: a provider error or empty listing yields an empty
// catalog and an error log line. Non-empty catalogs are memoized per market.
// =============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::memo::Memo;
use crate::provider::{ListingFrame, MarketDataProvider};
use crate::types::{Instrument, Market, MarketFamily};

/// Crypto pairs kept as literal data: (display name, code).
const CRYPTO_PAIRS: [(&str, &str); 6] = [
    ("비트코인/빗썸", "BTC/KRW"),
    ("이더리움/빗썸", "ETH/KRW"),
    ("리플/빗썸", "XRP/KRW"),
    ("비트코인/Bitfinex", "BTC/USD"),
    ("이더리움/Bitfinex", "ETH/USD"),
    ("리플/Bitfinex", "XRP/USD"),
];

/// Instruments of one market, unique by display name, in listing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub market: Market,
    pub entries: Vec<Instrument>,
}

impl Catalog {
    pub fn empty(market: Market) -> Self {
        Self {
            market,
            entries: Vec::new(),
        }
    }

    /// Build from (name, code) pairs. Later duplicates of a display name and
    /// rows with a blank name or code are skipped.
    pub fn from_pairs<I, N, C>(market: Market, pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (name, code) in pairs {
            let (name, code) = (name.into(), code.into());
            if name.is_empty() || code.is_empty() {
                continue;
            }
            if !seen.insert(name.clone()) {
                debug!(%market, name = %name, "duplicate display name ignored");
                continue;
            }
            entries.push(Instrument {
                display_name: name,
                symbol_code: code,
                market,
            });
        }
        Self { market, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_name(&self, display_name: &str) -> Option<&Instrument> {
        self.entries.iter().find(|i| i.display_name == display_name)
    }

    pub fn by_code(&self, symbol_code: &str) -> Option<&Instrument> {
        self.entries.iter().find(|i| i.symbol_code == symbol_code)
    }
}

/// The fixed crypto table.
pub fn crypto_catalog() -> Catalog {
    Catalog::from_pairs(Market::Crypto, CRYPTO_PAIRS)
}

/// Pick the (name, code) columns for the market's listing convention.
fn catalog_from_listing(market: Market, listing: &ListingFrame) -> Catalog {
    let code_field = match market.family() {
        MarketFamily::International => "Symbol",
        _ => "Code",
    };

    let pairs = listing.rows.iter().filter_map(|row| {
        let name = row.get("Name")?.trim();
        let code = row.get(code_field)?.trim();
        Some((name.to_string(), code.to_string()))
    });
    Catalog::from_pairs(market, pairs)
}

// =============================================================================
// CatalogLoader
// =============================================================================

pub struct CatalogLoader {
    provider: Arc<dyn MarketDataProvider>,
    cache: Memo<Market, Catalog>,
}

impl CatalogLoader {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            cache: Memo::new(),
        }
    }

    /// Instruments for `market`. Empty means the listing is unavailable.
    pub async fn load_catalog(&self, market: Market) -> Catalog {
        self.cache
            .get_or_load(market, || self.fetch(market), |c| !c.is_empty())
            .await
    }

    async fn fetch(&self, market: Market) -> Catalog {
        if market.family() == MarketFamily::Crypto {
            return crypto_catalog();
        }

        match self.provider.listing(market).await {
            Ok(listing) => {
                let catalog = catalog_from_listing(market, &listing);
                if catalog.is_empty() {
                    warn!(%market, rows = listing.len(), "listing returned no usable instruments");
                } else {
                    info!(%market, count = catalog.len(), "catalog loaded");
                }
                catalog
            }
            Err(e) => {
                let reason = format!("{e:#}");
                error!(%market, error = %reason, "catalog listing failed");
                Catalog::empty(market)
            }
        }
    }
}
