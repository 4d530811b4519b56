// =============================================================================
// Dashboard Session: one explicit request per user action
// =============================================================================
//
// Owns the catalog and series loaders (and therefore their memo caches) for
// the lifetime of the session. Each `ChartRequest` captures every current
// input selection and runs the whole pipeline once:
//
//   catalog → instrument → series → insufficient-data check → overlays/config
//
// The insufficient-data check is the caller-side policy; the preparer itself
// never applies it.
// =============================================================================

use std::sync::Arc;

use chrono::{Local, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument as _};

use crate::catalog::{Catalog, CatalogLoader};
use crate::chart::{prepare_chart, ChartConfig, DisplayOptions, Overlays, MAV_COLORS};
use crate::error::ChartError;
use crate::provider::MarketDataProvider;
use crate::runtime_config::{DashboardConfig, DEFAULT_LOOKBACK_DAYS};
use crate::series::SeriesPreparer;
use crate::types::{Instrument, Market, PriceBar};

/// All current input selections. Omitted fields fall back to the session
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartRequest {
    pub market: Market,
    /// Display name as shown in the catalog.
    #[serde(default)]
    pub name: Option<String>,
    /// Symbol code, used when `name` is absent.
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub mavs: Option<Vec<usize>>,
    #[serde(default)]
    pub show_volume: Option<bool>,
    #[serde(default)]
    pub show_bollinger: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartResponse {
    /// `"{display name} ({symbol code})"`
    pub title: String,
    pub instrument: Instrument,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bars: Vec<PriceBar>,
    pub overlays: Overlays,
    pub config: ChartConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct MavOption {
    pub window: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MavOptions {
    pub options: Vec<MavOption>,
    pub default: Vec<usize>,
}

pub struct DashboardSession {
    config: DashboardConfig,
    catalogs: CatalogLoader,
    series: SeriesPreparer,
}

impl DashboardSession {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: DashboardConfig) -> Self {
        Self {
            catalogs: CatalogLoader::new(provider.clone()),
            series: SeriesPreparer::new(provider),
            config,
        }
    }

    /// Catalog for `market`; an empty listing is `CatalogUnavailable`.
    pub async fn catalog(&self, market: Market) -> Result<Catalog, ChartError> {
        let catalog = self.catalogs.load_catalog(market).await;
        if catalog.is_empty() {
            return Err(ChartError::CatalogUnavailable { market });
        }
        Ok(catalog)
    }

    pub fn mav_options(&self) -> MavOptions {
        MavOptions {
            options: MAV_COLORS
                .iter()
                .map(|&(window, color)| MavOption { window, color })
                .collect(),
            default: self.config.default_mavs.clone(),
        }
    }

    /// Run the full pipeline for one user action.
    pub async fn run(&self, request: ChartRequest) -> Result<ChartResponse, ChartError> {
        let request_id = uuid::Uuid::new_v4();
        let span = info_span!("chart_request", %request_id, market = %request.market);
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: ChartRequest) -> Result<ChartResponse, ChartError> {
        let catalog = self.catalog(request.market).await?;
        let instrument = resolve_instrument(&catalog, &request)?.clone();

        let today = Local::now().date_naive();
        let end = request.end.unwrap_or(today);
        let start = request
            .start
            .unwrap_or_else(|| lookback_start(today, self.config.default_lookback_days));

        let prepared = self
            .series
            .prepare_series(&instrument.symbol_code, start, end)
            .await;
        if let Some(diagnostic) = prepared.diagnostic {
            return Err(ChartError::SeriesFetchFailed {
                symbol: instrument.symbol_code,
                diagnostic,
            });
        }
        check_sufficient(&instrument.symbol_code, &prepared.bars, self.config.min_bars)?;

        let options = DisplayOptions {
            mavs: request
                .mavs
                .unwrap_or_else(|| self.config.default_mavs.clone()),
            show_volume: request
                .show_volume
                .unwrap_or(self.config.default_show_volume),
            show_bollinger: request
                .show_bollinger
                .unwrap_or(self.config.default_show_bollinger),
        };
        let (overlays, config) = prepare_chart(&prepared.bars, &options)?;

        info!(
            symbol = %instrument.symbol_code,
            bars = prepared.bars.len(),
            mavs = ?options.mavs,
            "chart prepared"
        );

        Ok(ChartResponse {
            title: format!("{} ({})", instrument.display_name, instrument.symbol_code),
            instrument,
            start,
            end,
            bars: prepared.bars,
            overlays,
            config,
        })
    }
}

/// `today` minus `days`. A negative or unrepresentable lookback falls back to
/// the default window.
fn lookback_start(today: NaiveDate, days: i64) -> NaiveDate {
    let back = |d: i64| {
        TimeDelta::try_days(d)
            .filter(|_| d >= 0)
            .and_then(|delta| today.checked_sub_signed(delta))
    };
    back(days)
        .or_else(|| {
            warn!(days, "configured lookback out of range, using default");
            back(DEFAULT_LOOKBACK_DAYS)
        })
        .unwrap_or(today)
}

/// Name first, then code, then the first listed instrument.
fn resolve_instrument<'a>(
    catalog: &'a Catalog,
    request: &ChartRequest,
) -> Result<&'a Instrument, ChartError> {
    let found = match (&request.name, &request.symbol) {
        (Some(name), _) => catalog.by_name(name),
        (None, Some(code)) => catalog.by_code(code),
        (None, None) => catalog.entries.first(),
    };
    found.ok_or_else(|| ChartError::UnknownInstrument {
        market: catalog.market,
        query: request
            .name
            .clone()
            .or_else(|| request.symbol.clone())
            .unwrap_or_default(),
    })
}

/// Caller-side policy: too few bars halts the flow.
pub fn check_sufficient(symbol: &str, bars: &[PriceBar], required: usize) -> Result<(), ChartError> {
    if bars.len() < required {
        warn!(symbol, bars = bars.len(), required, "insufficient data for chart");
        return Err(ChartError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            required,
        });
    }
    Ok(())
}
