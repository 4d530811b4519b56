// =============================================================================
// HTTP Market Data Provider: public listing and daily chart endpoints
// =============================================================================
//
// Listings:
//   - KRX / KOSPI / KOSDAQ / KONEX  → KRX data portal (`OutBlock_1` rows)
//   - NASDAQ / NYSE / AMEX          → Nasdaq screener (`data.rows`)
//
// Daily bars:
//   - six-digit domestic codes      → Naver domestic chart API
//   - everything else               → Yahoo v8 chart API (`BTC/KRW` → `BTC-KRW`)
//
// All endpoints are unauthenticated. Non-success statuses are turned into
// errors carrying the status and body.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use tracing::{debug, instrument, warn};

use super::{ListingFrame, MarketDataProvider, RawFrame};
use crate::runtime_config::ProviderConfig;
use crate::types::Market;

/// Longest slice of an upstream error body carried into an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// KRX "all listed issues" report.
const KRX_LISTING_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT01901";

/// Provider backed by public venue HTTP endpoints.
#[derive(Clone)]
pub struct HttpProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpProvider {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new(config: ProviderConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        // The KRX portal rejects form posts without a portal referer.
        default_headers.insert(
            REFERER,
            HeaderValue::from_static("http://data.krx.co.kr/contents/MDC/MDI/mdiLoader"),
        );

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        debug!(
            krx = %config.krx_base_url,
            nasdaq = %config.nasdaq_base_url,
            naver = %config.naver_base_url,
            yahoo = %config.yahoo_base_url,
            "HttpProvider initialised"
        );

        Ok(Self { config, client })
    }

    // -------------------------------------------------------------------------
    // Listings
    // -------------------------------------------------------------------------

    /// POST getJsonData.cmd on the KRX data portal.
    #[instrument(skip(self), name = "provider::krx_listing")]
    async fn krx_listing(&self, market: Market) -> Result<ListingFrame> {
        let mkt_id = match market {
            Market::Kospi => "STK",
            Market::Kosdaq => "KSQ",
            Market::Konex => "KNX",
            _ => "ALL",
        };
        let url = format!(
            "{}/comm/bldAttendant/getJsonData.cmd",
            self.config.krx_base_url
        );
        let form = [
            ("bld", KRX_LISTING_BLD),
            ("locale", "ko_KR"),
            ("mktId", mkt_id),
            ("share", "1"),
            ("csvxls_isNo", "false"),
        ];

        let body = self
            .send_json(self.client.post(&url).form(&form), "POST getJsonData.cmd")
            .await?;
        let listing = parse_krx_listing(&body)?;

        debug!(%market, count = listing.len(), "KRX listing fetched");
        Ok(listing)
    }

    /// GET /api/screener/stocks on the Nasdaq API.
    #[instrument(skip(self), name = "provider::nasdaq_listing")]
    async fn nasdaq_listing(&self, market: Market) -> Result<ListingFrame> {
        let exchange = market.as_str().to_lowercase();
        let url = format!(
            "{}/api/screener/stocks?tableonly=true&download=true&exchange={}",
            self.config.nasdaq_base_url, exchange
        );

        let body = self
            .send_json(self.client.get(&url), "GET /api/screener/stocks")
            .await?;
        let listing = parse_nasdaq_listing(&body)?;

        debug!(%market, count = listing.len(), "Nasdaq screener listing fetched");
        Ok(listing)
    }

    // -------------------------------------------------------------------------
    // Daily series
    // -------------------------------------------------------------------------

    /// GET /chart/domestic/item/{code}/day on the Naver stock API.
    #[instrument(skip(self), name = "provider::naver_daily")]
    async fn naver_daily(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame> {
        let url = format!(
            "{}/chart/domestic/item/{}/day?startDateTime={}0000&endDateTime={}2359",
            self.config.naver_base_url,
            code,
            start.format("%Y%m%d"),
            end.format("%Y%m%d")
        );

        let body = self
            .send_json(self.client.get(&url), "GET /chart/domestic/item/day")
            .await?;
        let frame = parse_naver_daily(&body)?;

        debug!(code, rows = frame.len(), "Naver daily series fetched");
        Ok(frame)
    }

    /// GET /v8/finance/chart/{symbol} on the Yahoo chart API.
    #[instrument(skip(self), name = "provider::yahoo_daily")]
    async fn yahoo_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame> {
        let ticker = yahoo_ticker(symbol);
        let period1 = day_start_epoch(start);
        let period2 = day_start_epoch(end.succ_opt().unwrap_or(end));
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.config.yahoo_base_url, ticker, period1, period2
        );

        let body = self
            .send_json(self.client.get(&url), "GET /v8/finance/chart")
            .await?;
        let frame = parse_yahoo_chart(&body)?;

        debug!(symbol, ticker = %ticker, rows = frame.len(), "Yahoo daily series fetched");
        Ok(frame)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
        label: &str,
    ) -> Result<serde_json::Value> {
        let resp = request
            .send()
            .await
            .with_context(|| format!("{label} request failed"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .with_context(|| format!("failed to read {label} response"))?;

        if !status.is_success() {
            anyhow::bail!("{label} returned {status}: {}", error_snippet(&text));
        }

        serde_json::from_str(&text).with_context(|| format!("failed to parse {label} response"))
    }
}

#[async_trait]
impl MarketDataProvider for HttpProvider {
    async fn listing(&self, market: Market) -> Result<ListingFrame> {
        match market {
            Market::Krx | Market::Kospi | Market::Kosdaq | Market::Konex => {
                self.krx_listing(market).await
            }
            Market::Nasdaq | Market::Nyse | Market::Amex => self.nasdaq_listing(market).await,
            Market::Crypto => anyhow::bail!("{market} has no listing endpoint"),
        }
    }

    async fn daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame> {
        if is_domestic_code(symbol) {
            self.naver_daily(symbol, start, end).await
        } else {
            self.yahoo_daily(symbol, start, end).await
        }
    }
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("config", &self.config)
            .finish()
    }
}

// =============================================================================
// Response parsing (pure, unit-tested)
// =============================================================================

/// Six ASCII digits, e.g. `005930`.
fn is_domestic_code(symbol: &str) -> bool {
    symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit())
}

/// Yahoo spells currency pairs with a dash.
fn yahoo_ticker(symbol: &str) -> String {
    symbol.trim().replace('/', "-")
}

fn day_start_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
        .unwrap_or_default()
}

/// First `ERROR_BODY_LIMIT` chars of an upstream body, whitespace collapsed.
fn error_snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

/// Accept a JSON number or a numeric string (`"1,234"` included). Anything
/// else becomes `NaN` so the row is dropped later.
fn json_f64(val: &serde_json::Value) -> f64 {
    match val {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.replace(',', "").trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn parse_krx_listing(body: &serde_json::Value) -> Result<ListingFrame> {
    let rows = body["OutBlock_1"]
        .as_array()
        .context("KRX response missing 'OutBlock_1' array")?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(code), Some(name)) = (row["ISU_SRT_CD"].as_str(), row["ISU_ABBRV"].as_str())
        else {
            warn!("skipping KRX listing row without code/name");
            continue;
        };
        out.push(vec![("Code", code.trim()), ("Name", name.trim())]);
    }
    Ok(ListingFrame::from_rows(out))
}

fn parse_nasdaq_listing(body: &serde_json::Value) -> Result<ListingFrame> {
    let rows = body["data"]["rows"]
        .as_array()
        .context("Nasdaq response missing 'data.rows' array")?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(symbol), Some(name)) = (row["symbol"].as_str(), row["name"].as_str()) else {
            warn!("skipping Nasdaq listing row without symbol/name");
            continue;
        };
        out.push(vec![("Symbol", symbol.trim()), ("Name", name.trim())]);
    }
    Ok(ListingFrame::from_rows(out))
}

fn parse_naver_daily(body: &serde_json::Value) -> Result<RawFrame> {
    let rows = body.as_array().context("Naver response is not an array")?;

    let mut dates = Vec::with_capacity(rows.len());
    let (mut open, mut high, mut low, mut close, mut volume, mut change) =
        (vec![], vec![], vec![], vec![], vec![], vec![]);
    let mut has_change = false;

    for row in rows {
        let Some(raw_date) = row["localDate"].as_str() else {
            warn!("skipping Naver row without localDate");
            continue;
        };
        let date = NaiveDate::parse_from_str(raw_date, "%Y%m%d")
            .with_context(|| format!("failed to parse Naver date '{raw_date}'"))?;

        dates.push(date);
        open.push(json_f64(&row["openPrice"]));
        high.push(json_f64(&row["highPrice"]));
        low.push(json_f64(&row["lowPrice"]));
        close.push(json_f64(&row["closePrice"]));
        volume.push(json_f64(&row["accumulatedTradingVolume"]));
        // Percent on the wire; the frame keeps a fraction.
        let pct = json_f64(&row["fluctuationsRatio"]);
        has_change |= pct.is_finite();
        change.push(pct / 100.0);
    }

    let mut frame = RawFrame::new(dates)
        .with_column("Open", open)
        .with_column("High", high)
        .with_column("Low", low)
        .with_column("Close", close)
        .with_column("Volume", volume);
    if has_change {
        frame = frame.with_column("Change", change);
    }
    Ok(frame)
}

fn parse_yahoo_chart(body: &serde_json::Value) -> Result<RawFrame> {
    let chart = &body["chart"];
    if !chart["error"].is_null() {
        anyhow::bail!("Yahoo chart error: {}", chart["error"]);
    }

    let result = chart["result"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("Yahoo response missing 'chart.result'")?;

    // No trading days in the window: Yahoo omits the timestamp array.
    let Some(timestamps) = result["timestamp"].as_array() else {
        return Ok(RawFrame::default());
    };

    let gmt_offset = result["meta"]["gmtoffset"].as_i64().unwrap_or(0);
    let dates = timestamps
        .iter()
        .map(|ts| {
            let secs = ts.as_i64().context("non-integer Yahoo timestamp")? + gmt_offset;
            Utc.timestamp_opt(secs, 0)
                .single()
                .map(|dt| dt.date_naive())
                .with_context(|| format!("Yahoo timestamp {secs} out of range"))
        })
        .collect::<Result<Vec<_>>>()?;

    let quote = &result["indicators"]["quote"][0];
    let series = |v: &serde_json::Value| -> Vec<f64> {
        v.as_array()
            .map(|arr| arr.iter().map(json_f64).collect())
            .unwrap_or_default()
    };

    let mut frame = RawFrame::new(dates)
        .with_column("Open", series(&quote["open"]))
        .with_column("High", series(&quote["high"]))
        .with_column("Low", series(&quote["low"]))
        .with_column("Close", series(&quote["close"]))
        .with_column("Volume", series(&quote["volume"]));

    let adj = &result["indicators"]["adjclose"][0]["adjclose"];
    if adj.is_array() {
        frame = frame.with_column("Adj Close", series(adj));
    }
    Ok(frame)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_is_truncated() {
        let page = format!("<html>\n  <body>{}</body>\n</html>", "오류".repeat(500));
        let snippet = error_snippet(&page);
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), ERROR_BODY_LIMIT + 3);
        assert!(snippet.starts_with("<html> <body>"));

        assert_eq!(error_snippet("  Not   Found \n"), "Not Found");
    }

    #[test]
    fn domestic_code_detection() {
        assert!(is_domestic_code("005930"));
        assert!(!is_domestic_code("AAPL"));
        assert!(!is_domestic_code("BTC/KRW"));
        assert!(!is_domestic_code("0059301"));
    }

    #[test]
    fn yahoo_ticker_rewrites_pairs() {
        assert_eq!(yahoo_ticker("BTC/KRW"), "BTC-KRW");
        assert_eq!(yahoo_ticker("AAPL"), "AAPL");
    }

    #[test]
    fn json_f64_accepts_strings_and_numbers() {
        assert_eq!(json_f64(&serde_json::json!(12.5)), 12.5);
        assert_eq!(json_f64(&serde_json::json!("1,234")), 1234.0);
        assert!(json_f64(&serde_json::Value::Null).is_nan());
    }

    #[test]
    fn krx_listing_maps_to_code_and_name() {
        let body = serde_json::json!({
            "OutBlock_1": [
                { "ISU_SRT_CD": "005930", "ISU_ABBRV": "삼성전자", "MKT_TP_NM": "KOSPI" },
                { "ISU_SRT_CD": "035720", "ISU_ABBRV": "카카오" },
                { "ISU_ABBRV": "broken" }
            ]
        });
        let listing = parse_krx_listing(&body).unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.rows[0]["Code"], "005930");
        assert_eq!(listing.rows[1]["Name"], "카카오");
    }

    #[test]
    fn nasdaq_listing_maps_to_symbol_and_name() {
        let body = serde_json::json!({
            "data": { "rows": [ { "symbol": "AAPL ", "name": "Apple Inc. Common Stock" } ] }
        });
        let listing = parse_nasdaq_listing(&body).unwrap();
        assert_eq!(listing.rows[0]["Symbol"], "AAPL");
        assert!(!listing.rows[0].contains_key("Code"));
    }

    #[test]
    fn nasdaq_listing_missing_rows_is_error() {
        assert!(parse_nasdaq_listing(&serde_json::json!({ "data": null })).is_err());
    }

    #[test]
    fn naver_daily_parses_rows() {
        let body = serde_json::json!([
            { "localDate": "20240102", "openPrice": 78200, "highPrice": 79800, "lowPrice": 78200,
              "closePrice": 79600, "accumulatedTradingVolume": 17142847, "fluctuationsRatio": 1.02 },
            { "localDate": "20240103", "openPrice": 78500, "highPrice": 78800, "lowPrice": 77000,
              "closePrice": 77000, "accumulatedTradingVolume": 21753644, "fluctuationsRatio": -3.27 }
        ]);
        let frame = parse_naver_daily(&body).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.dates[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(frame.column("Close").unwrap(), &[79600.0, 77000.0]);
        assert!((frame.column("Change").unwrap()[0] - 0.0102).abs() < 1e-12);
    }

    #[test]
    fn yahoo_chart_parses_quote_and_adjclose() {
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": -18000 },
                    "timestamp": [1704205800, 1704292200],
                    "indicators": {
                        "quote": [{
                            "open": [187.15, 184.22],
                            "high": [188.44, 185.88],
                            "low": [183.89, 183.43],
                            "close": [185.64, null],
                            "volume": [82488700, 58414500]
                        }],
                        "adjclose": [{ "adjclose": [184.9, 183.5] }]
                    }
                }],
                "error": null
            }
        });
        let frame = parse_yahoo_chart(&body).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.dates[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!(frame.column("Close").unwrap()[1].is_nan());
        assert!(frame.has_column("Adj Close"));
    }

    #[test]
    fn yahoo_chart_error_is_reported() {
        let body = serde_json::json!({
            "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found" } }
        });
        let err = parse_yahoo_chart(&body).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn yahoo_chart_without_timestamps_is_empty() {
        let body = serde_json::json!({
            "chart": { "result": [{ "meta": {}, "indicators": { "quote": [{}] } }], "error": null }
        });
        assert_eq!(parse_yahoo_chart(&body).unwrap().len(), 0);
    }
}
