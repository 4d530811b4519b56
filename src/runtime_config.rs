// =============================================================================
// Runtime Configuration: dashboard settings loaded from JSON
// =============================================================================
//
// Every field carries a serde default so an empty or partial JSON file still
// loads. Environment variables override the file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_krx_base_url() -> String {
    "http://data.krx.co.kr".to_string()
}

fn default_nasdaq_base_url() -> String {
    "https://api.nasdaq.com".to_string()
}

fn default_naver_base_url() -> String {
    "https://api.stock.naver.com".to_string()
}

fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) candle-dashboard/1.0".to_string()
}

pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;

fn default_lookback_days() -> i64 {
    DEFAULT_LOOKBACK_DAYS
}

fn default_mavs() -> Vec<usize> {
    vec![5, 10, 20]
}

fn default_min_bars() -> usize {
    5
}

// =============================================================================
// ProviderConfig
// =============================================================================

/// Endpoints and HTTP settings for the market data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_krx_base_url")]
    pub krx_base_url: String,

    #[serde(default = "default_nasdaq_base_url")]
    pub nasdaq_base_url: String,

    #[serde(default = "default_naver_base_url")]
    pub naver_base_url: String,

    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    /// Per-request timeout. The only timeout in the pipeline.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Nasdaq and Yahoo refuse requests without a browser-like agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            krx_base_url: default_krx_base_url(),
            nasdaq_base_url: default_nasdaq_base_url(),
            naver_base_url: default_naver_base_url(),
            yahoo_base_url: default_yahoo_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

// =============================================================================
// DashboardConfig
// =============================================================================

/// Top-level configuration for the dashboard backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address the REST API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub provider: ProviderConfig,

    // --- Request defaults ---------------------------------------------------

    /// Start date default: today minus this many days.
    #[serde(default = "default_lookback_days")]
    pub default_lookback_days: i64,

    /// MAV windows selected when a request names none.
    #[serde(default = "default_mavs")]
    pub default_mavs: Vec<usize>,

    #[serde(default = "default_true")]
    pub default_show_volume: bool,

    #[serde(default = "default_true")]
    pub default_show_bollinger: bool,

    // --- Validation ---------------------------------------------------------

    /// Fewer bars than this halts the chart flow.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            provider: ProviderConfig::default(),
            default_lookback_days: default_lookback_days(),
            default_mavs: default_mavs(),
            default_show_volume: true,
            default_show_bollinger: true,
            min_bars: default_min_bars(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error; the caller falls back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dashboard config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dashboard config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            min_bars = config.min_bars,
            "dashboard config loaded"
        );

        Ok(config)
    }

    /// Apply `DASHBOARD_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("DASHBOARD_BIND_ADDR") {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
        if let Some(secs) = std::env::var("DASHBOARD_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            self.provider.timeout_secs = secs;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
        assert_eq!(cfg.default_lookback_days, 90);
        assert_eq!(cfg.default_mavs, vec![5, 10, 20]);
        assert!(cfg.default_show_volume);
        assert!(cfg.default_show_bollinger);
        assert_eq!(cfg.min_bars, 5);
        assert_eq!(cfg.provider.timeout_secs, 10);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: DashboardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.min_bars, 5);
        assert_eq!(cfg.provider.yahoo_base_url, "https://query1.finance.yahoo.com");
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "default_mavs": [20, 60], "provider": { "timeout_secs": 3 } }"#;
        let cfg: DashboardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.default_mavs, vec![20, 60]);
        assert_eq!(cfg.provider.timeout_secs, 3);
        assert_eq!(cfg.provider.krx_base_url, "http://data.krx.co.kr");
        assert!(cfg.default_show_bollinger);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = std::env::temp_dir().join(format!("dashboard-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dashboard_config.json");
        std::fs::write(&path, r#"{ "min_bars": 10, "bind_addr": "127.0.0.1:4000" }"#).unwrap();

        let loaded = DashboardConfig::load(&path).unwrap();
        assert_eq!(loaded.min_bars, 10);
        assert_eq!(loaded.bind_addr, "127.0.0.1:4000");
        assert_eq!(loaded.default_lookback_days, 90);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_missing_file_is_error() {
        assert!(DashboardConfig::load("/nonexistent/dashboard_config.json").is_err());
    }
}
