// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are public. Each chart call carries
// the complete set of user selections in its body; the server keeps no
// per-user state besides the shared session caches.
//
// CORS is configured permissively; the dashboard frontend may be served from
// anywhere.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::error::ChartError;
use crate::session::{ChartRequest, DashboardSession};
use crate::types::Market;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared session.
pub fn router(session: Arc<DashboardSession>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/markets", get(markets))
        .route("/api/v1/mav-options", get(mav_options))
        .route("/api/v1/catalog/:market", get(catalog))
        .route("/api/v1/chart", post(chart))
        .layer(cors)
        .with_state(session)
}

// =============================================================================
// Error mapping
// =============================================================================

impl ChartError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::UnknownMarket { .. } | Self::UnknownInstrument { .. } => StatusCode::NOT_FOUND,
            Self::InvalidMavWindow { .. } | Self::InsufficientData { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::SeriesFetchFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::CatalogUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ChartError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(kind = self.kind(), error = %self, "request halted");
        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Selection data
// =============================================================================

async fn markets() -> impl IntoResponse {
    Json(Market::ALL)
}

async fn mav_options(State(session): State<Arc<DashboardSession>>) -> impl IntoResponse {
    Json(session.mav_options())
}

async fn catalog(
    State(session): State<Arc<DashboardSession>>,
    Path(market): Path<String>,
) -> Result<impl IntoResponse, ChartError> {
    let market: Market = market.parse()?;
    let catalog = session.catalog(market).await?;
    Ok(Json(catalog))
}

// =============================================================================
// Chart
// =============================================================================

async fn chart(
    State(session): State<Arc<DashboardSession>>,
    body: Result<Json<ChartRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ChartError> {
    let Json(request) = body.map_err(|rejection| ChartError::InvalidRequest {
        reason: rejection.body_text(),
    })?;
    let response = session.run(request).await?;
    Ok(Json(response))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::provider::fake::{ohlcv_frame, FakeProvider};
    use crate::runtime_config::DashboardConfig;

    fn app() -> Router {
        let provider = FakeProvider::new()
            .with_series("BTC/KRW", ohlcv_frame(30))
            .with_series("ETH/KRW", ohlcv_frame(3));
        let session = DashboardSession::new(Arc::new(provider), DashboardConfig::default());
        router(Arc::new(session))
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_chart(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/chart")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let resp = app().oneshot(get("/api/v1/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn markets_lists_all_eight() {
        let resp = app().oneshot(get("/api/v1/markets")).await.unwrap();
        let json = body_json(resp).await;
        assert_eq!(json.as_array().unwrap().len(), 8);
        assert_eq!(json[7], "CRYPTO");
    }

    #[tokio::test]
    async fn crypto_catalog_has_six_entries() {
        let resp = app().oneshot(get("/api/v1/catalog/CRYPTO")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0]["display_name"], "비트코인/빗썸");
        assert_eq!(entries[0]["symbol_code"], "BTC/KRW");
    }

    #[tokio::test]
    async fn unknown_market_is_404() {
        let resp = app().oneshot(get("/api/v1/catalog/LSE")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["kind"], "unknown_market");
    }

    #[tokio::test]
    async fn unreachable_listing_is_503() {
        let resp = app().oneshot(get("/api/v1/catalog/NYSE")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn chart_round_trip() {
        let body = serde_json::json!({
            "market": "CRYPTO",
            "name": "비트코인/빗썸",
            "start": "2024-01-01",
            "end": "2024-06-30",
            "mavs": [20, 5, 60],
            "show_bollinger": false
        });
        let resp = app().oneshot(post_chart(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["title"], "비트코인/빗썸 (BTC/KRW)");
        assert_eq!(json["bars"].as_array().unwrap().len(), 30);
        let colors: Vec<&str> = json["config"]["overlays"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["color"].as_str().unwrap())
            .collect();
        assert_eq!(colors, vec!["red", "blue", "orange"]);
        assert!(json["config"]["bollinger"].is_null());
        // Undefined prefix serialises as null, full length kept.
        let ma5 = json["overlays"]["mavs"][0]["values"].as_array().unwrap();
        assert_eq!(ma5.len(), 30);
        assert!(ma5[3].is_null());
        assert!(ma5[4].is_number());
    }

    #[tokio::test]
    async fn chart_accepts_lower_case_market() {
        let body = serde_json::json!({
            "market": "crypto",
            "name": "비트코인/빗썸",
            "start": "2024-01-01",
            "end": "2024-06-30"
        });
        let resp = app().oneshot(post_chart(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["instrument"]["market"], "CRYPTO");
    }

    #[tokio::test]
    async fn undecodable_chart_body_is_json_400() {
        let body = serde_json::json!({ "market": "LSE" });
        let resp = app().oneshot(post_chart(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["kind"], "invalid_request");
        assert!(json["error"].as_str().unwrap().contains("unknown market 'LSE'"));
    }

    #[tokio::test]
    async fn insufficient_data_is_422() {
        let body = serde_json::json!({
            "market": "CRYPTO",
            "name": "이더리움/빗썸",
            "start": "2024-01-01",
            "end": "2024-06-30"
        });
        let resp = app().oneshot(post_chart(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(resp).await["kind"], "insufficient_data");
    }

    #[tokio::test]
    async fn fetch_failure_is_502_with_symbol() {
        let body = serde_json::json!({
            "market": "CRYPTO",
            "name": "리플/빗썸",
            "start": "2024-01-01",
            "end": "2024-06-30"
        });
        let resp = app().oneshot(post_chart(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("XRP/KRW"));
    }
}
