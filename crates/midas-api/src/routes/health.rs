//! 헬스 체크 endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use midas_data::CacheStats;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 간단한 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// 현재 시간 (RFC 3339, UTC)
    pub ts: String,
}

/// 상세 헬스 체크 응답.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// 전체 서비스 상태 ("ready" | "degraded")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 업스트림(Finnhub) 상태
    pub upstream: ComponentStatus,

    /// 캐시 통계 (업스트림 미설정 시 없음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSummary>,
}

/// 캐시별 통계.
#[derive(Debug, Serialize)]
pub struct CacheSummary {
    pub quote: CacheStats,
    pub news: CacheStats,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// 상태 ("up" | "not_configured")
    pub status: String,

    /// 추가 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    /// 정보 포함 정상 상태.
    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }

    /// 미설정 상태.
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            status: "not_configured".to_string(),
            message: Some(message.into()),
        }
    }
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ts: chrono::Utc::now().to_rfc3339(),
    })
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 업스트림 키가 없어도 서버는 응답 가능하므로 200 + "degraded"를 반환합니다.
///
/// GET /health/ready
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, upstream, cache) = match &state.market {
        Some(market) => {
            let quote = market.quote_stats();
            let news = market.news_stats();
            let upstream = ComponentStatus::up_with_info(format!(
                "{} quotes, {} news lists cached",
                quote.entries, news.entries
            ));
            ("ready", upstream, Some(CacheSummary { quote, news }))
        }
        None => (
            "degraded",
            ComponentStatus::not_configured("FINNHUB_API_KEY not configured"),
            None,
        ),
    };

    let response = ReadinessResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        upstream,
        cache,
    };

    (StatusCode::OK, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
