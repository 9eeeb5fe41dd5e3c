//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness, 캐시 통계)
//! - `/quote` - 현재 시세
//! - `/news` - 최신 뉴스 헤드라인
//!
//! `/metrics`는 별도 상태(PrometheusHandle)를 쓰므로 바이너리에서 합칩니다.

pub mod health;
pub mod market;

pub use health::{health_router, CacheSummary, ComponentStatus, HealthResponse, ReadinessResponse};
pub use market::{market_router, NewsQuery, QuoteQuery};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .merge(market_router())
}
