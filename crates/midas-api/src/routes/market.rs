//! 시세/뉴스 endpoint.
//!
//! - `GET /quote?symbol=AAPL`
//! - `GET /news?symbol=AAPL&limit=3`
//!
//! 검증 순서: 쿼리 파라미터(422) → 심볼(400) → 업스트림 설정(503) → 조회(502/504).

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use midas_core::{normalize_symbol, NewsResponse, Quote};
use serde::Deserialize;
use tracing::debug;
use validator::Validate;

use crate::error::{core_error, upstream_error, validation_error, ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 뉴스 기본 개수.
pub const DEFAULT_NEWS_LIMIT: i64 = 3;

fn default_news_limit() -> i64 {
    DEFAULT_NEWS_LIMIT
}

/// `/quote` 쿼리.
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    /// 티커 (예: AAPL)
    #[serde(default)]
    pub symbol: Option<String>,
}

/// `/news` 쿼리.
#[derive(Debug, Deserialize, Validate)]
pub struct NewsQuery {
    /// 티커 (예: AAPL)
    #[serde(default)]
    pub symbol: Option<String>,

    /// 반환할 헤드라인 수
    #[serde(default = "default_news_limit")]
    #[validate(range(min = 1, max = 10, message = "limit은 1 이상 10 이하여야 합니다"))]
    pub limit: i64,
}

/// 쿼리 파싱 실패 (예: `limit=abc`) → 422.
fn query_rejection(rejection: QueryRejection) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiErrorResponse::new(
            "VALIDATION_ERROR",
            rejection.body_text(),
        )),
    )
}

/// 현재 시세 조회.
///
/// GET /quote?symbol=AAPL
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    query: Result<Query<QuoteQuery>, QueryRejection>,
) -> ApiResult<Json<Quote>> {
    let Query(params) = query.map_err(query_rejection)?;
    let symbol = normalize_symbol(params.symbol.as_deref().unwrap_or_default()).map_err(core_error)?;

    let market = state.require_market()?;
    let quote = market.quote(&symbol).await.map_err(upstream_error)?;

    debug!(symbol = %symbol, last = quote.last, "quote served");
    Ok(Json(quote))
}

/// 최신 뉴스 조회.
///
/// GET /news?symbol=AAPL&limit=3
pub async fn get_news(
    State(state): State<Arc<AppState>>,
    query: Result<Query<NewsQuery>, QueryRejection>,
) -> ApiResult<Json<NewsResponse>> {
    let Query(params) = query.map_err(query_rejection)?;
    params.validate().map_err(|e| validation_error(&e))?;

    let symbol = normalize_symbol(params.symbol.as_deref().unwrap_or_default()).map_err(core_error)?;

    let market = state.require_market()?;
    // validate()로 1..=10 보장
    let limit = params.limit as usize;
    let news = market.news(&symbol, limit).await.map_err(upstream_error)?;

    debug!(symbol = %symbol, count = news.items.len(), "news served");
    Ok(Json(news))
}

/// 시세/뉴스 라우터 생성.
pub fn market_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quote", get(get_quote))
        .route("/news", get(get_news))
}
