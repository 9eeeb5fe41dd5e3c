//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.

use std::sync::Arc;

use midas_core::AppConfig;
use midas_data::{DataError, FinnhubClient, MarketDataService};
use tracing::{info, warn};

use crate::error::{not_configured, ApiResult};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 캐시된 시세/뉴스 서비스.
    ///
    /// Finnhub API 키가 없으면 `None`이며, 이때 시세/뉴스 엔드포인트는 503을 반환합니다.
    pub market: Option<Arc<MarketDataService>>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(market: Option<Arc<MarketDataService>>) -> Self {
        Self {
            market,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 설정으로부터 AppState 생성.
    ///
    /// API 키가 설정되어 있으면 Finnhub 클라이언트와 캐시 서비스를 만듭니다.
    ///
    /// # Errors
    ///
    /// HTTP 클라이언트 생성 실패 시 `DataError`.
    pub fn from_config(config: &AppConfig) -> Result<Self, DataError> {
        if !config.upstream.is_configured() {
            warn!("FINNHUB_API_KEY not configured, /quote and /news will return 503");
            return Ok(Self::new(None));
        }

        let client = FinnhubClient::from_upstream(&config.upstream)?;
        info!(
            base_url = %client.config().base_url,
            timeout_secs = config.upstream.timeout_secs,
            "Finnhub client initialized"
        );

        let service = MarketDataService::new(
            Arc::new(client),
            &config.cache,
            config.upstream.news_lookback_days,
        );
        Ok(Self::new(Some(Arc::new(service))))
    }

    /// 시세/뉴스 서비스가 설정되어 있는지 확인.
    pub fn has_market_service(&self) -> bool {
        self.market.is_some()
    }

    /// 시세/뉴스 서비스 반환. 미설정이면 503 에러.
    pub fn require_market(&self) -> ApiResult<&MarketDataService> {
        self.market.as_deref().ok_or_else(not_configured)
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 AppState 생성 (업스트림 미설정).
#[cfg(test)]
pub(crate) fn create_test_state() -> AppState {
    AppState::new(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_state_without_api_key() {
        let state = AppState::from_config(&AppConfig::default()).unwrap();
        assert!(!state.has_market_service());

        let (status, body) = state.require_market().err().unwrap();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "UPSTREAM_NOT_CONFIGURED");
    }

    #[test]
    fn test_uptime_is_non_negative() {
        let state = create_test_state();
        assert!(state.uptime_secs() >= 0);
        assert!(!state.version.is_empty());
    }
}
