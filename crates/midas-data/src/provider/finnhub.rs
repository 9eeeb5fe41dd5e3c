//! Finnhub REST 클라이언트.
//!
//! 시세(`/quote`)와 회사 뉴스(`/company-news`) 두 엔드포인트만 사용합니다.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta, Utc};
use midas_core::config::{UpstreamConfig, FINNHUB_BASE_URL};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::types::{RawNewsItem, RawQuote};
use super::MarketDataProvider;
use crate::error::{DataError, Result};

// ============================================================================
// 설정
// ============================================================================

/// Finnhub 클라이언트 설정.
///
/// # 보안
/// - `Debug` 구현은 API 키를 출력하지 않습니다.
#[derive(Clone)]
pub struct FinnhubConfig {
    /// API 키 (`token` 쿼리 파라미터)
    pub api_key: SecretString,
    /// REST API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃
    pub timeout: Duration,
}

impl fmt::Debug for FinnhubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinnhubConfig")
            .field("api_key", &"***REDACTED***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FinnhubConfig {
    /// 새 설정 생성 (기본 URL, 10초 타임아웃).
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: FINNHUB_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// 기본 URL 변경 (테스트 서버 등).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 요청 타임아웃 변경.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 업스트림 설정에서 생성.
    ///
    /// 사용 가능한 API 키가 없으면 `None`을 반환합니다.
    pub fn from_upstream(upstream: &UpstreamConfig) -> Option<Self> {
        let api_key = upstream.usable_api_key()?.clone();
        Some(
            Self::new(api_key)
                .with_base_url(upstream.base_url.clone())
                .with_timeout(upstream.timeout()),
        )
    }
}

// ============================================================================
// 클라이언트
// ============================================================================

/// Finnhub 클라이언트.
///
/// 내부 `reqwest::Client`는 연결 풀을 공유하므로 프로세스당 하나만 만듭니다.
#[derive(Clone)]
pub struct FinnhubClient {
    config: FinnhubConfig,
    client: Client,
}

impl fmt::Debug for FinnhubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinnhubClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FinnhubClient {
    /// 새 클라이언트 생성.
    pub fn new(config: FinnhubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { config, client })
    }

    /// 업스트림 설정에서 생성.
    ///
    /// API 키가 없으면 `DataError::NotConfigured`.
    pub fn from_upstream(upstream: &UpstreamConfig) -> Result<Self> {
        let config = FinnhubConfig::from_upstream(upstream)
            .ok_or_else(|| DataError::NotConfigured("FINNHUB_API_KEY not set".to_string()))?;
        Self::new(config)
    }

    /// 클라이언트 설정.
    pub fn config(&self) -> &FinnhubConfig {
        &self.config
    }

    /// 인증 토큰을 붙인 GET 요청.
    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.config.base_url, endpoint);
        debug!(endpoint, ?params, "GET finnhub");

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("token", self.config.api_key.expose_secret())])
            .send()
            .await?;

        self.handle_response(endpoint, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!(endpoint, "Failed to parse response: {} - Body: {}", e, body);
                DataError::Parse(e.to_string())
            })
        } else {
            warn!(endpoint, status = status.as_u16(), "Finnhub returned error status");
            Err(DataError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// `/company-news` 조회 기간 `(from, to)`.
///
/// 음수 기간은 0일로, 표현할 수 없을 만큼 긴 기간은 `NaiveDate::MIN`으로 포화합니다.
fn news_window(today: NaiveDate, lookback_days: i64) -> (NaiveDate, NaiveDate) {
    let from = TimeDelta::try_days(lookback_days.max(0))
        .and_then(|span| today.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN);
    (from, today)
}

#[async_trait]
impl MarketDataProvider for FinnhubClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote> {
        self.get("/quote", &[("symbol", symbol.to_string())]).await
    }

    async fn fetch_company_news(
        &self,
        symbol: &str,
        lookback_days: i64,
    ) -> Result<Vec<RawNewsItem>> {
        let (from, to) = news_window(Utc::now().date_naive(), lookback_days);

        self.get(
            "/company-news",
            &[
                ("symbol", symbol.to_string()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", to.format("%Y-%m-%d").to_string()),
            ],
        )
        .await
    }

    fn name(&self) -> &'static str {
        "finnhub"
    }
}
