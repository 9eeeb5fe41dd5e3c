//! 업스트림 시장 데이터 제공자.
//!
//! 캐시 계층은 `MarketDataProvider`의 성공/실패만 구분합니다.

mod finnhub;
mod types;

pub use finnhub::{FinnhubClient, FinnhubConfig};
pub use types::{RawNewsItem, RawQuote};

use async_trait::async_trait;

use crate::error::Result;

/// 시세/뉴스 원시 데이터 제공자 trait.
///
/// # 구현 예시
///
/// ```ignore
/// #[async_trait]
/// impl MarketDataProvider for StubProvider {
///     async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote> {
///         Ok(RawQuote { c: Some(1.0), ..Default::default() })
///     }
///
///     async fn fetch_company_news(&self, symbol: &str, lookback_days: i64) -> Result<Vec<RawNewsItem>> {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 현재 시세 조회.
    ///
    /// # Errors
    ///
    /// - `DataError::Network`: 연결 실패
    /// - `DataError::Timeout`: 요청 타임아웃
    /// - `DataError::Http`: 2xx가 아닌 응답 (잘못된 키, 요청 한도 초과 등)
    /// - `DataError::Parse`: 응답 JSON 파싱 실패
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote>;

    /// 최근 `lookback_days`일간의 회사 뉴스 조회.
    async fn fetch_company_news(&self, symbol: &str, lookback_days: i64)
        -> Result<Vec<RawNewsItem>>;

    /// 제공자 이름 (로그용).
    fn name(&self) -> &'static str {
        "unknown"
    }
}
