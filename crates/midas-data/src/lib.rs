//! 업스트림 시장 데이터 캐싱 및 요청 병합.
//!
//! 이 crate는 다음을 제공합니다:
//! - TTL + LRU 인메모리 캐시
//! - 키별 fetch lock (동일 키 동시 업스트림 호출 방지)
//! - 캐시 조회 → 잠금 → 재확인 → 업스트림 호출 순서의 조회기
//! - Finnhub 시세/뉴스 클라이언트
//! - 위를 조합한 시세/뉴스 서비스

pub mod cache;
pub mod error;
pub mod provider;
pub mod service;

pub use error::{DataError, Result};

pub use cache::{CacheStats, CachedResolver, ExclusiveGuard, FetchLockTable, TtlCache};
pub use provider::{FinnhubClient, FinnhubConfig, MarketDataProvider, RawNewsItem, RawQuote};
pub use service::MarketDataService;
