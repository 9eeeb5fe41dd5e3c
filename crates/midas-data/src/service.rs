//! 시세/뉴스 조회 서비스.
//!
//! 두 개의 독립된 `CachedResolver`(시세, 뉴스)를 하나의 제공자 위에 조합합니다.

use std::sync::Arc;

use chrono::Utc;
use midas_core::config::CacheConfig;
use midas_core::{sort_newest_first, CacheKey, Headline, NewsResponse, Quote, RequestKind};
use tracing::{debug, instrument};

use crate::cache::{CacheStats, CachedResolver};
use crate::error::{DataError, Result};
use crate::provider::MarketDataProvider;

/// 캐시된 시세/뉴스 서비스.
///
/// 심볼은 호출 전에 `midas_core::normalize_symbol`로 정규화되어 있어야 합니다.
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    quotes: CachedResolver<Quote>,
    news: CachedResolver<Arc<Vec<Headline>>>,
    news_lookback_days: i64,
}

impl MarketDataService {
    /// 새 서비스 생성.
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: &CacheConfig,
        news_lookback_days: i64,
    ) -> Self {
        Self {
            provider,
            quotes: CachedResolver::with_sweep_threshold(
                RequestKind::Quote,
                cache.capacity,
                cache.quote_ttl(),
                cache.lock_sweep_threshold,
            ),
            news: CachedResolver::with_sweep_threshold(
                RequestKind::News,
                cache.capacity,
                cache.news_ttl(),
                cache.lock_sweep_threshold,
            ),
            news_lookback_days,
        }
    }

    /// 현재 시세.
    #[instrument(skip(self))]
    pub async fn quote(&self, symbol: &str) -> Result<Quote> {
        let key = CacheKey::quote(symbol);
        self.quotes
            .resolve(&key, || async {
                let raw = self.provider.fetch_quote(symbol).await?;
                Ok::<_, DataError>(raw.into_quote(symbol))
            })
            .await
    }

    /// 최신 뉴스 `limit`개.
    ///
    /// 전체 목록을 캐시하고 `limit`은 읽을 때 적용하므로,
    /// 같은 심볼에 대해 `limit`만 다른 요청은 업스트림을 다시 호출하지 않습니다.
    #[instrument(skip(self))]
    pub async fn news(&self, symbol: &str, limit: usize) -> Result<NewsResponse> {
        let key = CacheKey::news(symbol);
        let items = self
            .news
            .resolve(&key, || async {
                let raw = self
                    .provider
                    .fetch_company_news(symbol, self.news_lookback_days)
                    .await?;

                let now = Utc::now();
                let mut items: Vec<Headline> = raw
                    .into_iter()
                    .map(|item| item.into_headline(symbol, now))
                    .collect();
                sort_newest_first(&mut items);

                debug!(count = items.len(), provider = self.provider.name(), "fetched news");
                Ok::<_, DataError>(Arc::new(items))
            })
            .await?;

        Ok(NewsResponse::from_cached(symbol, &items, limit))
    }

    /// 시세 캐시 통계.
    pub fn quote_stats(&self) -> CacheStats {
        self.quotes.stats()
    }

    /// 뉴스 캐시 통계.
    pub fn news_stats(&self) -> CacheStats {
        self.news.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{RawNewsItem, RawQuote};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubProvider {
        quote_calls: AtomicUsize,
        news_calls: AtomicUsize,
        fail_quotes: bool,
    }

    #[async_trait]
    impl MarketDataProvider for StubProvider {
        async fn fetch_quote(&self, _symbol: &str) -> Result<RawQuote> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_quotes {
                return Err(DataError::Http {
                    status: 401,
                    body: "invalid token".to_string(),
                });
            }
            Ok(RawQuote {
                c: Some(189.5),
                ..Default::default()
            })
        }

        async fn fetch_company_news(
            &self,
            _symbol: &str,
            _lookback_days: i64,
        ) -> Result<Vec<RawNewsItem>> {
            self.news_calls.fetch_add(1, Ordering::SeqCst);
            let items = (1..=5)
                .map(|i| {
                    serde_json::from_value(json!({
                        "datetime": 1_700_000_000 + i * 60,
                        "headline": format!("story {}", i),
                        "source": "Reuters",
                    }))
                    .unwrap()
                })
                .collect();
            Ok(items)
        }
    }

    fn service(provider: Arc<StubProvider>) -> MarketDataService {
        MarketDataService::new(provider, &CacheConfig::default(), 5)
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_is_cached() {
        let provider = Arc::new(StubProvider::default());
        let service = service(Arc::clone(&provider));

        let first = service.quote("AAPL").await.unwrap();
        let second = service.quote("AAPL").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.last, 189.5);
        assert_eq!(provider.quote_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_news_sorted_and_limited_from_one_fetch() {
        let provider = Arc::new(StubProvider::default());
        let service = service(Arc::clone(&provider));

        let three = service.news("AAPL", 3).await.unwrap();
        assert_eq!(three.items.len(), 3);
        assert_eq!(three.items[0].headline, "story 5");
        assert!(three.items[0].datetime > three.items[1].datetime);

        let all = service.news("AAPL", 10).await.unwrap();
        assert_eq!(all.items.len(), 5);
        assert_eq!(provider.news_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_and_news_keys_are_isolated() {
        let provider = Arc::new(StubProvider::default());
        let service = service(Arc::clone(&provider));

        service.quote("AAPL").await.unwrap();
        service.news("AAPL", 3).await.unwrap();

        assert_eq!(provider.quote_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.news_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.quote_stats().entries, 1);
        assert_eq!(service.news_stats().entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_failure_propagates() {
        let provider = Arc::new(StubProvider {
            fail_quotes: true,
            ..Default::default()
        });
        let service = service(Arc::clone(&provider));

        let err = service.quote("AAPL").await.unwrap_err();
        assert_eq!(err.upstream_status(), Some(401));

        service.quote("AAPL").await.unwrap_err();
        assert_eq!(provider.quote_calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.quote_stats().entries, 0);
    }
}
