//! 캐시 조회 + 단일 fetch 조정.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use midas_core::{CacheKey, RequestKind};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::singleflight::{FetchLockTable, DEFAULT_SWEEP_THRESHOLD};
use super::ttl::TtlCache;

/// 캐시 통계 스냅샷.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// 캐시 항목 수
    pub entries: usize,
    /// 최대 항목 수
    pub capacity: usize,
    /// 기본 TTL (초)
    pub ttl_secs: u64,
    /// 잠금 없이 캐시에서 응답한 횟수
    pub hits: u64,
    /// 잠금 대기 후 앞선 요청이 채운 값으로 응답한 횟수
    pub coalesced_hits: u64,
    /// 업스트림 호출 횟수
    pub fetches: u64,
    /// 업스트림 호출 실패 횟수
    pub fetch_failures: u64,
    /// 현재 잠금 테이블에 있는 키 수
    pub in_flight_keys: usize,
}

impl CacheStats {
    /// 업스트림 호출 없이 응답한 비율.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.coalesced_hits;
        let total = served + self.fetches;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    coalesced_hits: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
}

/// 조회 결과 구분 (metrics 라벨).
#[derive(Clone, Copy)]
enum Outcome {
    Hit,
    Coalesced,
    Fetched,
    Failed,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Hit => "hit",
            Outcome::Coalesced => "coalesced",
            Outcome::Fetched => "fetched",
            Outcome::Failed => "failed",
        }
    }
}

/// 캐시 + 키별 잠금으로 업스트림 호출을 합치는 리졸버.
///
/// 같은 키에 대한 동시 요청은 업스트림을 한 번만 호출하고, 나머지는
/// 그 결과를 캐시에서 읽습니다. 실패한 결과는 캐시하지 않으므로
/// 다음 요청이 다시 호출합니다.
pub struct CachedResolver<V> {
    kind: RequestKind,
    cache: TtlCache<CacheKey, V>,
    locks: FetchLockTable,
    counters: Counters,
}

impl<V: Clone> CachedResolver<V> {
    /// 새 리졸버 생성.
    pub fn new(kind: RequestKind, capacity: usize, ttl: Duration) -> Self {
        Self::with_sweep_threshold(kind, capacity, ttl, DEFAULT_SWEEP_THRESHOLD)
    }

    /// 잠금 테이블 정리 기준을 지정하여 생성.
    pub fn with_sweep_threshold(
        kind: RequestKind,
        capacity: usize,
        ttl: Duration,
        sweep_threshold: usize,
    ) -> Self {
        Self {
            kind,
            cache: TtlCache::new(capacity, ttl),
            locks: FetchLockTable::with_sweep_threshold(sweep_threshold),
            counters: Counters::default(),
        }
    }

    /// 요청 카테고리.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// 기본 TTL.
    pub fn ttl(&self) -> Duration {
        self.cache.default_ttl()
    }

    /// 캐시만 조회 (fetch 없음, 통계 미반영).
    pub fn peek(&self, key: &CacheKey) -> Option<V> {
        self.cache.get(key)
    }

    /// 기본 TTL로 조회.
    pub async fn resolve<F, Fut, E>(&self, key: &CacheKey, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        self.resolve_with_ttl(key, self.cache.default_ttl(), fetch)
            .await
    }

    /// 캐시된 값을 반환하거나, 없으면 키 잠금을 잡고 `fetch`로 채웁니다.
    ///
    /// 1. 잠금 없이 캐시 조회 → 있으면 반환
    /// 2. 키 잠금 획득
    /// 3. 캐시 재확인 → 앞선 보유자가 채웠으면 반환
    /// 4. `fetch` 실행 → 성공 시 `ttl` 동안 캐시, 실패 시 그대로 반환
    ///
    /// 잠금은 모든 경로에서 해제됩니다 (호출자가 future를 drop한 경우 포함).
    #[instrument(skip_all, fields(kind = %self.kind, key = %key))]
    pub async fn resolve_with_ttl<F, Fut, E>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        if let Some(value) = self.cache.get(key) {
            self.record(Outcome::Hit);
            return Ok(value);
        }

        self.locks
            .run_exclusive(key, || async move {
                if let Some(value) = self.cache.get(key) {
                    debug!("served by concurrent fetch");
                    self.record(Outcome::Coalesced);
                    return Ok(value);
                }

                self.record(Outcome::Fetched);
                match fetch().await {
                    Ok(value) => {
                        self.cache.put(key.clone(), value.clone(), ttl);
                        debug!(ttl_secs = ttl.as_secs(), "cached upstream result");
                        Ok(value)
                    }
                    Err(e) => {
                        self.record(Outcome::Failed);
                        warn!(error = %e, "upstream fetch failed, not cached");
                        Err(e)
                    }
                }
            })
            .await
    }

    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Hit => &self.counters.hits,
            Outcome::Coalesced => &self.counters.coalesced_hits,
            Outcome::Fetched => &self.counters.fetches,
            Outcome::Failed => &self.counters.fetch_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        metrics::counter!(
            "midas_cache_lookups_total",
            "kind" => self.kind.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    /// 현재 통계.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            capacity: self.cache.capacity(),
            ttl_secs: self.cache.default_ttl().as_secs(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            coalesced_hits: self.counters.coalesced_hits.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            fetch_failures: self.counters.fetch_failures.load(Ordering::Relaxed),
            in_flight_keys: self.locks.len(),
        }
    }
}
