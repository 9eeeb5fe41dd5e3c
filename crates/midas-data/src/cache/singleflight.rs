//! 키별 배타 잠금 테이블.
//!
//! 같은 키에 대한 업스트림 호출이 동시에 하나만 진행되도록 직렬화합니다.
//! 서로 다른 키는 서로를 기다리지 않습니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use midas_core::CacheKey;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// 잠금 테이블 정리 기준 기본값.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// 키 → 비동기 잠금 맵.
///
/// 외부 잠금(`parking_lot::Mutex`)은 맵 구조 변경에만 짧게 사용하고,
/// 실제 대기는 키별 `tokio::sync::Mutex`에서 일어납니다.
type LockMap = HashMap<CacheKey, Arc<AsyncMutex<()>>>;

/// 키별 배타 잠금 테이블.
///
/// - 처음 보는 키는 잠금 핸들을 원자적으로 생성 (insert-if-absent)
/// - 대기자는 FIFO 순서로 잠금을 얻음
/// - 보유자도 대기자도 없는 핸들은 해제 시점에 제거
/// - 테이블이 `sweep_threshold`를 넘으면 사용되지 않는 핸들을 일괄 정리
#[derive(Clone)]
pub struct FetchLockTable {
    locks: Arc<Mutex<LockMap>>,
    sweep_threshold: usize,
}

impl Default for FetchLockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchLockTable {
    /// 기본 정리 기준으로 생성.
    pub fn new() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }

    /// 정리 기준을 지정하여 생성.
    pub fn with_sweep_threshold(sweep_threshold: usize) -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
            sweep_threshold: sweep_threshold.max(1),
        }
    }

    /// 키에 대한 잠금 핸들을 가져오거나 생성.
    fn get_or_create_lock(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();

        if locks.len() >= self.sweep_threshold {
            let before = locks.len();
            locks.retain(|_, handle| Arc::strong_count(handle) > 1);
            trace!(before, after = locks.len(), "swept idle fetch locks");
        }

        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// 키에 대한 배타 잠금을 획득할 때까지 대기.
    ///
    /// 대기 중에 future가 drop되어도 핸들 참조가 함께 해제되므로
    /// 다른 대기자를 막지 않습니다.
    pub async fn acquire(&self, key: &CacheKey) -> ExclusiveGuard {
        let handle = self.get_or_create_lock(key);
        let guard = handle.lock_owned().await;

        ExclusiveGuard {
            guard: Some(guard),
            key: key.clone(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// 키 잠금을 보유한 상태로 `f`를 실행.
    ///
    /// 성공, 실패, 취소 어느 경우든 잠금은 해제됩니다.
    pub async fn run_exclusive<F, Fut, T>(&self, key: &CacheKey, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.acquire(key).await;
        f().await
    }

    /// 현재 테이블에 남아 있는 키 수 (보유 중이거나 대기자가 있는 키).
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// 테이블이 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// 키 잠금 보유 증표. drop 시 잠금을 해제하고 필요 없으면 테이블에서 제거합니다.
pub struct ExclusiveGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: CacheKey,
    locks: Arc<Mutex<LockMap>>,
}

impl ExclusiveGuard {
    /// 보유 중인 키.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl Drop for ExclusiveGuard {
    fn drop(&mut self) {
        // 잠금 해제 → 다음 대기자가 깨어남 (대기자는 자신의 핸들 참조를 가지고 있음)
        drop(self.guard.take());

        let mut locks = self.locks.lock();
        let idle = locks
            .get(&self.key)
            .is_some_and(|handle| Arc::strong_count(handle) == 1);
        if idle {
            locks.remove(&self.key);
        }
    }
}

impl std::fmt::Debug for ExclusiveGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusiveGuard")
            .field("key", &self.key)
            .finish()
    }
}
