//! TTL + LRU 인메모리 캐시.

use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// `now + ttl`이 표현 범위를 넘을 때 사용하는 만료 상한 (약 30년).
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// 캐시 항목.
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    /// `now < expires_at`일 때만 유효.
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// 용량 제한 + 만료 시간을 갖는 캐시.
///
/// - 용량을 넘는 새 키를 넣으면 가장 오래 사용되지 않은 항목 하나를 제거합니다.
/// - 만료된 항목은 조회 시점에 제거되고 없는 것으로 취급합니다.
/// - 시간은 tokio 시계를 사용하므로 테스트에서 `tokio::time::pause`로 제어할 수 있습니다.
///
/// 내부 잠금은 짧은 동기 구간에서만 잡으며 `.await`를 넘어 유지하지 않습니다.
pub struct TtlCache<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, Entry<V>>>,
    default_ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    /// 새 캐시 생성. `capacity`가 0이면 1로 취급합니다.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    /// 유효한 값을 조회합니다. 만료된 항목은 이 시점에 제거됩니다.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            trace!("expired cache entry dropped");
        }
        None
    }

    /// `now + ttl`까지 유효한 값으로 삽입하거나 교체합니다.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + MAX_TTL);

        let mut entries = self.entries.lock();
        let replaced_existing = entries.contains(&key);
        let evicted = entries.push(key, Entry { value, expires_at });

        if evicted.is_some() && !replaced_existing {
            trace!(capacity = entries.cap().get(), "cache full, evicted least recently used entry");
        }
    }

    /// 기본 TTL로 삽입합니다.
    pub fn insert(&self, key: K, value: V) {
        self.put(key, value, self.default_ttl);
    }

    /// 현재 저장된 항목 수 (만료되었지만 아직 제거되지 않은 항목 포함).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// 최대 항목 수.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// 기본 TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
