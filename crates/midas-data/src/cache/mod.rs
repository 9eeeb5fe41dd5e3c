//! 캐싱 레이어.
//!
//! - `TtlCache`: 용량 제한(LRU) + 만료 시간(TTL)을 갖는 인메모리 캐시
//! - `FetchLockTable`: 키별 배타 잠금 테이블 (동일 키 업스트림 호출 직렬화)
//! - `CachedResolver`: 캐시 조회 → 잠금 → 재확인 → fetch → 저장
//!
//! # 동작 흐름
//!
//! ```text
//! resolve(key, fetch)
//!         │
//!   ┌─────▼─────┐  HIT
//!   │ 캐시 조회  │ ─────────────► 반환 (잠금 없음)
//!   └─────┬─────┘
//!         │ MISS
//!   ┌─────▼──────────────┐
//!   │ 키별 lock 획득      │ ← 같은 키는 한 번에 하나만
//!   └─────┬──────────────┘
//!   ┌─────▼─────┐  HIT (앞선 holder가 채움)
//!   │ 캐시 재확인 │ ─────────────► 반환
//!   └─────┬─────┘
//!         │ MISS
//!   ┌─────▼──────────────┐
//!   │ fetch → 캐시 저장   │ ← 실패 시 저장하지 않음
//!   └─────┬──────────────┘
//!         ▼
//!   lock 해제 (모든 경로)
//! ```

pub mod resolver;
pub mod singleflight;
pub mod ttl;

pub use resolver::{CacheStats, CachedResolver};
pub use singleflight::{ExclusiveGuard, FetchLockTable};
pub use ttl::TtlCache;
