//! # MIDAS Core
//!
//! 시세/뉴스 프록시 서버의 핵심 도메인 모델과 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 다른 크레이트에서 공유하는 기본 타입을 제공합니다:
//! - 심볼 정규화 및 캐시 키
//! - 시세(Quote) / 뉴스 헤드라인 응답 모델
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
