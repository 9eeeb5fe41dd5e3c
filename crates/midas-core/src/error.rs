//! 공통 에러 타입.
//!
//! 업스트림 호출 이전 단계(설정, 입력 검증)에서 발생하는 에러를 정의합니다.
//! 업스트림 호출 에러는 `midas-data`의 `DataError`가 담당합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum MidasError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 심볼이 비어 있음
    #[error("Symbol required")]
    SymbolRequired,

    /// 유효하지 않은 심볼 (길이 초과, 허용되지 않는 문자)
    #[error("잘못된 심볼: {0}")]
    InvalidSymbol(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type MidasResult<T> = Result<T, MidasError>;

impl From<config::ConfigError> for MidasError {
    fn from(err: config::ConfigError) -> Self {
        MidasError::Config(err.to_string())
    }
}
