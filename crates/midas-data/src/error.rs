//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 업스트림 조회 관련 오류.
///
/// 캐시/잠금 연산은 실패하지 않으므로 모든 변형이 업스트림 호출에서 발생합니다.
#[derive(Debug, Error)]
pub enum DataError {
    /// 네트워크/연결 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("Upstream timeout: {0}")]
    Timeout(String),

    /// 2xx가 아닌 HTTP 응답
    #[error("Upstream HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 업스트림 자격증명 미설정
    #[error("Upstream not configured: {0}")]
    NotConfigured(String),
}

impl DataError {
    /// 호출자가 재시도해 볼 만한 오류인지 확인.
    ///
    /// 캐시 계층은 스스로 재시도하지 않습니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Network(_) | DataError::Timeout(_) => true,
            DataError::Http { status, .. } => *status == 429 || *status >= 500,
            DataError::Parse(_) | DataError::NotConfigured(_) => false,
        }
    }

    /// 업스트림이 보낸 HTTP 상태 코드.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            DataError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DataError {
    /// 요청 URL에는 `token` 쿼리 파라미터가 들어 있으므로 URL을 떼고 변환합니다.
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else if err.is_decode() {
            DataError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            DataError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            DataError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
