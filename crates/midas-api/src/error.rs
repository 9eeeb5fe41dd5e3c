//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공하고,
//! 도메인 에러(`MidasError`, `DataError`)를 HTTP 상태 코드로 매핑합니다.

use axum::http::StatusCode;
use axum::Json;
use midas_core::MidasError;
use midas_data::DataError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::ValidationErrors;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "SYMBOL_REQUIRED",
///   "message": "Symbol required",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "SYMBOL_REQUIRED", "UPSTREAM_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// # Example
    ///
    /// ```
    /// use midas_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("SYMBOL_REQUIRED", "Symbol required");
    /// assert_eq!(error.code, "SYMBOL_REQUIRED");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

// ==================== Result Type Alias ====================

/// 핸들러 에러 타입 (상태 코드 + JSON 본문).
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// API 핸들러 Result 타입 별칭.
///
/// # Example
///
/// ```ignore
/// async fn get_quote(
///     State(state): State<Arc<AppState>>,
///     Query(params): Query<QuoteQuery>,
/// ) -> ApiResult<Json<Quote>> {
///     let symbol = normalize_symbol(&params.symbol).map_err(core_error)?;
///     let quote = state.require_market()?.quote(&symbol).await.map_err(upstream_error)?;
///     Ok(Json(quote))
/// }
/// ```
pub type ApiResult<T> = Result<T, ApiError>;

// ==================== 도메인 에러 매핑 ====================

/// 입력 검증/설정 에러 → HTTP 에러.
///
/// - `SymbolRequired` → 400 `SYMBOL_REQUIRED`
/// - `InvalidSymbol` → 400 `INVALID_SYMBOL`
/// - 나머지 → 500 `INTERNAL_ERROR`
pub fn core_error(err: MidasError) -> ApiError {
    let (status, code) = match &err {
        MidasError::SymbolRequired => (StatusCode::BAD_REQUEST, "SYMBOL_REQUIRED"),
        MidasError::InvalidSymbol(_) => (StatusCode::BAD_REQUEST, "INVALID_SYMBOL"),
        MidasError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    (status, Json(ApiErrorResponse::new(code, err.to_string())))
}

/// 업스트림 에러 → HTTP 에러.
///
/// - `NotConfigured` → 503 `UPSTREAM_NOT_CONFIGURED`
/// - `Timeout` → 504 `UPSTREAM_TIMEOUT`
/// - `Http` / `Network` / `Parse` → 502 `UPSTREAM_ERROR`
pub fn upstream_error(err: DataError) -> ApiError {
    match &err {
        DataError::NotConfigured(_) => not_configured(),
        DataError::Timeout(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(ApiErrorResponse::new("UPSTREAM_TIMEOUT", err.to_string())),
        ),
        DataError::Http { status, .. } => (
            StatusCode::BAD_GATEWAY,
            Json(ApiErrorResponse::with_details(
                "UPSTREAM_ERROR",
                err.to_string(),
                serde_json::json!({
                    "upstream_status": status,
                    "retryable": err.is_retryable(),
                }),
            )),
        ),
        DataError::Network(_) | DataError::Parse(_) => (
            StatusCode::BAD_GATEWAY,
            Json(ApiErrorResponse::new("UPSTREAM_ERROR", err.to_string())),
        ),
    }
}

/// API 키 미설정 → 503.
pub fn not_configured() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiErrorResponse::new(
            "UPSTREAM_NOT_CONFIGURED",
            "FINNHUB_API_KEY not configured",
        )),
    )
}

/// `validator` 검증 실패 → 422 `VALIDATION_ERROR`.
pub fn validation_error(errors: &ValidationErrors) -> ApiError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    let fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| field.to_string())
        .collect();

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiErrorResponse::with_details(
            "VALIDATION_ERROR",
            message,
            serde_json::json!({ "fields": fields }),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let error = ApiErrorResponse::new("NOT_FOUND", "Resource not found");
        let json = serde_json::to_string(&error).unwrap();

        assert!(!json.contains("details"));
        assert!(json.contains(r#""code":"NOT_FOUND""#));
    }

    #[test]
    fn test_core_error_mapping() {
        let (status, Json(body)) = core_error(MidasError::SymbolRequired);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "SYMBOL_REQUIRED");
        assert_eq!(body.message, "Symbol required");

        let (status, Json(body)) = core_error(MidasError::InvalidSymbol("A B".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_SYMBOL");

        let (status, _) = core_error(MidasError::Config("bad".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_error_mapping() {
        let (status, Json(body)) = upstream_error(DataError::Timeout("10s".to_string()));
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body.code, "UPSTREAM_TIMEOUT");

        let (status, Json(body)) = upstream_error(DataError::Http {
            status: 429,
            body: "API limit reached".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code, "UPSTREAM_ERROR");
        let details = body.details.unwrap();
        assert_eq!(details["upstream_status"], 429);
        assert_eq!(details["retryable"], true);

        let (status, Json(body)) = upstream_error(DataError::NotConfigured("key".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "UPSTREAM_NOT_CONFIGURED");
    }
}
