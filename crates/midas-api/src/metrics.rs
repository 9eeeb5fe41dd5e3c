//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 캐시 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.
//! 캐시 조회 카운터(`midas_cache_lookups_total`)는 `midas-data`가 직접 기록합니다.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use midas_data::CacheStats;

/// 메트릭 라벨로 허용하는 경로. 그 외 경로는 `/other`로 묶습니다.
const KNOWN_PATHS: &[&str] = &["/health", "/health/ready", "/quote", "/news", "/metrics"];

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// # Errors
///
/// 레코더가 이미 설치되어 있으면 `BuildError`를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        // 캐시 적중 시 수 ms, 업스트림 호출 시 최대 타임아웃(10s)까지
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// 게이트웨이 상태 코드를 업스트림 실패 사유로 분류.
///
/// `/quote`, `/news`의 502/503/504는 모두 Finnhub 쪽 문제입니다.
pub fn upstream_failure_reason(status: u16) -> Option<&'static str> {
    match status {
        502 => Some("error"),
        503 => Some("not_configured"),
        504 => Some("timeout"),
        _ => None,
    }
}

/// 업스트림 실패로 끝난 요청 카운터 증가.
pub fn record_upstream_failure(path: &str, reason: &'static str) {
    counter!(
        "midas_upstream_failures_total",
        "path" => path.to_string(),
        "reason" => reason
    )
    .increment(1);
}

// ============================================================================
// 캐시 메트릭
// ============================================================================

/// 캐시 상태 게이지 갱신 (스크레이프 시점에 호출).
pub fn set_cache_gauges(kind: &'static str, stats: &CacheStats) {
    gauge!("midas_cache_entries", "kind" => kind).set(stats.entries as f64);
    gauge!("midas_cache_capacity", "kind" => kind).set(stats.capacity as f64);
    gauge!("midas_fetch_locks_active", "kind" => kind).set(stats.in_flight_keys as f64);
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 메트릭 라벨용 경로 정규화.
///
/// 알려진 경로는 그대로 두고 (끝의 `/` 제거), 나머지는 `/other`로 묶어
/// 임의 경로 요청으로 라벨 수가 늘어나지 않게 합니다.
pub fn normalize_path(path: &str) -> String {
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    if KNOWN_PATHS.contains(&trimmed) {
        trimmed.to_string()
    } else {
        "/other".to_string()
    }
}
