//! HTTP 요청 metrics middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
    record_upstream_failure, upstream_failure_reason,
};

/// 업스트림 호출이 일어나는 경로.
const MARKET_PATHS: &[&str] = &["/quote", "/news"];

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// - `http_requests_total`, `http_responses_total`, `http_request_duration_seconds`
/// - `midas_upstream_failures_total`: `/quote`, `/news`가 502/503/504로 끝난 경우 (path, reason 라벨)
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    record_http_request(&method, &path);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    record_http_response(&method, &path, status);
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    if MARKET_PATHS.contains(&path.as_str()) {
        if let Some(reason) = upstream_failure_reason(status) {
            record_upstream_failure(&path, reason);
        }
    }

    response
}
