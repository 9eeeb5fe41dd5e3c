//! MIDAS 시세/뉴스 API 서버.
//!
//! 설정을 로드하고 Axum 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use midas_core::{init_logging, AppConfig, CorsConfig, LogConfig, ServerConfig};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use midas_api::metrics::{set_cache_gauges, setup_metrics_recorder};
use midas_api::middleware::metrics_layer;
use midas_api::routes::create_api_router;
use midas_api::state::AppState;

/// 메트릭 엔드포인트 상태.
#[derive(Clone)]
struct MetricsState {
    handle: PrometheusHandle,
    app: Arc<AppState>,
}

/// Prometheus 메트릭 핸들러.
///
/// 스크레이프 시점의 캐시 게이지를 갱신한 뒤 렌더링합니다.
async fn metrics_handler(State(state): State<MetricsState>) -> String {
    if let Some(market) = &state.app.market {
        set_cache_gauges("quote", &market.quote_stats());
        set_cache_gauges("news", &market.news_stats());
    }
    state.handle.render()
}

/// 소켓 주소 반환.
fn socket_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    format!("{}:{}", server.host, server.port)
        .parse::<SocketAddr>()
        .with_context(|| {
            format!(
                "소켓 주소 설정이 유효하지 않습니다: {}:{} (API_HOST, API_PORT 확인)",
                server.host, server.port
            )
        })
}

/// CORS 레이어 생성. 허용 origin이 없으면 `None`.
fn cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    let origins: Vec<_> = cors
        .origins
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!(origin = %s, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        info!("CORS origins not configured, CORS layer disabled");
        return None;
    }

    info!("CORS configured with {} allowed origins", origins.len());
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::header::ACCEPT,
            ])
            .allow_credentials(true),
    )
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle, config: &AppConfig) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(MetricsState {
            handle: metrics_handle,
            app: Arc::clone(&state),
        });

    let router = Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        // 메트릭 미들웨어 (모든 요청에 적용)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.server.request_timeout(),
        ));

    match cors_layer(&config.cors) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("설정 로드 실패")?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting MIDAS API server...");

    let metrics_handle = setup_metrics_recorder().context("Prometheus 레코더 설치 실패")?;
    info!("Prometheus metrics recorder initialized");

    let addr = socket_addr(&config.server)?;

    let state = Arc::new(AppState::from_config(&config).context("AppState 생성 실패")?);
    info!(
        version = %state.version,
        upstream_configured = state.has_market_service(),
        quote_ttl_secs = config.cache.quote_ttl_secs,
        news_ttl_secs = config.cache.news_ttl_secs,
        cache_capacity = config.cache.capacity,
        "Application state initialized"
    );

    let app = create_router(state, metrics_handle, &config);

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("{} 바인딩 실패", addr))?;

    // 진행 중인 요청은 axum이 마무리한 뒤 반환
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
