//! 설정 관리.
//!
//! 기본값 → TOML 파일(선택) → `MIDAS__*` 환경 변수 → 레거시 환경 변수
//! (`FINNHUB_API_KEY`, `CORS_ORIGINS`, `API_HOST`, `API_PORT`) 순으로 덮어씁니다.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::MidasResult;

/// 키가 아직 채워지지 않은 `.env` 템플릿의 기본값.
pub const PLACEHOLDER_API_KEY: &str = "your_key_here";

/// Finnhub REST API 기본 URL.
pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 업스트림(Finnhub) 설정
    pub upstream: UpstreamConfig,
    /// 캐시 설정
    pub cache: CacheConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// CORS 설정
    pub cors: CorsConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 전체 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 업스트림 API 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Finnhub API 키 (미설정 시 시세/뉴스 엔드포인트는 503)
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// REST API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 뉴스 조회 기간 (일)
    pub news_lookback_days: i64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: FINNHUB_BASE_URL.to_string(),
            timeout_secs: 10,
            news_lookback_days: 5,
        }
    }
}

impl UpstreamConfig {
    /// 사용 가능한 API 키를 반환합니다.
    ///
    /// 비어 있거나 템플릿 기본값(`your_key_here`)이면 `None`.
    pub fn usable_api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref().filter(|key| {
            let raw = key.expose_secret().trim();
            !raw.is_empty() && !raw.eq_ignore_ascii_case(PLACEHOLDER_API_KEY)
        })
    }

    /// API 키가 설정되어 있는지 확인합니다.
    pub fn is_configured(&self) -> bool {
        self.usable_api_key().is_some()
    }

    /// 요청 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 캐시 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 시세 캐시 TTL (초)
    pub quote_ttl_secs: u64,
    /// 뉴스 캐시 TTL (초)
    pub news_ttl_secs: u64,
    /// 캐시별 최대 항목 수
    pub capacity: usize,
    /// 이 개수를 넘으면 사용되지 않는 fetch lock을 정리
    pub lock_sweep_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            quote_ttl_secs: 30,
            news_ttl_secs: 600,
            capacity: 256,
            lock_sweep_threshold: 1024,
        }
    }
}

impl CacheConfig {
    /// 시세 캐시 TTL
    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_ttl_secs)
    }

    /// 뉴스 캐시 TTL
    pub fn news_ttl(&self) -> Duration {
        Duration::from_secs(self.news_ttl_secs)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "midas_api=info,midas_data=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// CORS 설정.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// 허용 origin 목록. 비어 있으면 CORS 레이어를 붙이지 않습니다.
    #[serde(default)]
    pub origins: Vec<String>,
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> MidasResult<Self> {
        let server = ServerConfig::default();
        let upstream = UpstreamConfig::default();
        let cache = CacheConfig::default();
        let logging = LoggingConfig::default();

        let mut builder = config::Config::builder()
            .set_default("server.host", server.host)?
            .set_default("server.port", i64::from(server.port))?
            .set_default("server.request_timeout_secs", server.request_timeout_secs as i64)?
            .set_default("upstream.base_url", upstream.base_url)?
            .set_default("upstream.timeout_secs", upstream.timeout_secs as i64)?
            .set_default("upstream.news_lookback_days", upstream.news_lookback_days)?
            .set_default("cache.quote_ttl_secs", cache.quote_ttl_secs as i64)?
            .set_default("cache.news_ttl_secs", cache.news_ttl_secs as i64)?
            .set_default("cache.capacity", cache.capacity as i64)?
            .set_default("cache.lock_sweep_threshold", cache.lock_sweep_threshold as i64)?
            .set_default("logging.level", logging.level)?
            .set_default("logging.format", logging.format)?
            .set_default("cors.origins", Vec::<String>::new())?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let builder = builder
            .add_source(
                config::Environment::with_prefix("MIDAS")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            )
            .set_override_option("upstream.api_key", std::env::var("FINNHUB_API_KEY").ok())?
            .set_override_option("server.host", std::env::var("API_HOST").ok())?
            .set_override_option("server.port", std::env::var("API_PORT").ok())?
            .set_override_option("cors.origins", legacy_cors_origins())?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// `MIDAS_CONFIG` 또는 `config/default.toml`에서 설정을 로드합니다.
    pub fn load_default() -> MidasResult<Self> {
        let path = std::env::var("MIDAS_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load(Some(Path::new(&path)))
    }
}

/// 쉼표로 구분된 `CORS_ORIGINS`를 목록으로 변환합니다.
fn legacy_cors_origins() -> Option<Vec<String>> {
    std::env::var("CORS_ORIGINS").ok().map(|raw| parse_origins(&raw))
}

/// 쉼표 구분 origin 문자열 파싱 (공백/빈 항목 제거).
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://localhost:5173 , ,https://app.example.com"),
            vec!["http://localhost:5173", "https://app.example.com"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_cache_defaults() {
        let cache = CacheConfig::default();
        assert_eq!(cache.quote_ttl(), Duration::from_secs(30));
        assert_eq!(cache.news_ttl(), Duration::from_secs(600));
        assert_eq!(cache.capacity, 256);
    }

    #[test]
    fn test_placeholder_api_key_is_not_usable() {
        let mut upstream = UpstreamConfig::default();
        assert!(!upstream.is_configured());

        upstream.api_key = Some(SecretString::new("YOUR_KEY_HERE".into()));
        assert!(!upstream.is_configured());

        upstream.api_key = Some(SecretString::new("   ".into()));
        assert!(!upstream.is_configured());

        upstream.api_key = Some(SecretString::new("c123abc".into()));
        assert!(upstream.is_configured());
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let upstream = UpstreamConfig {
            api_key: Some(SecretString::new("super-secret-token".into())),
            ..Default::default()
        };
        let debug = format!("{:?}", upstream);
        assert!(!debug.contains("super-secret-token"));
    }

    // 환경 변수는 프로세스 전역이므로 로드 테스트는 직렬로 실행
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "FINNHUB_API_KEY",
        "API_HOST",
        "API_PORT",
        "CORS_ORIGINS",
        "MIDAS__CACHE__QUOTE_TTL_SECS",
        "MIDAS__SERVER__PORT",
    ];

    /// 지정한 환경 변수만 설정한 상태에서 `f`를 실행하고 원래 값으로 되돌립니다.
    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let saved: Vec<_> = ENV_KEYS.iter().map(|k| (*k, std::env::var(k).ok())).collect();
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let result = f();

        for (key, value) in saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
        result
    }

    fn write_toml(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("midas.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    const FILE_OVERRIDES: &str = r#"
[server]
port = 9000

[upstream]
news_lookback_days = 7

[cache]
quote_ttl_secs = 45
capacity = 64
"#;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = with_env(&[], || AppConfig::load(None).unwrap());
        assert_eq!(config.cache.quote_ttl_secs, 30);
        assert_eq!(config.cache.news_ttl_secs, 600);
        assert_eq!(config.upstream.base_url, FINNHUB_BASE_URL);
        assert_eq!(config.upstream.news_lookback_days, 5);
        assert_eq!(config.server.port, 8000);
        assert!(config.upstream.api_key.is_none());
        assert!(config.cors.origins.is_empty());
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let config = with_env(&[], || AppConfig::load(Some(&path)).unwrap());
        assert_eq!(config.cache.quote_ttl_secs, 30);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_toml(&dir, FILE_OVERRIDES);

        let config = with_env(&[], || AppConfig::load(Some(&path)).unwrap());
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.upstream.news_lookback_days, 7);
        assert_eq!(config.cache.quote_ttl_secs, 45);
        assert_eq!(config.cache.capacity, 64);
        // 파일에 없는 키는 기본값 유지
        assert_eq!(config.cache.news_ttl_secs, 600);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_prefixed_env_overrides_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_toml(&dir, FILE_OVERRIDES);

        let config = with_env(
            &[("MIDAS__CACHE__QUOTE_TTL_SECS", "5"), ("MIDAS__SERVER__PORT", "9200")],
            || AppConfig::load(Some(&path)).unwrap(),
        );
        assert_eq!(config.cache.quote_ttl_secs, 5);
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.cache.capacity, 64);
    }

    #[test]
    fn test_legacy_env_vars_applied() {
        let config = with_env(
            &[
                ("FINNHUB_API_KEY", "c123abc"),
                ("API_HOST", "0.0.0.0"),
                ("API_PORT", "9100"),
                ("CORS_ORIGINS", "http://localhost:5173, https://app.example.com,"),
            ],
            || AppConfig::load(None).unwrap(),
        );

        assert!(config.upstream.is_configured());
        assert_eq!(
            config.upstream.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("c123abc".to_string())
        );
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9100);
        assert_eq!(
            config.cors.origins,
            vec!["http://localhost:5173", "https://app.example.com"]
        );
    }

    #[test]
    fn test_legacy_port_wins_over_prefixed_env() {
        let config = with_env(
            &[("MIDAS__SERVER__PORT", "9200"), ("API_PORT", "9100")],
            || AppConfig::load(None).unwrap(),
        );
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_invalid_legacy_port_is_config_error() {
        let result = with_env(&[("API_PORT", "not-a-port")], || AppConfig::load(None));
        assert!(matches!(result, Err(crate::error::MidasError::Config(_))));
    }
}
