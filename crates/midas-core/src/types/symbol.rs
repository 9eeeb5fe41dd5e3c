//! 심볼 정규화와 캐시 키.
//!
//! - `normalize_symbol` - 사용자 입력 심볼을 canonical 형식으로 변환
//! - `RequestKind` - 요청 카테고리 (시세 / 뉴스)
//! - `CacheKey` - 카테고리 + 심볼로 구성된 캐시 키

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MidasError, MidasResult};

/// 허용하는 심볼 최대 길이.
pub const MAX_SYMBOL_LEN: usize = 20;

/// 심볼에 허용되는 특수 문자 (BRK.B, BINANCE:BTCUSDT, ^GSPC 등).
const SYMBOL_PUNCTUATION: &[char] = &['.', '-', ':', '^', '=', '_', '/'];

/// 사용자 입력 심볼을 정규화합니다 (앞뒤 공백 제거 + 대문자).
///
/// # Errors
///
/// - 공백만 있거나 비어 있으면 `MidasError::SymbolRequired`
/// - 길이 초과 또는 허용되지 않는 문자가 있으면 `MidasError::InvalidSymbol`
///
/// # 예제
///
/// ```
/// use midas_core::normalize_symbol;
///
/// assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
/// assert!(normalize_symbol("   ").is_err());
/// ```
pub fn normalize_symbol(raw: &str) -> MidasResult<String> {
    let symbol = raw.trim().to_uppercase();

    if symbol.is_empty() {
        return Err(MidasError::SymbolRequired);
    }

    if symbol.chars().count() > MAX_SYMBOL_LEN {
        return Err(MidasError::InvalidSymbol(format!(
            "심볼은 {}자 이하여야 합니다: {}",
            MAX_SYMBOL_LEN, symbol
        )));
    }

    if let Some(bad) = symbol
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !SYMBOL_PUNCTUATION.contains(c))
    {
        return Err(MidasError::InvalidSymbol(format!(
            "허용되지 않는 문자 '{}': {}",
            bad, symbol
        )));
    }

    Ok(symbol)
}

/// 요청 카테고리.
///
/// 카테고리마다 독립된 캐시(키 공간, TTL)를 가집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// 현재 시세
    Quote,
    /// 회사 뉴스
    News,
}

impl RequestKind {
    /// 캐시 키 접두사.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Quote => "quote",
            RequestKind::News => "news",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 캐시 키.
///
/// 형식: `{kind}:{SYMBOL}` (예: `quote:AAPL`). 심볼은 이미 정규화되어 있어야 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// 카테고리와 정규화된 심볼로 키를 생성합니다.
    pub fn new(kind: RequestKind, symbol: &str) -> Self {
        Self(format!("{}:{}", kind.as_str(), symbol))
    }

    /// 시세 캐시 키.
    pub fn quote(symbol: &str) -> Self {
        Self::new(RequestKind::Quote, symbol)
    }

    /// 뉴스 캐시 키.
    pub fn news(symbol: &str) -> Self {
        Self::new(RequestKind::News, symbol)
    }

    /// 키 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("aapl").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("\tmsft\n").unwrap(), "MSFT");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert_eq!(normalize_symbol("binance:btcusdt").unwrap(), "BINANCE:BTCUSDT");
    }

    #[test]
    fn test_normalize_symbol_rejects_blank() {
        assert!(matches!(normalize_symbol(""), Err(MidasError::SymbolRequired)));
        assert!(matches!(normalize_symbol("   "), Err(MidasError::SymbolRequired)));
    }

    #[test]
    fn test_normalize_symbol_rejects_invalid() {
        assert!(matches!(
            normalize_symbol("AAPL MSFT"),
            Err(MidasError::InvalidSymbol(_))
        ));
        assert!(matches!(
            normalize_symbol("AAPL&token=x"),
            Err(MidasError::InvalidSymbol(_))
        ));
        assert!(matches!(
            normalize_symbol(&"A".repeat(MAX_SYMBOL_LEN + 1)),
            Err(MidasError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(CacheKey::quote("AAPL").as_str(), "quote:AAPL");
        assert_eq!(CacheKey::news("AAPL").to_string(), "news:AAPL");
        assert_ne!(CacheKey::quote("AAPL"), CacheKey::news("AAPL"));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "[ ]{0,3}[a-zA-Z0-9.]{1,15}[ ]{0,3}") {
            let once = normalize_symbol(&raw).unwrap();
            let twice = normalize_symbol(&once).unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.clone(), once.to_uppercase());
        }
    }
}
