//! 시세 및 뉴스 응답 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 현재 시세 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// 티커 심볼
    pub symbol: String,
    /// 현재가
    pub last: f64,
    /// 매수 호가 (Finnhub quote API는 제공하지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,
    /// 매도 호가 (Finnhub quote API는 제공하지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<f64>,
    /// 시가
    pub open: Option<f64>,
    /// 전일 종가
    pub prev_close: Option<f64>,
    /// 당일 고가
    pub high: Option<f64>,
    /// 당일 저가
    pub low: Option<f64>,
    /// 시세 시각 (epoch 초)
    pub ts: Option<i64>,
}

/// 뉴스 헤드라인.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub symbol: String,
    pub source: String,
    pub headline: String,
    pub url: String,
    pub datetime: DateTime<Utc>,
}

/// 뉴스 조회 응답.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsResponse {
    pub symbol: String,
    /// 최신순 헤드라인
    pub items: Vec<Headline>,
}

impl NewsResponse {
    /// 캐시된 전체 목록에서 앞쪽 `limit`개만 담아 응답을 생성합니다.
    pub fn from_cached(symbol: impl Into<String>, items: &[Headline], limit: usize) -> Self {
        Self {
            symbol: symbol.into(),
            items: items.iter().take(limit).cloned().collect(),
        }
    }
}

/// 헤드라인을 최신순으로 정렬합니다.
pub fn sort_newest_first(items: &mut [Headline]) {
    items.sort_by(|a, b| b.datetime.cmp(&a.datetime));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn headline(title: &str, secs: i64) -> Headline {
        Headline {
            symbol: "AAPL".to_string(),
            source: "Reuters".to_string(),
            headline: title.to_string(),
            url: String::new(),
            datetime: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut items = vec![headline("old", 100), headline("new", 300), headline("mid", 200)];
        sort_newest_first(&mut items);
        let titles: Vec<_> = items.iter().map(|h| h.headline.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_news_response_limit() {
        let items = vec![headline("a", 3), headline("b", 2), headline("c", 1)];
        let response = NewsResponse::from_cached("AAPL", &items, 2);
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].headline, "a");

        let response = NewsResponse::from_cached("AAPL", &items, 10);
        assert_eq!(response.items.len(), 3);
    }

    #[test]
    fn test_quote_omits_missing_bid_ask() {
        let quote = Quote {
            symbol: "AAPL".to_string(),
            last: 189.5,
            bid: None,
            ask: None,
            open: Some(187.0),
            prev_close: Some(186.2),
            high: Some(190.1),
            low: Some(186.9),
            ts: Some(1_700_000_000),
        };
        let json = serde_json::to_value(&quote).unwrap();
        assert!(json.get("bid").is_none());
        assert_eq!(json["last"], 189.5);
        assert_eq!(json["prev_close"], 186.2);
    }
}
