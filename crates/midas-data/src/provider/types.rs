//! Finnhub 원시 응답 타입과 응답 모델 변환.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use midas_core::{Headline, Quote};
use serde::Deserialize;
use serde_json::Value;

/// `/quote` 원시 응답.
///
/// 모든 필드가 누락되거나 `null`일 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawQuote {
    /// 현재가
    #[serde(default)]
    pub c: Option<f64>,
    /// 시가
    #[serde(default)]
    pub o: Option<f64>,
    /// 전일 종가
    #[serde(default)]
    pub pc: Option<f64>,
    /// 고가
    #[serde(default)]
    pub h: Option<f64>,
    /// 저가
    #[serde(default)]
    pub l: Option<f64>,
    /// 시각 (epoch 초)
    #[serde(default)]
    pub t: Option<i64>,
}

impl RawQuote {
    /// 응답 모델로 변환. 누락된 가격은 0.0, 시각은 0.
    pub fn into_quote(self, symbol: &str) -> Quote {
        let or_zero = |v: Option<f64>| Some(v.unwrap_or(0.0));
        Quote {
            symbol: symbol.to_string(),
            last: self.c.unwrap_or(0.0),
            bid: None,
            ask: None,
            open: or_zero(self.o),
            prev_close: or_zero(self.pc),
            high: or_zero(self.h),
            low: or_zero(self.l),
            ts: Some(self.t.unwrap_or(0)),
        }
    }
}

/// `/company-news` 원시 항목.
///
/// 제공처마다 필드 이름과 타입이 달라 모든 필드를 `Value`로 받고,
/// 변환할 때 문자열로 맞춥니다. 항목 하나의 타입이 어긋나도 목록 전체가 실패하지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNewsItem {
    #[serde(default)]
    pub datetime: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub published_time: Option<Value>,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub site: Option<Value>,
    #[serde(default)]
    pub headline: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub url: Option<Value>,
}

impl RawNewsItem {
    /// 헤드라인으로 변환. 시각을 해석할 수 없으면 `now`를 사용합니다.
    pub fn into_headline(self, symbol: &str, now: DateTime<Utc>) -> Headline {
        let raw_time = [&self.datetime, &self.time, &self.published_time]
            .into_iter()
            .flatten()
            .find(|v| is_present(v));

        Headline {
            symbol: symbol.to_string(),
            source: first_text([&self.source, &self.site]).unwrap_or_else(|| "unknown".to_string()),
            headline: first_text([&self.headline, &self.title]).unwrap_or_default(),
            url: first_text([&self.url]).unwrap_or_default(),
            datetime: raw_time.and_then(parse_timestamp).unwrap_or(now),
        }
    }
}

/// `null`, 0, 빈 문자열은 값이 없는 것으로 취급.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// 값이 있는 첫 후보를 문자열로 변환.
fn first_text<const N: usize>(candidates: [&Option<Value>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|v| is_present(v))
        .map(value_to_text)
}

/// 문자열은 그대로, 그 외 값은 JSON 표기로.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// epoch 초(숫자 또는 숫자 문자열) 또는 ISO-8601 문자열을 해석.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_opt(secs, 0).single()
        }
        Value::String(s) => {
            let s = s.trim();
            if s.chars().all(|c| c.is_ascii_digit()) {
                let secs = s.parse::<i64>().ok()?;
                return Utc.timestamp_opt(secs, 0).single();
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            // 시간대 없는 ISO 형식은 UTC로 간주
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}
