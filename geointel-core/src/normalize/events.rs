//! Event-feed record extraction
//!
//! Each raw item from any event-feed mode is mapped to a series point and an
//! event. The extractor is mode-agnostic: it just tries every known alias.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::fields::{pick_identity, pick_number_opt, pick_string, scalar_number, value_to_string};
use crate::types::{GdeltEvent, GdeltSeriesPoint};

const DATE_KEYS: &[&str] = &["DayDate", "SQLDATE", "date", "day", "timestamp"];
const CONFLICT_KEYS: &[&str] = &["conflict_events", "total_events", "event_count", "count", "value"];
const SENTIMENT_KEYS: &[&str] = &["avg_sentiment", "avg_tone", "AvgTone", "tone", "sentiment"];
const IMPACT_KEYS: &[&str] = &["avg_impact", "avg_goldstein", "GoldsteinScale", "impact"];
const INTERACTION_KEYS: &[&str] = &["interaction_count", "interactions", "total_interactions", "NumMentions"];
const COVERAGE_KEYS: &[&str] = &["relative_coverage", "coverage", "coverage_ratio", "share"];

const SOURCE_URL_KEYS: &[&str] = &["SOURCEURL", "source_url", "sourceUrl", "url"];
const ACTOR1_KEYS: &[&str] = &["Actor1CountryCode", "actor1_country_code", "actor1", "country1"];
const ACTOR2_KEYS: &[&str] = &["Actor2CountryCode", "actor2_country_code", "actor2", "country2"];
const EVENT_CODE_KEYS: &[&str] = &["EventCode", "event_code", "cameo_code"];
const TONE_KEYS: &[&str] = &["AvgTone", "avg_tone", "tone"];

/// Fields consumed into the typed part of [`GdeltEvent`]; everything else is passed through.
const TYPED_EVENT_KEYS: &[&str] = &["SQLDATE", "SOURCEURL", "Actor1CountryCode", "Actor2CountryCode", "EventCode", "AvgTone"];

// Epoch values above this are milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// Normalize any supported date representation to `YYYY-MM-DD`, or `""`.
pub fn normalize_date(value: &Value) -> String {
    match value {
        Value::String(s) => normalize_date_str(s.trim()),
        Value::Number(_) => {
            let Some(raw) = value_to_string(value) else {
                return String::new();
            };
            if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
                return normalize_date_str(&raw);
            }
            scalar_number(value).map(from_epoch).unwrap_or_default()
        }
        _ => String::new(),
    }
}

fn normalize_date_str(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
    }

    parse_generic_date(s)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_generic_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y%m%d%H%M%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn from_epoch(n: f64) -> String {
    let millis = if n.abs() >= EPOCH_MILLIS_THRESHOLD { n } else { n * 1000.0 };
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Date of a raw item, trying each mode's date field in priority order.
pub fn resolve_date(record: &Map<String, Value>) -> String {
    DATE_KEYS
        .iter()
        .find_map(|k| record.get(*k).filter(|v| !v.is_null()))
        .map(normalize_date)
        .unwrap_or_default()
}

pub fn extract_series_point(item: &Value) -> Option<GdeltSeriesPoint> {
    let record = item.as_object()?;
    Some(GdeltSeriesPoint {
        date: resolve_date(record),
        conflict_events: pick_number_opt(record, CONFLICT_KEYS),
        avg_sentiment: pick_number_opt(record, SENTIMENT_KEYS),
        avg_impact: pick_number_opt(record, IMPACT_KEYS),
        interaction_count: pick_number_opt(record, INTERACTION_KEYS),
        relative_coverage: pick_number_opt(record, COVERAGE_KEYS),
    })
}

pub fn extract_event(item: &Value) -> Option<GdeltEvent> {
    let record = item.as_object()?;

    let sql_date = pick_identity(record, &["SQLDATE", "DayDate", "date", "day"]).unwrap_or_default();
    let extra = record
        .iter()
        .filter(|(k, _)| !TYPED_EVENT_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Some(GdeltEvent {
        sql_date,
        source_url: pick_string(record, SOURCE_URL_KEYS).unwrap_or_default(),
        actor1_country_code: pick_string(record, ACTOR1_KEYS),
        actor2_country_code: pick_string(record, ACTOR2_KEYS),
        event_code: pick_identity(record, EVENT_CODE_KEYS),
        avg_tone: pick_number_opt(record, TONE_KEYS),
        extra,
    })
}

/// Map raw items to series points and events in one pass.
pub fn extract_all(items: &[Value]) -> (Vec<GdeltSeriesPoint>, Vec<GdeltEvent>) {
    let series = items.iter().filter_map(extract_series_point).collect();
    let events = items.iter().filter_map(extract_event).collect();
    (series, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_date() {
        assert_eq!(normalize_date(&json!("20250831")), "2025-08-31");
        assert_eq!(normalize_date(&json!(20250831)), "2025-08-31");
    }

    #[test]
    fn test_unparsable_dates_are_empty() {
        assert_eq!(normalize_date(&json!("not-a-date")), "");
        assert_eq!(normalize_date(&json!("20251399")), "");
        assert_eq!(normalize_date(&json!("")), "");
        assert_eq!(normalize_date(&json!(null)), "");
        assert_eq!(normalize_date(&json!({"d": 1})), "");
    }

    #[test]
    fn test_generic_date_formats() {
        assert_eq!(normalize_date(&json!("2024-05-06")), "2024-05-06");
        assert_eq!(normalize_date(&json!("2024-05-06T13:45:00Z")), "2024-05-06");
        assert_eq!(normalize_date(&json!("2024-05-06 13:45:00")), "2024-05-06");
        assert_eq!(normalize_date(&json!("2024/05/06")), "2024-05-06");
        assert_eq!(normalize_date(&json!("20240506134500")), "2024-05-06");
    }

    #[test]
    fn test_epoch_timestamps() {
        assert_eq!(normalize_date(&json!(1_700_000_000)), "2023-11-14");
        assert_eq!(normalize_date(&json!(1_700_000_000_000_i64)), "2023-11-14");
    }

    #[test]
    fn test_date_field_priority() {
        let point = extract_series_point(&json!({
            "date": "2020-01-01",
            "DayDate": "20240102",
            "conflict_events": 3
        }))
        .unwrap();
        assert_eq!(point.date, "2024-01-02");
    }

    #[test]
    fn test_series_metrics_are_independently_optional() {
        let point = extract_series_point(&json!({
            "day": "2024-01-05",
            "total_events": "12",
            "avg_tone": -3.5,
            "relative_coverage": 0.02
        }))
        .unwrap();
        assert_eq!(point.date, "2024-01-05");
        assert_eq!(point.conflict_events, Some(12.0));
        assert_eq!(point.avg_sentiment, Some(-3.5));
        assert_eq!(point.avg_impact, None);
        assert_eq!(point.interaction_count, None);
        assert_eq!(point.relative_coverage, Some(0.02));
    }

    #[test]
    fn test_event_extraction_with_passthrough() {
        let event = extract_event(&json!({
            "SQLDATE": 20240301,
            "SOURCEURL": "https://news.example/story",
            "Actor1CountryCode": "USA",
            "Actor2CountryCode": "",
            "EventCode": 190,
            "AvgTone": "-4.2",
            "NumArticles": 8
        }))
        .unwrap();
        assert_eq!(event.sql_date, "20240301");
        assert_eq!(event.source_url, "https://news.example/story");
        assert_eq!(event.actor1_country_code.as_deref(), Some("USA"));
        assert_eq!(event.actor2_country_code, None);
        assert_eq!(event.event_code.as_deref(), Some("190"));
        assert_eq!(event.avg_tone, Some(-4.2));
        assert_eq!(event.extra.get("NumArticles"), Some(&json!(8)));
        assert!(event.extra.get("SQLDATE").is_none());
    }

    #[test]
    fn test_extract_all_skips_non_objects() {
        let items = vec![json!({"date": "2024-01-01", "count": 1}), json!(42), json!(null)];
        let (series, events) = extract_all(&items);
        assert_eq!(series.len(), 1);
        assert_eq!(events.len(), 1);
        assert_eq!(series[0].conflict_events, Some(1.0));
        assert_eq!(events[0].source_url, "");
    }
}
