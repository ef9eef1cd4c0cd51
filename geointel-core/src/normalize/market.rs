//! Prediction-market normalizer

use serde_json::{Map, Value};
use tracing::debug;

use super::fields::{pick_identity, pick_number, pick_string};
use super::tokens::normalize_tokens;
use crate::types::{NormalizedMarket, Outcome};

const ID_KEYS: &[&str] = &[
    "id", "marketId", "_id", "questionId", "question_id", "market_id", "slug",
];
const TITLE_KEYS: &[&str] = &["question", "title", "name", "slug"];
const END_DATE_KEYS: &[&str] = &["endDate", "endTime", "end_time", "closeTime"];

// More specific and more recent fields first; plain `volume` is the last resort.
const VOLUME_KEYS: &[&str] = &[
    "volume24hr",
    "volume24hrClob",
    "volume24hrAmm",
    "volume24h",
    "volume24hUsd",
    "volume_24h",
    "volume24Hr",
    "oneDayVolume",
    "volumeClob",
    "volumeAmm",
    "volumeNum",
    "volumeUsd",
    "volume",
];
const LIQUIDITY_KEYS: &[&str] = &[
    "liquidityClob",
    "liquidityAmm",
    "liquidityNum",
    "liquidityUsd",
    "liquidity",
];

const ENVELOPE_KEYS: &[&str] = &["markets", "data", "results"];
const NESTED_ENVELOPE_KEYS: &[&str] = &["data", "markets"];

/// Build a canonical market from a raw upstream object.
///
/// Returns `None` when no identity field resolves; that is the only
/// rejection path and callers filter it out.
pub fn normalize_market(raw: &Value) -> Option<NormalizedMarket> {
    let record = raw.as_object()?;

    let Some(id) = pick_identity(record, ID_KEYS) else {
        debug!("dropping market without identity fields");
        return None;
    };

    let title = pick_string(record, TITLE_KEYS).unwrap_or_else(|| format!("Market {id}"));
    let tokens = normalize_tokens(record);
    let price_yes = NormalizedMarket::token_price(&tokens, Outcome::Yes);
    let price_no = NormalizedMarket::token_price(&tokens, Outcome::No);

    Some(NormalizedMarket {
        slug: pick_string(record, &["slug"]),
        title,
        end_date: pick_string(record, END_DATE_KEYS),
        volume_24h: pick_number(record, VOLUME_KEYS),
        liquidity: pick_number(record, LIQUIDITY_KEYS),
        status: resolve_status(record),
        category: resolve_category(record),
        tokens,
        price_yes,
        price_no,
        id,
    })
}

fn resolve_status(record: &Map<String, Value>) -> String {
    if let Some(status) = pick_string(record, &["status", "state"]) {
        return status;
    }
    match record.get("active") {
        Some(Value::Bool(true)) => "active".to_string(),
        Some(Value::Bool(false)) => "inactive".to_string(),
        _ => "unknown".to_string(),
    }
}

fn resolve_category(record: &Map<String, Value>) -> Option<String> {
    pick_string(record, &["category"]).or_else(|| {
        record
            .get("categories")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Locate the market array inside a search response.
///
/// Accepts a bare array, an object holding it under `markets`/`data`/`results`,
/// or the same one level deeper under `data`/`markets`.
pub fn market_items(payload: &Value) -> &[Value] {
    if let Some(items) = payload.as_array() {
        return items;
    }
    let Some(envelope) = payload.as_object() else {
        return &[];
    };

    for key in ENVELOPE_KEYS {
        match envelope.get(*key) {
            Some(Value::Array(items)) => return items,
            Some(Value::Object(inner)) => {
                if let Some(items) = NESTED_ENVELOPE_KEYS
                    .iter()
                    .find_map(|k| inner.get(*k).and_then(Value::as_array))
                {
                    return items;
                }
            }
            _ => {}
        }
    }

    &[]
}

/// Normalize every market in a search response, dropping rejected records.
pub fn normalize_markets(payload: &Value) -> Vec<NormalizedMarket> {
    let items = market_items(payload);
    let markets: Vec<NormalizedMarket> = items.iter().filter_map(normalize_market).collect();
    if markets.len() < items.len() {
        debug!("normalized {} of {} markets", markets.len(), items.len());
    }
    markets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_envelope_with_underscore_id() {
        let payload = json!({
            "data": {"markets": [
                {"_id": "abc123", "question": "Nested market", "volume24h": "0", "liquidity": "0"}
            ]}
        });
        let markets = normalize_markets(&payload);
        assert_eq!(markets.len(), 1);
        let m = &markets[0];
        assert_eq!(m.id, "abc123");
        assert_eq!(m.title, "Nested market");
        assert_eq!(m.volume_24h, 0.0);
        assert_eq!(m.liquidity, 0.0);
        assert_eq!(m.status, "unknown");
        assert!(m.tokens.is_empty());
    }

    #[test]
    fn test_numeric_id_and_slug_title() {
        let m = normalize_market(&json!({"id": 123, "slug": "market-slug"})).unwrap();
        assert_eq!(m.id, "123");
        assert_eq!(m.title, "market-slug");
        assert_eq!(m.slug.as_deref(), Some("market-slug"));
    }

    #[test]
    fn test_rejects_market_without_identity() {
        assert!(normalize_market(&json!({"question": "Who?", "volume": 10})).is_none());
        assert!(normalize_market(&json!({"id": "   ", "marketId": null})).is_none());
        assert!(normalize_market(&json!("not an object")).is_none());
    }

    #[test]
    fn test_identity_priority() {
        let m = normalize_market(&json!({"slug": "s", "questionId": "q", "marketId": "m"})).unwrap();
        assert_eq!(m.id, "m");
        let m = normalize_market(&json!({"slug": "only-slug"})).unwrap();
        assert_eq!(m.id, "only-slug");
    }

    #[test]
    fn test_synthetic_title() {
        let m = normalize_market(&json!({"market_id": "x1", "question": " "})).unwrap();
        assert_eq!(m.title, "Market x1");
    }

    #[test]
    fn test_volume_alias_order_and_nested_wrapper() {
        let m = normalize_market(&json!({
            "id": 1,
            "volume": 999,
            "volume24hrClob": {"usd": "1520.5"},
            "liquidityNum": 250
        }))
        .unwrap();
        assert_eq!(m.volume_24h, 1520.5);
        assert_eq!(m.liquidity, 250.0);
    }

    #[test]
    fn test_status_and_category() {
        let m = normalize_market(&json!({"id": 1, "state": "closed", "active": true})).unwrap();
        assert_eq!(m.status, "closed");

        let m = normalize_market(&json!({"id": 1, "active": false, "categories": ["Politics", "World"]})).unwrap();
        assert_eq!(m.status, "inactive");
        assert_eq!(m.category.as_deref(), Some("Politics"));

        let m = normalize_market(&json!({"id": 1, "active": true, "category": "Sports"})).unwrap();
        assert!(m.is_active());
        assert_eq!(m.category.as_deref(), Some("Sports"));

        let m = normalize_market(&json!({"id": 1, "categories": [{"label": "x"}]})).unwrap();
        assert_eq!(m.category, None);
    }

    #[test]
    fn test_end_date_resolution() {
        let m = normalize_market(&json!({"id": 1, "closeTime": "2025-12-31T00:00:00Z"})).unwrap();
        assert_eq!(m.end_date.as_deref(), Some("2025-12-31T00:00:00Z"));
        let m = normalize_market(&json!({"id": 1})).unwrap();
        assert_eq!(m.end_date, None);
    }

    #[test]
    fn test_prices_rederive_from_tokens() {
        let m = normalize_market(&json!({
            "id": "p",
            "outcomes": "[\"Yes\",\"No\"]",
            "outcomePrices": "[\"0.81\",\"0.19\"]"
        }))
        .unwrap();
        assert_eq!(m.price_yes, Some(0.81));
        assert_eq!(m.price_no, Some(0.19));
        assert_eq!(NormalizedMarket::token_price(&m.tokens, Outcome::Yes), m.price_yes);
        assert_eq!(NormalizedMarket::token_price(&m.tokens, Outcome::No), m.price_no);
    }

    #[test]
    fn test_bad_outcome_string_does_not_fail_market() {
        let m = normalize_market(&json!({"id": "z", "outcomes": "{broken"})).unwrap();
        assert!(m.tokens.is_empty());
        assert_eq!(m.price_yes, None);
    }

    #[test]
    fn test_envelope_shapes() {
        let bare = json!([{"id": 1}, {"nope": true}]);
        assert_eq!(normalize_markets(&bare).len(), 1);

        let results = json!({"results": [{"id": 1}, {"id": 2}]});
        assert_eq!(normalize_markets(&results).len(), 2);

        let nested = json!({"markets": {"data": [{"id": "q"}]}});
        assert_eq!(normalize_markets(&nested)[0].id, "q");

        assert!(normalize_markets(&json!({"unexpected": []})).is_empty());
        assert!(normalize_markets(&json!(null)).is_empty());
    }
}
