//! Canonical entity types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::normalize::fields::{pick_number_opt, pick_string, scalar_number};

/// Binary outcome side of a market token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// Anything mentioning "no" (any case) is the NO side, everything else is YES.
    pub fn classify(label: &str) -> Self {
        if label.to_ascii_uppercase().contains("NO") {
            Outcome::No
        } else {
            Outcome::Yes
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Yes => write!(f, "YES"),
            Outcome::No => write!(f, "NO"),
        }
    }
}

/// A single outcome token of a market.
///
/// `price` is `None` when no upstream price field existed, which is distinct
/// from a reported price of zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedToken {
    pub id: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Canonical prediction market
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMarket {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub title: String,
    pub end_date: Option<String>,
    #[serde(rename = "volume24h")]
    pub volume_24h: f64,
    pub liquidity: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tokens: Vec<NormalizedToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_yes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_no: Option<f64>,
}

impl NormalizedMarket {
    /// Price of the first token on the given side.
    pub fn token_price(tokens: &[NormalizedToken], outcome: Outcome) -> Option<f64> {
        tokens
            .iter()
            .find(|t| t.outcome == outcome)
            .and_then(|t| t.price)
    }

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// One point of an event-feed time series. Missing metrics were not reported.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GdeltSeriesPoint {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_events: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_sentiment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_impact: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_coverage: Option<f64>,
}

/// An event-feed record. Unrecognized upstream fields ride along in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GdeltEvent {
    #[serde(rename = "SQLDATE")]
    pub sql_date: String,
    #[serde(rename = "SOURCEURL")]
    pub source_url: String,
    #[serde(rename = "Actor1CountryCode", skip_serializing_if = "Option::is_none")]
    pub actor1_country_code: Option<String>,
    #[serde(rename = "Actor2CountryCode", skip_serializing_if = "Option::is_none")]
    pub actor2_country_code: Option<String>,
    #[serde(rename = "EventCode", skip_serializing_if = "Option::is_none")]
    pub event_code: Option<String>,
    #[serde(rename = "AvgTone", skip_serializing_if = "Option::is_none")]
    pub avg_tone: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Flattened time-series entry of an insights payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalEntry {
    pub label: String,
    pub value: f64,
}

/// Opaque aggregate bag returned next to event-feed items.
///
/// Only the totals, keyword matches and average tone are read as numbers;
/// everything else is handed out as raw JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GdeltInsights(pub Map<String, Value>);

impl GdeltInsights {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self(map.clone()),
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn total_events(&self) -> Option<f64> {
        pick_number_opt(&self.0, &["total_events"])
    }

    pub fn keyword_matches(&self) -> Option<f64> {
        pick_number_opt(&self.0, &["keyword_matches"])
    }

    pub fn avg_tone(&self) -> Option<f64> {
        self.0
            .get("sentiment_analysis")
            .and_then(Value::as_object)
            .and_then(|s| s.get("avg_tone"))
            .and_then(scalar_number)
    }

    pub fn spikes(&self) -> &[Value] {
        self.array_member(&["spikes"])
    }

    pub fn top_actors(&self) -> &[Value] {
        self.array_member(&["top_actors", "actor_counts"])
    }

    /// Leading actor pair, read from whichever shape the provider used.
    pub fn top_pair(&self) -> Option<String> {
        if let Some(pair) = pick_string(&self.0, &["top_pair"]) {
            return Some(pair);
        }
        let first = self.array_member(&["top_pairs", "actor_pairs", "leading_pairs"]).first()?;
        describe_pair(first)
    }

    fn array_member(&self, keys: &[&str]) -> &[Value] {
        keys.iter()
            .find_map(|k| self.0.get(*k).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn describe_pair(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(parts) => {
            let names: Vec<&str> = parts
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .collect();
            (!names.is_empty()).then(|| names.join("-"))
        }
        Value::Object(map) => pick_string(map, &["pair", "name", "label"]).or_else(|| {
            let a = pick_string(map, &["actor1", "Actor1CountryCode", "country1", "source"])?;
            let b = pick_string(map, &["actor2", "Actor2CountryCode", "country2", "target"])?;
            Some(format!("{a}-{b}"))
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_classification() {
        assert_eq!(Outcome::classify("No"), Outcome::No);
        assert_eq!(Outcome::classify("no"), Outcome::No);
        assert_eq!(Outcome::classify("Yes"), Outcome::Yes);
        assert_eq!(Outcome::classify("Trump"), Outcome::Yes);
        assert_eq!(Outcome::classify(""), Outcome::Yes);
    }

    #[test]
    fn test_market_serializes_camel_case() {
        let market = NormalizedMarket {
            id: "1".into(),
            slug: None,
            title: "T".into(),
            end_date: None,
            volume_24h: 3.0,
            liquidity: 0.0,
            status: "active".into(),
            category: None,
            tokens: vec![],
            price_yes: Some(0.4),
            price_no: None,
        };
        let v = serde_json::to_value(&market).unwrap();
        assert_eq!(v["volume24h"], json!(3.0));
        assert_eq!(v["endDate"], Value::Null);
        assert_eq!(v["priceYes"], json!(0.4));
        assert!(v.get("priceNo").is_none());
    }

    #[test]
    fn test_event_passthrough_serialization() {
        let mut extra = Map::new();
        extra.insert("NumMentions".into(), json!(12));
        let event = GdeltEvent {
            sql_date: "20250101".into(),
            source_url: "https://example.org/a".into(),
            avg_tone: Some(-2.5),
            extra,
            ..Default::default()
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["SQLDATE"], json!("20250101"));
        assert_eq!(v["NumMentions"], json!(12));
        assert_eq!(v["AvgTone"], json!(-2.5));
    }

    #[test]
    fn test_insights_accessors() {
        let insights = GdeltInsights::from_value(Some(&json!({
            "total_events": "120",
            "keyword_matches": 7,
            "sentiment_analysis": {"avg_tone": -1.25},
            "spikes": [{"date": "2024-01-02"}],
            "actor_counts": [{"actor": "USA", "count": 3}]
        })));
        assert_eq!(insights.total_events(), Some(120.0));
        assert_eq!(insights.keyword_matches(), Some(7.0));
        assert_eq!(insights.avg_tone(), Some(-1.25));
        assert_eq!(insights.spikes().len(), 1);
        assert_eq!(insights.top_actors().len(), 1);
        assert_eq!(insights.top_pair(), None);
    }

    #[test]
    fn test_top_pair_shapes() {
        let direct = GdeltInsights::from_value(Some(&json!({"top_pair": "USA-CHN"})));
        assert_eq!(direct.top_pair(), Some("USA-CHN".into()));

        let listed = GdeltInsights::from_value(Some(&json!({"top_pairs": ["RUS-UKR", "USA-CHN"]})));
        assert_eq!(listed.top_pair(), Some("RUS-UKR".into()));

        let objects = GdeltInsights::from_value(Some(&json!({
            "actor_pairs": [{"actor1": "ISR", "actor2": "IRN", "count": 4}]
        })));
        assert_eq!(objects.top_pair(), Some("ISR-IRN".into()));

        let tuples = GdeltInsights::from_value(Some(&json!({"leading_pairs": [["IND", "PAK"]]})));
        assert_eq!(tuples.top_pair(), Some("IND-PAK".into()));
    }

    #[test]
    fn test_non_object_insights_are_empty() {
        assert!(GdeltInsights::from_value(Some(&json!([1, 2]))).is_empty());
        assert!(GdeltInsights::from_value(None).is_empty());
    }
}
