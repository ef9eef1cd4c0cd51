//! Uniform `{series, events, insights, aggregation}` view over every mode

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::mode::QueryMode;
use crate::normalize::{
    extract_all, extract_event, extract_series_point, normalize_date, to_temporal_entries,
};
use crate::types::{GdeltEvent, GdeltInsights, GdeltSeriesPoint};

const ITEM_KEYS: &[&str] = &["data", "results", "series", "events"];
const AGGREGATION_KEYS: &[&str] = &["aggregation", "granularity", "time_unit"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Daily,
    /// Provider degraded to monthly buckets
    Monthly,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedFeed {
    pub series: Vec<GdeltSeriesPoint>,
    pub events: Vec<GdeltEvent>,
    pub insights: GdeltInsights,
    pub aggregation: Aggregation,
}

impl MergedFeed {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.events.is_empty() && self.insights.is_empty()
    }
}

/// Merge a raw event-feed body into the uniform shape.
pub fn merge_payload(mode: QueryMode, body: &Value) -> MergedFeed {
    let Some(envelope) = body.as_object() else {
        // A bare array is the item list itself
        let (series, events) = body.as_array().map(|items| extract_all(items)).unwrap_or_default();
        return MergedFeed { series, events, ..Default::default() };
    };

    let insights = GdeltInsights::from_value(envelope.get("insights"));
    let aggregation = detect_aggregation(envelope);

    let (series, events) = match mode {
        QueryMode::Context => merge_context(envelope, &insights),
        _ => items(envelope).map(extract_all).unwrap_or_default(),
    };

    MergedFeed { series, events, insights, aggregation }
}

/// Context rows are events, never series points. The series comes from a
/// pre-split `series` array when present, else from the insights timeline.
fn merge_context(
    envelope: &Map<String, Value>,
    insights: &GdeltInsights,
) -> (Vec<GdeltSeriesPoint>, Vec<GdeltEvent>) {
    let array = |key: &str| envelope.get(key).and_then(Value::as_array);

    let events = array("events")
        .or_else(|| array("data"))
        .map(|items| items.iter().filter_map(extract_event).collect())
        .unwrap_or_default();

    let series = match array("series") {
        Some(items) => items.iter().filter_map(extract_series_point).collect(),
        None => timeline_series(insights),
    };
    (series, events)
}

fn timeline_series(insights: &GdeltInsights) -> Vec<GdeltSeriesPoint> {
    to_temporal_entries(&Value::Object(insights.as_map().clone()))
        .into_iter()
        .map(|entry| GdeltSeriesPoint {
            date: match normalize_date(&Value::String(entry.label.clone())) {
                d if d.is_empty() => entry.label,
                d => d,
            },
            conflict_events: Some(entry.value),
            ..Default::default()
        })
        .collect()
}

fn items(envelope: &Map<String, Value>) -> Option<&[Value]> {
    ITEM_KEYS
        .iter()
        .find_map(|k| envelope.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
}

fn detect_aggregation(envelope: &Map<String, Value>) -> Aggregation {
    let monthly = AGGREGATION_KEYS.iter().any(|k| {
        envelope
            .get(*k)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_ascii_lowercase().contains("month"))
    });
    if monthly {
        Aggregation::Monthly
    } else {
        Aggregation::Daily
    }
}
