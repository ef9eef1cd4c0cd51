//! Insight time-series flattening
//!
//! Providers nest the insight time series under any mix of `series`,
//! `timeline` and `data`. The unwrap below is structural: it does not care
//! which nesting was used, only where the entry-like records end up.

use serde_json::{Map, Value};

use super::fields::{pick_number_opt, pick_string};
use crate::types::TemporalEntry;

const CONTAINER_KEYS: &[&str] = &["series", "timeline", "data"];
const LABEL_KEYS: &[&str] = &["date", "label", "name"];
const VALUE_KEYS: &[&str] = &["count", "value", "total"];

/// Nesting bound for the structural unwrap.
const MAX_UNWRAP_DEPTH: usize = 12;

/// Flatten the insight time series into `{label, value}` entries.
///
/// `temporal_distribution` is read first; `timeline` is the fallback when the
/// primary field yields nothing.
pub fn to_temporal_entries(insights: &Value) -> Vec<TemporalEntry> {
    let Some(map) = insights.as_object() else {
        return Vec::new();
    };

    ["temporal_distribution", "timeline"]
        .iter()
        .filter_map(|field| map.get(*field))
        .map(entries_from_node)
        .find(|entries| !entries.is_empty())
        .unwrap_or_default()
}

/// Flatten an arbitrary node and map its records to entries.
pub fn entries_from_node(node: &Value) -> Vec<TemporalEntry> {
    flatten(node, 0).into_iter().filter_map(to_entry).collect()
}

fn flatten(node: &Value, depth: usize) -> Vec<&Value> {
    if depth > MAX_UNWRAP_DEPTH {
        return Vec::new();
    }

    match node {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if is_container(item) {
                    out.extend(flatten(item, depth + 1));
                } else {
                    out.push(item);
                }
            }
            out
        }
        Value::Object(map) => {
            let present: Vec<&Value> = CONTAINER_KEYS.iter().filter_map(|k| map.get(*k)).collect();
            if present.is_empty() {
                return map.values().collect();
            }
            present
                .into_iter()
                .map(|child| flatten(child, depth + 1))
                .find(|candidates| !candidates.is_empty())
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// A wrapper node rather than an entry: it has a container key and no label.
fn is_container(item: &Value) -> bool {
    match item.as_object() {
        Some(map) => {
            CONTAINER_KEYS.iter().any(|k| map.contains_key(*k))
                && !LABEL_KEYS.iter().any(|k| map.contains_key(*k))
        }
        None => false,
    }
}

fn to_entry(item: &Value) -> Option<TemporalEntry> {
    let record: &Map<String, Value> = item.as_object()?;
    let label = pick_string(record, LABEL_KEYS)?;
    let value = pick_number_opt(record, VALUE_KEYS)?;
    Some(TemporalEntry { label, value })
}
