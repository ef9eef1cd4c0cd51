//! Field resolution helpers for loosely-shaped upstream records
//!
//! Every helper here is total: unknown shapes degrade to `0`, `None` or an
//! empty string, never to a panic or an error.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Keys that usually hold the quantity when a provider wraps a number in an object.
pub const QUANTITY_KEYS: &[&str] = &[
    "usd", "value", "amount", "total", "sum", "num", "number", "count",
];

/// Upper bound on nested-object descent in [`extract_numeric_value`].
pub const MAX_SEARCH_DEPTH: usize = 8;

/// Coerce any JSON value to a finite number, falling back to `0`.
pub fn to_number(value: &Value) -> f64 {
    scalar_number(value).unwrap_or(0.0)
}

/// Finite number from a JSON number or a numeric string.
pub fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

fn parse_numeric_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Render a scalar as a non-empty string. Integral numbers print without a
/// fractional part so `123` and `123.0` both become `"123"`.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64().filter(|f| f.is_finite())?;
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
        }
        _ => None,
    }
}

/// First candidate key holding a non-empty (post-trim) string.
pub fn pick_string(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// First candidate key whose value converts to a non-empty string (numbers included).
pub fn pick_identity(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(value_to_string))
}

/// Like [`pick_number`] but reports "nothing resolved" as `None`.
///
/// An explicit `0` (number or `"0"`) is a resolved value, not a miss.
pub fn pick_number_opt(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = record.get(*key)?;
        match value {
            Value::Object(_) | Value::Array(_) => extract_numeric_value(value),
            other => scalar_number(other),
        }
    })
}

/// First candidate key that resolves to a number, or `0`.
pub fn pick_number(record: &Map<String, Value>, keys: &[&str]) -> f64 {
    pick_number_opt(record, keys).unwrap_or(0.0)
}

/// Depth-first search for a number inside a nested value.
///
/// Quantity-like keys are searched before any other property, then the
/// remaining properties in their upstream order. Returns `None` when the
/// whole subtree holds nothing numeric.
pub fn extract_numeric_value(value: &Value) -> Option<f64> {
    NumericSearch::default().run(value)
}

/// Explicit-stack walker so the descent is bounded and never revisits a node.
#[derive(Default)]
struct NumericSearch {
    visited: HashSet<usize>,
}

impl NumericSearch {
    fn run(&mut self, root: &Value) -> Option<f64> {
        let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

        while let Some((node, depth)) = stack.pop() {
            match node {
                Value::Number(_) | Value::String(_) => {
                    if let Some(n) = scalar_number(node) {
                        return Some(n);
                    }
                }
                Value::Object(map) => {
                    if depth >= MAX_SEARCH_DEPTH || !self.visited.insert(node as *const Value as usize) {
                        continue;
                    }
                    // Pushed in reverse so the preferred child is popped first.
                    let rest: Vec<&Value> = map
                        .iter()
                        .filter(|(k, _)| !QUANTITY_KEYS.contains(&k.as_str()))
                        .map(|(_, v)| v)
                        .collect();
                    for child in rest.into_iter().rev() {
                        stack.push((child, depth + 1));
                    }
                    for key in QUANTITY_KEYS.iter().rev() {
                        if let Some(child) = map.get(*key) {
                            stack.push((child, depth + 1));
                        }
                    }
                }
                Value::Array(items) => {
                    if depth >= MAX_SEARCH_DEPTH || !self.visited.insert(node as *const Value as usize) {
                        continue;
                    }
                    for child in items.iter().rev() {
                        stack.push((child, depth + 1));
                    }
                }
                Value::Null | Value::Bool(_) => {}
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_to_number_is_total() {
        assert_eq!(to_number(&json!(12.5)), 12.5);
        assert_eq!(to_number(&json!(" 42 ")), 42.0);
        assert_eq!(to_number(&json!("abc")), 0.0);
        assert_eq!(to_number(&json!("")), 0.0);
        assert_eq!(to_number(&json!("NaN")), 0.0);
        assert_eq!(to_number(&json!("inf")), 0.0);
        assert_eq!(to_number(&Value::Null), 0.0);
        assert_eq!(to_number(&json!(true)), 0.0);
        assert_eq!(to_number(&json!({"usd": 3})), 0.0);
        assert_eq!(to_number(&json!([1, 2])), 0.0);
    }

    #[test]
    fn test_pick_string_respects_priority_and_blanks() {
        let r = record(json!({"title": "  ", "name": "Second", "slug": "third"}));
        assert_eq!(pick_string(&r, &["question", "title", "name", "slug"]), Some("Second".into()));
        assert_eq!(pick_string(&r, &["missing"]), None);
    }

    #[test]
    fn test_pick_number_keeps_explicit_zero() {
        let r = record(json!({"volume24hr": "0", "volume": 900}));
        assert_eq!(pick_number(&r, &["volume24hr", "volume"]), 0.0);

        let r = record(json!({"volume24hr": 0, "volume": 900}));
        assert_eq!(pick_number(&r, &["volume24hr", "volume"]), 0.0);
    }

    #[test]
    fn test_pick_number_falls_through_unusable_values() {
        let r = record(json!({"a": null, "b": "n/a", "c": {"nothing": "here"}, "d": "7.5"}));
        assert_eq!(pick_number(&r, &["a", "b", "c", "d"]), 7.5);
        assert_eq!(pick_number(&r, &["missing"]), 0.0);
        assert_eq!(pick_number_opt(&r, &["a", "b"]), None);
    }

    #[test]
    fn test_extract_prefers_quantity_keys() {
        let v = json!({"meta": {"rank": 9}, "usd": 120});
        assert_eq!(extract_numeric_value(&v), Some(120.0));

        let v = json!({"meta": {"note": "x"}, "wrapper": {"amount": "55"}});
        assert_eq!(extract_numeric_value(&v), Some(55.0));
    }

    #[test]
    fn test_extract_walks_nested_quantity_first() {
        let v = json!({"value": {"inner": {"total": 4}}, "other": 1});
        assert_eq!(extract_numeric_value(&v), Some(4.0));
    }

    #[test]
    fn test_extract_returns_none_for_non_numeric_tree() {
        let v = json!({"a": {"b": {"c": "text"}}, "d": [null, true]});
        assert_eq!(extract_numeric_value(&v), None);
    }

    #[test]
    fn test_extract_depth_bound() {
        let mut v = json!(5);
        for _ in 0..(MAX_SEARCH_DEPTH + 2) {
            v = json!({ "nest": v });
        }
        assert_eq!(extract_numeric_value(&v), None);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!(123)), Some("123".into()));
        assert_eq!(value_to_string(&json!(123.0)), Some("123".into()));
        assert_eq!(value_to_string(&json!(1.5)), Some("1.5".into()));
        assert_eq!(value_to_string(&json!("  ")), None);
        assert_eq!(value_to_string(&json!(false)), None);
    }
}
