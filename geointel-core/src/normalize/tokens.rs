//! Outcome token normalization
//!
//! Providers ship identical outcome data either as an array of token objects
//! or as parallel JSON-encoded string arrays (`outcomes` + `outcomePrices`).
//! Both shapes come out as the same ordered list of [`NormalizedToken`].

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::fields::{pick_identity, pick_string, to_number, value_to_string};
use crate::types::{NormalizedToken, Outcome};

const TOKEN_ARRAY_KEYS: &[&str] = &["outcomes", "tokens", "outcomeTokens"];
const OUTCOME_NAME_KEYS: &[&str] = &["outcome", "name", "title"];
const PRICE_KEYS: &[&str] = &["price", "lastPrice", "mid"];
const BASE_ID_KEYS: &[&str] = &["id", "marketId", "questionId", "slug"];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonStringOrVec {
    JsonString(String),
    Vec(Vec<Value>),
}

impl JsonStringOrVec {
    fn into_vec(self, label: &'static str) -> Result<Vec<Value>, String> {
        match self {
            JsonStringOrVec::Vec(v) => Ok(v),
            JsonStringOrVec::JsonString(s) => serde_json::from_str::<Vec<Value>>(&s)
                .map_err(|e| format!("failed to parse {label} json-string field: {e}")),
        }
    }
}

/// Build the ordered token list for a raw market record.
pub fn normalize_tokens(raw: &Map<String, Value>) -> Vec<NormalizedToken> {
    if let Some(tokens) = tokens_from_objects(raw) {
        return tokens;
    }

    let parallel = match raw.get("outcomes") {
        Some(Value::String(encoded)) => Some(JsonStringOrVec::JsonString(encoded.clone())),
        Some(Value::Array(names)) if !names.is_empty() && names.iter().all(Value::is_string) => {
            Some(JsonStringOrVec::Vec(names.clone()))
        }
        _ => None,
    };

    if let Some(outcomes) = parallel {
        return match tokens_from_parallel_arrays(raw, outcomes) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("discarding outcome tokens: {}", e);
                Vec::new()
            }
        };
    }

    Vec::new()
}

fn tokens_from_objects(raw: &Map<String, Value>) -> Option<Vec<NormalizedToken>> {
    TOKEN_ARRAY_KEYS.iter().find_map(|key| {
        let items = raw.get(*key)?.as_array()?;
        if items.is_empty() {
            return None;
        }

        items
            .iter()
            .map(|item| {
                let obj = item.as_object()?;
                let id = obj.get("id").and_then(value_to_string)?;
                Some(token_from_object(id, obj))
            })
            .collect::<Option<Vec<_>>>()
    })
}

fn token_from_object(id: String, obj: &Map<String, Value>) -> NormalizedToken {
    let outcome = pick_string(obj, OUTCOME_NAME_KEYS)
        .map(|name| Outcome::classify(&name))
        .unwrap_or(Outcome::Yes);

    let price = PRICE_KEYS
        .iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
        .map(to_number);

    NormalizedToken { id, outcome, price }
}

fn tokens_from_parallel_arrays(
    raw: &Map<String, Value>,
    outcomes: JsonStringOrVec,
) -> Result<Vec<NormalizedToken>, String> {
    let outcomes = outcomes.into_vec("outcomes")?;

    let prices = match raw.get("outcomePrices") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value::<JsonStringOrVec>(value.clone())
            .map_err(|e| format!("unexpected outcomePrices shape: {e}"))?
            .into_vec("outcomePrices")?,
    };

    let base_id = pick_identity(raw, BASE_ID_KEYS).unwrap_or_else(|| "market".to_string());

    Ok(outcomes
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let label = value_to_string(name).unwrap_or_default();
            NormalizedToken {
                id: format!("{base_id}-{index}"),
                outcome: if label.is_empty() { Outcome::Yes } else { Outcome::classify(&label) },
                price: prices.get(index).filter(|v| !v.is_null()).map(to_number),
            }
        })
        .collect())
}
