//! Prediction-market search and detail client
//!
//! Market data is not optional for the views that request it, so an upstream
//! 503 is a hard failure here.

use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{build_url, decode_response, Fetcher};
use crate::config::DashboardConfig;
use crate::error::{FeedError, FeedResult};
use crate::normalize::{normalize_market, normalize_markets};
use crate::query::filters::MarketSearchParams;
use crate::types::NormalizedMarket;

#[derive(Clone)]
pub struct MarketClient {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
    search_path: String,
    detail_path: String,
}

impl MarketClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &DashboardConfig) -> Self {
        Self {
            fetcher,
            base_url: config.market_api_base.clone(),
            search_path: config.market_search_path.clone(),
            detail_path: config.market_detail_path.clone(),
        }
    }

    /// Raw search response body, before normalization.
    pub async fn search_raw(
        &self,
        params: &MarketSearchParams,
        cancel: &CancellationToken,
    ) -> FeedResult<Value> {
        let url = build_url(&self.base_url, &self.search_path, &params.to_params())?;
        let response = self.fetcher.fetch(&url, cancel).await?;
        if cancel.is_cancelled() {
            return Err(FeedError::Cancelled);
        }
        decode_response("market search", response)
    }

    pub async fn search(
        &self,
        params: &MarketSearchParams,
        cancel: &CancellationToken,
    ) -> FeedResult<Vec<NormalizedMarket>> {
        let payload = self.search_raw(params, cancel).await?;
        let markets = normalize_markets(&payload);
        debug!("market search returned {} markets", markets.len());
        Ok(markets)
    }

    pub async fn detail(&self, id: &str, cancel: &CancellationToken) -> FeedResult<NormalizedMarket> {
        let id = id.trim();
        if id.is_empty() {
            return Err(FeedError::InvalidRequest { details: "empty market id".to_string() });
        }

        let path = format!("{}{}", self.detail_path, id);
        let url = build_url(&self.base_url, &path, &[])?;
        let response = self.fetcher.fetch(&url, cancel).await?;
        if cancel.is_cancelled() {
            return Err(FeedError::Cancelled);
        }
        let payload = decode_response("market detail", response)?;

        detail_candidates(&payload)
            .into_iter()
            .find_map(normalize_market)
            .ok_or_else(|| FeedError::InvalidPayload(format!("market {id} has no usable identity")))
    }
}

/// The market object itself, or the same wrapped under `market`/`data`.
fn detail_candidates(payload: &Value) -> Vec<&Value> {
    let mut candidates = Vec::new();
    if let Some(map) = payload.as_object() {
        for key in ["market", "data"] {
            match map.get(key) {
                Some(inner) if inner.is_object() => candidates.push(inner),
                Some(Value::Array(items)) => candidates.extend(items.first()),
                _ => {}
            }
        }
    }
    candidates.push(payload);
    candidates
}
