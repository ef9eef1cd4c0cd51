//! Upstream feed clients
//!
//! The network itself sits behind [`Fetcher`] so the clients, and everything
//! above them, can run against a scripted fetcher in tests.

pub mod markets;
pub mod gdelt;

pub use markets::MarketClient;
pub use gdelt::GdeltClient;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{FeedError, FeedResult};

pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Raw response handed back by a [`Fetcher`]
#[derive(Clone, Debug, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Proxying fetch capability supplied by the host
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, giving up with [`FeedError::Cancelled`] once `cancel` fires.
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> FeedResult<FetchResponse>;
}

/// `reqwest`-backed fetcher
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> FeedResult<FetchResponse> {
        debug!("GET {}", url);
        let request = async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, FeedError>(FetchResponse { status, body })
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(FeedError::Cancelled),
            result = request => result,
        }
    }
}

/// Turn a raw response into JSON, mapping failures onto [`FeedError`].
///
/// A 503 is always reported as [`FeedError::ServiceUnavailable`]; whether that
/// is fatal is the caller's decision.
pub fn decode_response(service: &str, response: FetchResponse) -> FeedResult<Value> {
    if response.status == SERVICE_UNAVAILABLE {
        return Err(FeedError::ServiceUnavailable { service: service.to_string() });
    }

    if !response.is_success() {
        return Err(FeedError::Upstream {
            status: response.status,
            message: error_message(&response),
        });
    }

    Ok(serde_json::from_str(&response.body)?)
}

fn error_message(response: &FetchResponse) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&response.body) {
        for key in ["message", "error", "detail"] {
            if let Some(Value::String(msg)) = map.get(key) {
                if !msg.trim().is_empty() {
                    return msg.trim().to_string();
                }
            }
        }
    }

    let raw = response.body.trim();
    if raw.is_empty() {
        format!("Request failed with status {}", response.status)
    } else {
        raw.to_string()
    }
}

/// Join `path` onto `base` and attach query parameters.
pub fn build_url(base: &str, path: &str, params: &[(String, String)]) -> FeedResult<Url> {
    let mut url = Url::parse(base)?.join(path)?;
    if !params.is_empty() {
        let mut qp = url.query_pairs_mut();
        for (key, value) in params {
            qp.append_pair(key, value);
        }
    }
    Ok(url)
}
