//! Event-feed client for all four query modes
//!
//! The feed is best-effort: an upstream 503 becomes an empty envelope
//! instead of an error.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{build_url, decode_response, Fetcher};
use crate::config::{DashboardConfig, ModeEndpoints};
use crate::error::{FeedError, FeedResult};
use crate::query::QuerySpec;

#[derive(Clone)]
pub struct GdeltClient {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
    endpoints: ModeEndpoints,
}

/// What the feed looks like when it has nothing to say.
pub fn empty_envelope() -> Value {
    json!({"data": [], "insights": {}})
}

impl GdeltClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &DashboardConfig) -> Self {
        Self {
            fetcher,
            base_url: config.gdelt_api_base.clone(),
            endpoints: config.mode_endpoints.clone(),
        }
    }

    /// Issue the request described by `spec`. Disabled specs are refused.
    pub async fn fetch(&self, spec: &QuerySpec, cancel: &CancellationToken) -> FeedResult<Value> {
        let Some(params) = spec.params.as_ref() else {
            return Err(FeedError::InvalidRequest {
                details: format!("{} query is disabled", spec.mode),
            });
        };

        let url = build_url(&self.base_url, self.endpoints.path(spec.mode), params)?;
        let response = self.fetcher.fetch(&url, cancel).await?;
        if cancel.is_cancelled() {
            return Err(FeedError::Cancelled);
        }

        match decode_response("event feed", response) {
            Err(err) if err.is_soft_fail() => {
                warn!("{} feed unavailable, serving empty result", spec.mode);
                Ok(empty_envelope())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::testing::ScriptedFetcher;
    use crate::query::QueryMode;

    fn spec(mode: QueryMode) -> QuerySpec {
        QuerySpec {
            mode,
            params: Some(vec![("start_date".into(), "20250101".into())]),
        }
    }

    fn client(fetcher: &ScriptedFetcher) -> GdeltClient {
        GdeltClient::new(Arc::new(fetcher.clone()), &DashboardConfig::default())
    }

    #[tokio::test]
    async fn test_503_soft_fails_in_every_mode() {
        let fetcher = ScriptedFetcher::new();
        for path in ["gdelt/context", "gdelt/country", "gdelt/bilateral", "gdelt/bilateral_conflict_coverage"] {
            fetcher.respond_raw(path, 503, "Service Unavailable");
        }
        let c = client(&fetcher);
        for mode in QueryMode::ALL {
            let body = c.fetch(&spec(mode), &CancellationToken::new()).await.unwrap();
            assert_eq!(body, empty_envelope());
        }
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let fetcher = ScriptedFetcher::new();
        fetcher.respond("gdelt/country", 500, json!({"status": "error", "message": "BigQuery quota"}));
        let err = client(&fetcher)
            .fetch(&spec(QueryMode::Country), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, FeedError::Upstream { status: 500, message: "BigQuery quota".into() });
    }

    #[tokio::test]
    async fn test_routes_by_mode_and_passes_params() {
        let fetcher = ScriptedFetcher::new();
        fetcher.respond("gdelt/bilateral_conflict_coverage", 200, json!({"data": [{"day": "20250102"}]}));
        let body = client(&fetcher)
            .fetch(&spec(QueryMode::Bbva), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body["data"][0]["day"], json!("20250102"));
        assert!(fetcher.calls()[0].ends_with("gdelt/bilateral_conflict_coverage?start_date=20250101"));
    }

    #[tokio::test]
    async fn test_disabled_spec_is_refused() {
        let fetcher = ScriptedFetcher::new();
        let err = client(&fetcher)
            .fetch(&QuerySpec { mode: QueryMode::Country, params: None }, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidRequest { .. }));
        assert_eq!(fetcher.hit_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_request_yields_no_result() {
        let fetcher = ScriptedFetcher::new();
        fetcher.hang("gdelt/context");
        let c = client(&fetcher);
        let cancel = CancellationToken::new();

        let pending = {
            let c = c.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { c.fetch(&spec(QueryMode::Context), &cancel).await })
        };
        tokio::task::yield_now().await;
        cancel.cancel();

        let result = pending.await.unwrap();
        assert_eq!(result, Err(FeedError::Cancelled));
    }
}
