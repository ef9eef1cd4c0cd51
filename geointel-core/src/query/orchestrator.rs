//! Multi-mode dashboard orchestrator
//!
//! Owns the mode state machine, the response cache and cancellation of
//! superseded requests. Every call takes the current [`FilterSnapshot`];
//! the orchestrator never reads UI state on its own.

use futures_util::future::join;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::{CacheLookup, QueryCache};
use super::filters::FilterSnapshot;
use super::health::{derive_health, Dataset, DatasetHealth};
use super::kpi::{Kpis, MarketSummary};
use super::merge::{merge_payload, MergedFeed};
use super::mode::{cache_key, ModeParams, ModeState, QueryMode, QuerySpec};
use super::status::{ActivitySnapshot, FetchActivity, QueryStatus};
use crate::config::DashboardConfig;
use crate::error::{FeedError, FeedResult};
use crate::feeds::{Fetcher, GdeltClient, MarketClient};
use crate::normalize::normalize_markets;
use crate::types::{GdeltEvent, NormalizedMarket};

const MARKETS_SCOPE: &str = "markets";

/// Hand-off target for entities the user opens
pub trait SidePanel: Send + Sync {
    fn show_event(&self, event: &GdeltEvent);
    fn show_market(&self, market_id: &str);
}

/// Side panel that only records the hand-off in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSidePanel;

impl SidePanel for LoggingSidePanel {
    fn show_event(&self, event: &GdeltEvent) {
        info!(
            "📰 Open event {} ({}) {}",
            event.sql_date,
            event.event_code.as_deref().unwrap_or("-"),
            event.source_url
        );
    }

    fn show_market(&self, market_id: &str) {
        info!("📈 Open market {}", market_id);
    }
}

/// Everything one dashboard render needs
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub mode: QueryMode,
    pub markets: QueryStatus<Vec<NormalizedMarket>>,
    pub feed: QueryStatus<MergedFeed>,
    pub kpis: Kpis,
    pub market_summary: MarketSummary,
    pub health: Vec<DatasetHealth>,
}

struct InFlight {
    id: u64,
    cancel: CancellationToken,
}

/// Background refetch of a stale entry, keyed by cache key
struct Revalidation {
    dataset: Dataset,
    id: u64,
    cancel: CancellationToken,
}

pub struct DashboardOrchestrator {
    markets: MarketClient,
    gdelt: GdeltClient,
    cache: QueryCache,
    modes: RwLock<ModeState>,
    in_flight: Mutex<HashMap<Dataset, InFlight>>,
    revalidations: Arc<Mutex<HashMap<String, Revalidation>>>,
    next_request: AtomicU64,
    activity: FetchActivity,
    side_panel: Arc<dyn SidePanel>,
    default_event_limit: u32,
    shutdown: CancellationToken,
}

impl DashboardOrchestrator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        config: &DashboardConfig,
        side_panel: Arc<dyn SidePanel>,
    ) -> Self {
        Self {
            markets: MarketClient::new(fetcher.clone(), config),
            gdelt: GdeltClient::new(fetcher, config),
            cache: QueryCache::new(config.cache_fresh_for),
            modes: RwLock::new(ModeState::default()),
            in_flight: Mutex::new(HashMap::new()),
            revalidations: Arc::new(Mutex::new(HashMap::new())),
            next_request: AtomicU64::new(0),
            activity: FetchActivity::default(),
            side_panel,
            default_event_limit: config.default_event_limit,
            shutdown: CancellationToken::new(),
        }
    }

    /// Activate a mode with new parameters. Any in-flight event-feed request
    /// for the previous configuration is cancelled.
    pub fn select_mode(&self, params: ModeParams) {
        let mode = params.mode();
        self.modes.write().select(params);
        self.cancel_in_flight(Dataset::Gdelt);
        info!("🔀 Query mode set to {}", mode);
    }

    /// Re-activate a mode with its retained parameters.
    pub fn resume_mode(&self, mode: QueryMode) {
        self.modes.write().resume(mode);
        self.cancel_in_flight(Dataset::Gdelt);
        info!("🔀 Query mode resumed: {}", mode);
    }

    pub fn mode_state(&self) -> ModeState {
        self.modes.read().clone()
    }

    pub fn query_specs(&self, filters: &FilterSnapshot) -> [QuerySpec; 4] {
        self.modes.read().query_specs(filters, self.default_event_limit)
    }

    /// Load both datasets, serving from cache where possible.
    pub async fn load(&self, filters: &FilterSnapshot) -> DashboardView {
        let spec = self.modes.read().active_spec(filters, self.default_event_limit);
        let (markets, feed) = join(self.load_markets(filters), self.load_feed(&spec)).await;
        self.compose(spec.mode, filters, markets, feed)
    }

    /// Drop cached responses for the enabled datasets and load again.
    /// Background refetches of the dropped entries are cancelled first.
    pub async fn refresh(&self, filters: &FilterSnapshot) -> DashboardView {
        if filters.datasets.markets {
            let prefix = format!("{MARKETS_SCOPE}?");
            self.cancel_revalidations(|key, _| key.starts_with(&prefix));
            self.cache.invalidate(&prefix);
        }
        if filters.datasets.gdelt {
            let mode = self.modes.read().active();
            let prefix = format!("{mode}?");
            self.cancel_revalidations(|key, _| key.starts_with(&prefix));
            self.cache.invalidate(&prefix);
        }
        info!("🔄 Refreshing enabled datasets");
        self.load(filters).await
    }

    pub fn open_event(&self, event: &GdeltEvent) {
        self.side_panel.show_event(event);
    }

    pub fn open_market(&self, market_id: &str) {
        self.side_panel.show_market(market_id.trim());
    }

    /// Fetch a single market for the detail view. A 503 is an error here.
    pub async fn market_detail(&self, market_id: &str) -> FeedResult<NormalizedMarket> {
        let cancel = self.shutdown.child_token();
        self.markets.detail(market_id, &cancel).await
    }

    pub fn activity(&self) -> ActivitySnapshot {
        self.activity.snapshot()
    }

    pub fn dataset_health(&self, filters: &FilterSnapshot, view: &DashboardView) -> Vec<DatasetHealth> {
        derive_health(&filters.datasets, self.activity(), &view.markets, &view.feed)
    }

    /// Cancel every in-flight and background request.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.in_flight.lock().clear();
        self.cancel_revalidations(|_, _| true);
    }

    async fn load_markets(&self, filters: &FilterSnapshot) -> QueryStatus<Vec<NormalizedMarket>> {
        if !filters.datasets.markets {
            return QueryStatus::Disabled;
        }

        let params = filters.market_search.clone();
        let key = cache_key(MARKETS_SCOPE, &params.to_params());
        let client = self.markets.clone();
        let result = self
            .fetch_cached(Dataset::Markets, key, move |cancel| async move {
                client.search_raw(&params, &cancel).await
            })
            .await;

        QueryStatus::from_result(result).map(|body| normalize_markets(&body))
    }

    async fn load_feed(&self, spec: &QuerySpec) -> QueryStatus<MergedFeed> {
        let Some(key) = spec.cache_key() else {
            return QueryStatus::Disabled;
        };

        let mode = spec.mode;
        let client = self.gdelt.clone();
        let request = spec.clone();
        let result = self
            .fetch_cached(Dataset::Gdelt, key, move |cancel| async move {
                client.fetch(&request, &cancel).await
            })
            .await;

        QueryStatus::from_result(result).map(|body| merge_payload(mode, &body))
    }

    /// Serve `key` from cache, refetching stale entries in the background;
    /// on a miss, run `fetch` as the dataset's current request.
    async fn fetch_cached<F, Fut>(&self, dataset: Dataset, key: String, fetch: F) -> FeedResult<Arc<Value>>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = FeedResult<Value>> + Send + 'static,
    {
        match self.cache.lookup(&key) {
            CacheLookup::Fresh(value) => {
                debug!("cache hit for {}", key);
                Ok(value)
            }
            CacheLookup::Stale(value) => {
                self.spawn_revalidation(dataset, key, fetch);
                Ok(value)
            }
            CacheLookup::Miss => {
                let (id, cancel) = self.begin_request(dataset);
                let result = {
                    let _busy = match dataset {
                        Dataset::Markets => self.activity.markets(),
                        _ => self.activity.gdelt(),
                    };
                    fetch(cancel.clone()).await
                };
                self.end_request(dataset, id);

                if cancel.is_cancelled() {
                    debug!("{} request for {} superseded", dataset, key);
                    return Err(FeedError::Cancelled);
                }
                match result {
                    Ok(value) => Ok(self.cache.store(&key, value)),
                    Err(err) => {
                        warn!("{} request failed: {}", dataset, err);
                        Err(err)
                    }
                }
            }
        }
    }

    fn spawn_revalidation<F, Fut>(&self, dataset: Dataset, key: String, fetch: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = FeedResult<Value>> + Send + 'static,
    {
        if !self.cache.begin_revalidation(&key) {
            return;
        }
        debug!("revalidating stale entry {}", key);

        let id = self.next_request.fetch_add(1, Ordering::SeqCst);
        let cancel = self.shutdown.child_token();
        self.revalidations
            .lock()
            .insert(key.clone(), Revalidation { dataset, id, cancel: cancel.clone() });

        let cache = self.cache.clone();
        let revalidations = self.revalidations.clone();
        tokio::spawn(async move {
            let result = fetch(cancel.clone()).await;

            // Whoever cancelled a revalidation also released its claim. The
            // store happens under the lock so a cancel cannot interleave.
            let mut running = revalidations.lock();
            if !running.get(&key).is_some_and(|r| r.id == id) {
                debug!("background refetch of {} superseded", key);
                return;
            }
            running.remove(&key);

            match result {
                Ok(value) if !cancel.is_cancelled() => {
                    cache.store(&key, value);
                }
                Ok(_) => {}
                Err(err) => debug!("background refetch of {} failed: {}", key, err),
            }
            cache.end_revalidation(&key);
        });
    }

    /// Cancel background refetches matching `matches` and release their claims.
    fn cancel_revalidations<P>(&self, matches: P)
    where
        P: Fn(&str, &Revalidation) -> bool,
    {
        let mut cancelled = Vec::new();
        self.revalidations.lock().retain(|key, revalidation| {
            if matches(key, revalidation) {
                cancelled.push((key.clone(), revalidation.cancel.clone()));
                false
            } else {
                true
            }
        });

        for (key, cancel) in cancelled {
            cancel.cancel();
            self.cache.end_revalidation(&key);
            debug!("cancelled background refetch of {}", key);
        }
    }

    /// Register a new request for `dataset`, cancelling the one it supersedes.
    fn begin_request(&self, dataset: Dataset) -> (u64, CancellationToken) {
        let id = self.next_request.fetch_add(1, Ordering::SeqCst);
        let cancel = self.shutdown.child_token();
        let previous = self
            .in_flight
            .lock()
            .insert(dataset, InFlight { id, cancel: cancel.clone() });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
        (id, cancel)
    }

    fn end_request(&self, dataset: Dataset, id: u64) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(&dataset).is_some_and(|current| current.id == id) {
            in_flight.remove(&dataset);
        }
    }

    /// Cancel the dataset's current request and any background refetch.
    fn cancel_in_flight(&self, dataset: Dataset) {
        if let Some(previous) = self.in_flight.lock().remove(&dataset) {
            previous.cancel.cancel();
        }
        self.cancel_revalidations(|_, revalidation| revalidation.dataset == dataset);
    }

    fn compose(
        &self,
        mode: QueryMode,
        filters: &FilterSnapshot,
        markets: QueryStatus<Vec<NormalizedMarket>>,
        feed: QueryStatus<MergedFeed>,
    ) -> DashboardView {
        let kpis = feed.ready().map(Kpis::from_feed).unwrap_or_default();
        let market_summary = markets
            .ready()
            .map(|m| MarketSummary::from_markets(m))
            .unwrap_or_default();
        let health = derive_health(&filters.datasets, self.activity(), &markets, &feed);

        DashboardView { mode, markets, feed, kpis, market_summary, health }
    }
}

impl Drop for DashboardOrchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
