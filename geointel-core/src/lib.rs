//! Geopolitical Intelligence Dashboard Core
//!
//! Normalizes loosely-shaped prediction-market and event-feed payloads into
//! canonical entities, and orchestrates the four event-feed query modes
//! behind a cached, cancellable query layer.

pub mod config;
pub mod error;
pub mod feeds;
pub mod logging;
pub mod normalize;
pub mod query;
pub mod types;

// Re-export main types for easy access
pub use config::{ConfigError, DashboardConfig, ModeEndpoints};
pub use error::{ErrorKind, FeedError, FeedResult};
pub use feeds::{Fetcher, FetchResponse, GdeltClient, HttpFetcher, MarketClient};
pub use logging::init_tracing;
pub use query::{
    DashboardOrchestrator, DashboardView, DatasetToggles, DateRange, DateRangePreset,
    FilterSnapshot, LoggingSidePanel, MarketSearchParams, ModeParams, QueryMode, QueryStatus,
    SidePanel,
};
pub use types::{
    GdeltEvent, GdeltInsights, GdeltSeriesPoint, NormalizedMarket, NormalizedToken, Outcome,
    TemporalEntry,
};
