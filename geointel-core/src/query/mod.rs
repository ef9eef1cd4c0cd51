//! Query layer: filters, modes, caching and the dashboard orchestrator

pub mod cache;
pub mod filters;
pub mod health;
pub mod kpi;
pub mod merge;
pub mod mode;
pub mod orchestrator;
pub mod status;

pub use cache::{CacheLookup, QueryCache};
pub use filters::{DateRange, DateRangePreset, DatasetToggles, FilterSnapshot, MarketSearchParams};
pub use health::{derive_health, Dataset, DatasetHealth, HealthStatus};
pub use kpi::{Kpis, MarketSummary};
pub use merge::{merge_payload, Aggregation, MergedFeed};
pub use mode::{
    BbvaParams, BilateralParams, ContextParams, CountryParams, ModeParams, ModeState, QueryMode,
    QuerySpec,
};
pub use orchestrator::{DashboardOrchestrator, DashboardView, LoggingSidePanel, SidePanel};
pub use status::{ActivitySnapshot, FetchActivity, QueryStatus};
