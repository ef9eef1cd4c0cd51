//! Immutable snapshot of the UI filter state
//!
//! The orchestrator never reads ambient state; every invocation receives one
//! of these by reference.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// Far beyond any window the feeds accept; keeps `Duration::days` in range.
const MAX_SPAN_DAYS: i64 = 365 * 10_000;

/// Inclusive date range sent to the event feed as `YYYYMMDD`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Quick-select ranges offered by the date picker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRangePreset {
    Last7Days,
    Last30Days,
    Last90Days,
    LastYear,
}

impl DateRangePreset {
    pub fn days(&self) -> i64 {
        match self {
            DateRangePreset::Last7Days => 7,
            DateRangePreset::Last30Days => 30,
            DateRangePreset::Last90Days => 90,
            DateRangePreset::LastYear => 365,
        }
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// The `days`-long window ending on `today`. Spans past the calendar
    /// start are clipped to the earliest representable date.
    pub fn last_days(days: i64, today: NaiveDate) -> Self {
        let span = days.clamp(1, MAX_SPAN_DAYS);
        let start = today
            .checked_sub_signed(Duration::days(span - 1))
            .unwrap_or(NaiveDate::MIN);
        Self::new(start, today)
    }

    pub fn from_preset(preset: DateRangePreset, today: NaiveDate) -> Self {
        Self::last_days(preset.days(), today)
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y%m%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y%m%d").to_string()
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        vec![
            ("start_date".to_string(), self.start_param()),
            ("end_date".to_string(), self.end_param()),
        ]
    }
}

/// Dataset on/off toggles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetToggles {
    pub markets: bool,
    pub gdelt: bool,
    pub twitter: bool,
}

impl Default for DatasetToggles {
    fn default() -> Self {
        Self {
            markets: true,
            gdelt: true,
            twitter: false,
        }
    }
}

/// Market search parameters (single page only)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub limit: u32,
    pub page: u32,
    pub active_only: bool,
}

impl Default for MarketSearchParams {
    fn default() -> Self {
        Self {
            query: None,
            category: None,
            limit: 50,
            page: 1,
            active_only: true,
        }
    }
}

impl MarketSearchParams {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(q) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("query".to_string(), q.to_string()));
        }
        if let Some(c) = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            params.push(("category".to_string(), c.to_string()));
        }
        params.push(("limit".to_string(), self.limit.max(1).to_string()));
        params.push(("page".to_string(), self.page.max(1).to_string()));
        if self.active_only {
            params.push(("active".to_string(), "true".to_string()));
        }
        params
    }
}

/// Everything the orchestrator needs from the UI for one invocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSnapshot {
    pub date_range: DateRange,
    pub datasets: DatasetToggles,
    pub market_search: MarketSearchParams,
}

impl FilterSnapshot {
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            datasets: DatasetToggles::default(),
            market_search: MarketSearchParams::default(),
        }
    }

    pub fn with_datasets(mut self, datasets: DatasetToggles) -> Self {
        self.datasets = datasets;
        self
    }

    pub fn with_market_search(mut self, market_search: MarketSearchParams) -> Self {
        self.market_search = market_search;
        self
    }
}
