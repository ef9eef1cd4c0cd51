//! Dataset health for the activity feed
//!
//! Health is always derived from the current toggles, in-flight flags and
//! query results. Nothing here is stored.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::filters::DatasetToggles;
use super::merge::{Aggregation, MergedFeed};
use super::status::{ActivitySnapshot, QueryStatus};
use crate::types::NormalizedMarket;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Markets,
    Gdelt,
    Twitter,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Markets => write!(f, "markets"),
            Dataset::Gdelt => write!(f, "gdelt"),
            Dataset::Twitter => write!(f, "twitter"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Red,
    Yellow,
    Green,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetHealth {
    pub dataset: Dataset,
    pub status: HealthStatus,
    /// Set when the dataset is serving degraded or placeholder data
    pub fallback: Option<String>,
    pub detail: String,
}

impl DatasetHealth {
    fn new(dataset: Dataset, status: HealthStatus, detail: impl Into<String>) -> Self {
        Self { dataset, status, fallback: None, detail: detail.into() }
    }

    fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

/// Health entries for markets, gdelt and twitter, in that order.
pub fn derive_health(
    datasets: &DatasetToggles,
    activity: ActivitySnapshot,
    markets: &QueryStatus<Vec<NormalizedMarket>>,
    feed: &QueryStatus<MergedFeed>,
) -> Vec<DatasetHealth> {
    vec![
        markets_health(datasets.markets, activity.markets, markets),
        gdelt_health(datasets.gdelt, activity.gdelt, feed),
        twitter_health(datasets.twitter),
    ]
}

fn markets_health(
    enabled: bool,
    fetching: bool,
    status: &QueryStatus<Vec<NormalizedMarket>>,
) -> DatasetHealth {
    let dataset = Dataset::Markets;
    if !enabled {
        return DatasetHealth::new(dataset, HealthStatus::Red, "Dataset disabled");
    }
    if let Some(err) = status.error() {
        return DatasetHealth::new(dataset, HealthStatus::Red, err.to_string());
    }
    if fetching {
        return DatasetHealth::new(dataset, HealthStatus::Yellow, "Fetching markets");
    }
    let detail = match status {
        QueryStatus::Ready(markets) => format!("{} markets loaded", markets.len()),
        QueryStatus::Cancelled => "Last request superseded".to_string(),
        _ => "Waiting for search parameters".to_string(),
    };
    DatasetHealth::new(dataset, HealthStatus::Green, detail)
}

fn gdelt_health(enabled: bool, fetching: bool, status: &QueryStatus<MergedFeed>) -> DatasetHealth {
    let dataset = Dataset::Gdelt;
    if !enabled {
        return DatasetHealth::new(dataset, HealthStatus::Red, "Dataset disabled");
    }
    if let Some(err) = status.error() {
        return DatasetHealth::new(dataset, HealthStatus::Red, err.to_string());
    }
    if fetching {
        return DatasetHealth::new(dataset, HealthStatus::Yellow, "Fetching event feed");
    }
    match status {
        QueryStatus::Ready(feed) => {
            let health = DatasetHealth::new(
                dataset,
                HealthStatus::Green,
                format!("{} series points, {} events", feed.series.len(), feed.events.len()),
            );
            if feed.aggregation == Aggregation::Monthly {
                health.with_fallback("Monthly aggregation")
            } else {
                health
            }
        }
        QueryStatus::Cancelled => {
            DatasetHealth::new(dataset, HealthStatus::Green, "Last request superseded")
        }
        _ => DatasetHealth::new(dataset, HealthStatus::Green, "Waiting for query parameters"),
    }
}

fn twitter_health(enabled: bool) -> DatasetHealth {
    if enabled {
        DatasetHealth::new(Dataset::Twitter, HealthStatus::Green, "No live source")
            .with_fallback("Not implemented")
    } else {
        DatasetHealth::new(Dataset::Twitter, HealthStatus::Red, "Dataset disabled")
            .with_fallback("Disabled")
    }
}
