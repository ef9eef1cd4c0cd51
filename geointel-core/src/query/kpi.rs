//! Headline figures derived from the merged feed and the market list

use serde::{Deserialize, Serialize};

use super::merge::MergedFeed;
use crate::types::{GdeltSeriesPoint, NormalizedMarket};

/// Event-feed KPIs. `None` means "not available", never zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_events: Option<f64>,
    pub avg_tone: Option<f64>,
    pub avg_impact: Option<f64>,
    pub top_pair: Option<String>,
    pub keyword_matches: Option<f64>,
}

impl Kpis {
    pub fn from_feed(feed: &MergedFeed) -> Self {
        Self {
            total_events: total_events(feed),
            avg_tone: feed
                .insights
                .avg_tone()
                .or_else(|| mean(&feed.series, |p| p.avg_sentiment)),
            avg_impact: mean(&feed.series, |p| p.avg_impact),
            top_pair: feed.insights.top_pair(),
            keyword_matches: feed.insights.keyword_matches(),
        }
    }
}

/// The insights total wins whenever it exists, even if the series disagrees.
fn total_events(feed: &MergedFeed) -> Option<f64> {
    if let Some(total) = feed.insights.total_events() {
        return Some(total);
    }
    let sum: f64 = feed.series.iter().filter_map(|p| p.conflict_events).sum();
    (sum != 0.0).then_some(sum)
}

fn mean<F>(series: &[GdeltSeriesPoint], metric: F) -> Option<f64>
where
    F: Fn(&GdeltSeriesPoint) -> Option<f64>,
{
    let values: Vec<f64> = series.iter().filter_map(metric).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Aggregates over the current market list
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub count: usize,
    pub active_count: usize,
    pub total_volume_24h: f64,
    pub total_liquidity: f64,
    /// Mean over markets that report a YES price
    pub mean_price_yes: Option<f64>,
}

impl MarketSummary {
    pub fn from_markets(markets: &[NormalizedMarket]) -> Self {
        let priced: Vec<f64> = markets.iter().filter_map(|m| m.price_yes).collect();
        Self {
            count: markets.len(),
            active_count: markets.iter().filter(|m| m.is_active()).count(),
            total_volume_24h: markets.iter().map(|m| m.volume_24h).sum(),
            total_liquidity: markets.iter().map(|m| m.liquidity).sum(),
            mean_price_yes: if priced.is_empty() {
                None
            } else {
                Some(priced.iter().sum::<f64>() / priced.len() as f64)
            },
        }
    }
}
