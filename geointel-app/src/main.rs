//! Geopolitical Intelligence Dashboard Runner
//!
//! Headless driver for the dashboard core: loads the market list and the
//! selected event-feed mode, then keeps both refreshed until interrupted.
//!
//! Usage:
//!   geointel-dashboard [context [QUERY...]]
//!   geointel-dashboard country CODE
//!   geointel-dashboard bilateral CODE_A CODE_B
//!   geointel-dashboard bbva ACTOR_A ACTOR_B [--conflict-only]

use anyhow::{bail, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use geointel_core::query::{BbvaParams, BilateralParams, ContextParams, CountryParams, HealthStatus};
use geointel_core::{
    init_tracing, DashboardConfig, DashboardOrchestrator, DashboardView, DateRange,
    DateRangePreset, FilterSnapshot, HttpFetcher, LoggingSidePanel, MarketSearchParams,
    ModeParams, QueryStatus,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing("info");

    info!("🚀 Starting Geopolitical Intelligence Dashboard");

    let config = DashboardConfig::from_env()?;
    let mode = parse_mode(std::env::args().skip(1).collect())?;

    let fetcher = Arc::new(HttpFetcher::new(config.request_timeout)?);
    let orchestrator = DashboardOrchestrator::new(fetcher, &config, Arc::new(LoggingSidePanel));
    if let Some(params) = mode {
        orchestrator.select_mode(params);
    }

    let today = Utc::now().date_naive();
    let filters = FilterSnapshot::new(DateRange::from_preset(DateRangePreset::Last30Days, today))
        .with_market_search(MarketSearchParams {
            limit: config.default_market_limit,
            ..Default::default()
        });
    info!(
        "📅 Window {} to {}, mode {}",
        filters.date_range.start,
        filters.date_range.end,
        orchestrator.mode_state().active()
    );

    let view = orchestrator.load(&filters).await;
    report(&view);

    info!("📊 Dashboard is running. Press Ctrl+C to stop.");

    let mut interval = tokio::time::interval(config.cache_fresh_for.max(Duration::from_secs(5)));
    interval.tick().await;
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("🛑 Shutdown signal received...");
                break;
            }
            _ = interval.tick() => {
                let view = orchestrator.refresh(&filters).await;
                report(&view);
            }
        }
    }

    orchestrator.shutdown();
    info!("✅ Dashboard shutdown complete");
    Ok(())
}

fn report(view: &DashboardView) {
    match &view.markets {
        QueryStatus::Ready(markets) => info!(
            "📈 {} markets ({} active), 24h volume {:.0}, liquidity {:.0}",
            markets.len(),
            view.market_summary.active_count,
            view.market_summary.total_volume_24h,
            view.market_summary.total_liquidity
        ),
        QueryStatus::Failed(err) => warn!("Market search failed: {}", err),
        QueryStatus::Disabled => info!("📈 Markets disabled"),
        QueryStatus::Cancelled => info!("📈 Market search superseded"),
    }

    match &view.feed {
        QueryStatus::Ready(feed) => info!(
            "🌍 {} feed: {} points, {} events, total {}, tone {}, top pair {}",
            view.mode,
            feed.series.len(),
            feed.events.len(),
            fmt_opt(view.kpis.total_events),
            fmt_opt(view.kpis.avg_tone),
            view.kpis.top_pair.as_deref().unwrap_or("n/a")
        ),
        QueryStatus::Failed(err) => warn!("{} feed failed: {}", view.mode, err),
        QueryStatus::Disabled => info!("🌍 {} feed disabled or incomplete", view.mode),
        QueryStatus::Cancelled => info!("🌍 {} feed superseded", view.mode),
    }

    for health in &view.health {
        let marker = match health.status {
            HealthStatus::Green => "🟢",
            HealthStatus::Yellow => "🟡",
            HealthStatus::Red => "🔴",
        };
        match &health.fallback {
            Some(fallback) => info!("{} {}: {} ({})", marker, health.dataset, health.detail, fallback),
            None => info!("{} {}: {}", marker, health.dataset, health.detail),
        }
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string())
}

/// Mode selection from the command line. No arguments keeps the default mode.
fn parse_mode(args: Vec<String>) -> Result<Option<ModeParams>> {
    let Some((mode, rest)) = args.split_first() else {
        return Ok(None);
    };

    let params = match mode.to_ascii_lowercase().as_str() {
        "context" => ModeParams::Context(ContextParams { query: rest.join(" "), limit: None }),
        "country" => match rest {
            [country] => ModeParams::Country(CountryParams { country: country.clone() }),
            _ => bail!("country mode takes exactly one country code"),
        },
        "bilateral" => match rest {
            [a, b] => ModeParams::Bilateral(BilateralParams { country_a: a.clone(), country_b: b.clone() }),
            _ => bail!("bilateral mode takes two country codes"),
        },
        "bbva" => {
            let conflict_only = rest.iter().any(|a| a == "--conflict-only");
            let actors: Vec<&String> = rest.iter().filter(|a| *a != "--conflict-only").collect();
            match actors.as_slice() {
                [a, b] => ModeParams::Bbva(BbvaParams {
                    actor_a: (*a).clone(),
                    actor_b: (*b).clone(),
                    conflict_only,
                }),
                _ => bail!("bbva mode takes two actor codes"),
            }
        }
        other => bail!("unknown mode '{other}'"),
    };
    Ok(Some(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_keeps_default_mode() {
        assert_eq!(parse_mode(Vec::new()).unwrap(), None);
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(
            parse_mode(args(&["context", "oil", "price"])).unwrap(),
            Some(ModeParams::Context(ContextParams { query: "oil price".into(), limit: None }))
        );
        assert_eq!(
            parse_mode(args(&["BBVA", "--conflict-only", "ISR", "IRN"])).unwrap(),
            Some(ModeParams::Bbva(BbvaParams {
                actor_a: "ISR".into(),
                actor_b: "IRN".into(),
                conflict_only: true,
            }))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_mode(args(&["country"])).is_err());
        assert!(parse_mode(args(&["bilateral", "USA"])).is_err());
        assert!(parse_mode(args(&["weather"])).is_err());
    }

    #[test]
    fn test_offline_load_reports_failures() {
        let config = DashboardConfig {
            market_api_base: "http://127.0.0.1:9/api/".into(),
            gdelt_api_base: "http://127.0.0.1:9/api/".into(),
            request_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let fetcher = Arc::new(HttpFetcher::new(config.request_timeout).unwrap());
        let orchestrator = DashboardOrchestrator::new(fetcher, &config, Arc::new(LoggingSidePanel));
        let today = Utc::now().date_naive();
        let filters = FilterSnapshot::new(DateRange::from_preset(DateRangePreset::Last7Days, today));

        let view = tokio_test::block_on(orchestrator.load(&filters));
        assert!(view.markets.is_failed());
        assert!(view.feed.is_failed());
        report(&view);
    }
}
