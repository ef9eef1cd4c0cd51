//! Dashboard configuration

use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::query::QueryMode;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid URL for {key}: {reason}")]
    InvalidUrl { key: String, reason: String },

    #[error("{key} must be greater than zero")]
    Zero { key: String },
}

/// Endpoint paths, relative to the event-feed base URL, for each mode
#[derive(Clone, Debug, PartialEq)]
pub struct ModeEndpoints {
    pub context: String,
    pub country: String,
    pub bilateral: String,
    pub bbva: String,
}

impl Default for ModeEndpoints {
    fn default() -> Self {
        Self {
            context: "gdelt/context".to_string(),
            country: "gdelt/country".to_string(),
            bilateral: "gdelt/bilateral".to_string(),
            bbva: "gdelt/bilateral_conflict_coverage".to_string(),
        }
    }
}

impl ModeEndpoints {
    pub fn path(&self, mode: QueryMode) -> &str {
        match mode {
            QueryMode::Context => &self.context,
            QueryMode::Country => &self.country,
            QueryMode::Bilateral => &self.bilateral,
            QueryMode::Bbva => &self.bbva,
        }
    }
}

/// Dashboard configuration
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    pub market_api_base: String,
    pub gdelt_api_base: String,
    pub market_search_path: String,
    pub market_detail_path: String,
    pub mode_endpoints: ModeEndpoints,
    pub request_timeout: Duration,
    /// Cached responses younger than this are served without revalidation
    pub cache_fresh_for: Duration,
    pub default_market_limit: u32,
    pub default_event_limit: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            market_api_base: "http://localhost:8000/api/".to_string(),
            gdelt_api_base: "http://localhost:8000/api/".to_string(),
            market_search_path: "polymarket/markets".to_string(),
            market_detail_path: "polymarket/markets/".to_string(),
            mode_endpoints: ModeEndpoints::default(),
            request_timeout: Duration::from_secs(20),
            cache_fresh_for: Duration::from_secs(60),
            default_market_limit: 50,
            default_event_limit: 250,
        }
    }
}

impl DashboardConfig {
    /// Defaults overlaid with `GEOINTEL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DashboardConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("GEOINTEL_MARKET_API") {
            config.market_api_base = v;
        }
        if let Some(v) = lookup("GEOINTEL_GDELT_API") {
            config.gdelt_api_base = v;
        }
        if let Some(v) = lookup("GEOINTEL_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_u64("GEOINTEL_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("GEOINTEL_CACHE_FRESH_SECS") {
            config.cache_fresh_for = Duration::from_secs(parse_u64("GEOINTEL_CACHE_FRESH_SECS", &v)?);
        }
        if let Some(v) = lookup("GEOINTEL_MARKET_LIMIT") {
            config.default_market_limit = parse_u32("GEOINTEL_MARKET_LIMIT", &v)?;
        }
        if let Some(v) = lookup("GEOINTEL_EVENT_LIMIT") {
            config.default_event_limit = parse_u32("GEOINTEL_EVENT_LIMIT", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, base) in [
            ("GEOINTEL_MARKET_API", &self.market_api_base),
            ("GEOINTEL_GDELT_API", &self.gdelt_api_base),
        ] {
            Url::parse(base).map_err(|e| ConfigError::InvalidUrl {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero { key: "request_timeout".to_string() });
        }
        if self.cache_fresh_for.is_zero() {
            return Err(ConfigError::Zero { key: "cache_fresh_for".to_string() });
        }
        if self.default_market_limit == 0 {
            return Err(ConfigError::Zero { key: "default_market_limit".to_string() });
        }
        if self.default_event_limit == 0 {
            return Err(ConfigError::Zero { key: "default_event_limit".to_string() });
        }
        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode_endpoints.path(QueryMode::Bbva), "gdelt/bilateral_conflict_coverage");
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GEOINTEL_GDELT_API", "https://feeds.example.org/v2/"),
            ("GEOINTEL_TIMEOUT_SECS", "5"),
            ("GEOINTEL_MARKET_LIMIT", "20"),
        ]
        .into_iter()
        .collect();

        let config = DashboardConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.gdelt_api_base, "https://feeds.example.org/v2/");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.default_market_limit, 20);
        assert_eq!(config.default_event_limit, 250);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = DashboardConfig::from_lookup(|k| {
            (k == "GEOINTEL_CACHE_FRESH_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = DashboardConfig::from_lookup(|k| {
            (k == "GEOINTEL_MARKET_API").then(|| "not a url".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = DashboardConfig::from_lookup(|k| {
            (k == "GEOINTEL_TIMEOUT_SECS").then(|| "0".to_string())
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::Zero { key: "request_timeout".to_string() });
    }

    #[test]
    fn test_limits_out_of_range_or_zero_are_rejected() {
        let err = DashboardConfig::from_lookup(|k| {
            (k == "GEOINTEL_EVENT_LIMIT").then(|| "4294967296".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "GEOINTEL_EVENT_LIMIT".to_string(),
                value: "4294967296".to_string(),
            }
        );

        let err = DashboardConfig::from_lookup(|k| {
            (k == "GEOINTEL_EVENT_LIMIT").then(|| "0".to_string())
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::Zero { key: "default_event_limit".to_string() });

        let config = DashboardConfig::from_lookup(|k| {
            (k == "GEOINTEL_EVENT_LIMIT").then(|| "4294967295".to_string())
        })
        .unwrap();
        assert_eq!(config.default_event_limit, u32::MAX);
    }
}
