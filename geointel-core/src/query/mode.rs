//! Event-feed query modes and their parameter records

use serde::{Deserialize, Serialize};
use std::fmt;

use super::filters::FilterSnapshot;

/// The four mutually exclusive event-feed query styles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Context,
    Country,
    Bilateral,
    /// Bilateral conflict coverage
    Bbva,
}

impl QueryMode {
    pub const ALL: [QueryMode; 4] = [
        QueryMode::Context,
        QueryMode::Country,
        QueryMode::Bilateral,
        QueryMode::Bbva,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Context => "context",
            QueryMode::Country => "country",
            QueryMode::Bilateral => "bilateral",
            QueryMode::Bbva => "bbva",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextParams {
    /// Free-text keywords; an empty query asks for the unfiltered context feed
    pub query: String,
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryParams {
    pub country: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilateralParams {
    pub country_a: String,
    pub country_b: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BbvaParams {
    pub actor_a: String,
    pub actor_b: String,
    /// Restrict coverage to conflict event codes only
    pub conflict_only: bool,
}

/// A mode selection together with its parameter record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeParams {
    Context(ContextParams),
    Country(CountryParams),
    Bilateral(BilateralParams),
    Bbva(BbvaParams),
}

impl ModeParams {
    pub fn mode(&self) -> QueryMode {
        match self {
            ModeParams::Context(_) => QueryMode::Context,
            ModeParams::Country(_) => QueryMode::Country,
            ModeParams::Bilateral(_) => QueryMode::Bilateral,
            ModeParams::Bbva(_) => QueryMode::Bbva,
        }
    }
}

/// Active mode plus the retained parameters of every mode
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    active: QueryMode,
    pub context: ContextParams,
    pub country: CountryParams,
    pub bilateral: BilateralParams,
    pub bbva: BbvaParams,
}

/// Request for one mode; `params` is `None` when the query must not execute
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySpec {
    pub mode: QueryMode,
    pub params: Option<Vec<(String, String)>>,
}

impl QuerySpec {
    pub fn is_enabled(&self) -> bool {
        self.params.is_some()
    }

    /// Cache key over the mode and every resolved parameter, order-independent.
    pub fn cache_key(&self) -> Option<String> {
        let params = self.params.as_ref()?;
        Some(cache_key(self.mode.as_str(), params))
    }
}

pub(crate) fn cache_key(scope: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    sorted.sort();
    format!("{scope}?{}", sorted.join("&"))
}

impl ModeState {
    pub fn active(&self) -> QueryMode {
        self.active
    }

    /// Activate the mode carried by `params` and replace that mode's record.
    pub fn select(&mut self, params: ModeParams) {
        self.active = params.mode();
        match params {
            ModeParams::Context(p) => self.context = p,
            ModeParams::Country(p) => self.country = p,
            ModeParams::Bilateral(p) => self.bilateral = p,
            ModeParams::Bbva(p) => self.bbva = p,
        }
    }

    /// Re-activate a mode with whatever parameters it last had.
    pub fn resume(&mut self, mode: QueryMode) {
        self.active = mode;
    }

    pub fn params_for(&self, mode: QueryMode) -> ModeParams {
        match mode {
            QueryMode::Context => ModeParams::Context(self.context.clone()),
            QueryMode::Country => ModeParams::Country(self.country.clone()),
            QueryMode::Bilateral => ModeParams::Bilateral(self.bilateral.clone()),
            QueryMode::Bbva => ModeParams::Bbva(self.bbva.clone()),
        }
    }

    /// One spec per mode. Only the active mode can be enabled, and only when
    /// its required parameters are all present.
    pub fn query_specs(&self, filters: &FilterSnapshot, default_limit: u32) -> [QuerySpec; 4] {
        QueryMode::ALL.map(|mode| QuerySpec {
            mode,
            params: if mode == self.active {
                self.request_params(mode, filters, default_limit)
            } else {
                None
            },
        })
    }

    /// The live request, if the active mode can be issued at all.
    pub fn active_spec(&self, filters: &FilterSnapshot, default_limit: u32) -> QuerySpec {
        QuerySpec {
            mode: self.active,
            params: self.request_params(self.active, filters, default_limit),
        }
    }

    fn request_params(
        &self,
        mode: QueryMode,
        filters: &FilterSnapshot,
        default_limit: u32,
    ) -> Option<Vec<(String, String)>> {
        if !filters.datasets.gdelt {
            return None;
        }

        let mut params = match mode {
            QueryMode::Context => {
                let mut p = Vec::new();
                let query = self.context.query.trim();
                if !query.is_empty() {
                    p.push(("query".to_string(), query.to_string()));
                }
                let limit = self.context.limit.unwrap_or(default_limit).max(1);
                p.push(("limit".to_string(), limit.to_string()));
                p
            }
            QueryMode::Country => {
                let country = country_code(&self.country.country)?;
                vec![("country".to_string(), country)]
            }
            QueryMode::Bilateral => {
                let (a, b) = distinct_pair(&self.bilateral.country_a, &self.bilateral.country_b)?;
                vec![("country1".to_string(), a), ("country2".to_string(), b)]
            }
            QueryMode::Bbva => {
                let (a, b) = distinct_pair(&self.bbva.actor_a, &self.bbva.actor_b)?;
                let mut p = vec![("actor1".to_string(), a), ("actor2".to_string(), b)];
                if self.bbva.conflict_only {
                    p.push(("conflict_only".to_string(), "true".to_string()));
                }
                p
            }
        };

        params.extend(filters.date_range.to_params());
        Some(params)
    }
}

fn country_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    (!code.is_empty()).then_some(code)
}

fn distinct_pair(a: &str, b: &str) -> Option<(String, String)> {
    let a = country_code(a)?;
    let b = country_code(b)?;
    (a != b).then_some((a, b))
}
