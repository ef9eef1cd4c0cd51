//! Normalizers that turn loosely-shaped upstream JSON into canonical entities
//!
//! All of these are pure and mode-agnostic. Which event-feed mode produced a
//! payload only matters to the query orchestrator.

pub mod fields;
pub mod tokens;
pub mod market;
pub mod temporal;
pub mod events;

pub use fields::{
    extract_numeric_value, pick_number, pick_number_opt, pick_string, to_number,
};
pub use tokens::normalize_tokens;
pub use market::{market_items, normalize_market, normalize_markets};
pub use temporal::{entries_from_node, to_temporal_entries};
pub use events::{extract_all, extract_event, extract_series_point, normalize_date};
