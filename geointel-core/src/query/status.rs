//! Per-query result and in-flight flags

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::FeedError;

/// Result of one dataset query as the UI sees it
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum QueryStatus<T> {
    /// Dataset off, or required parameters missing
    Disabled,
    Ready(T),
    Failed(#[serde(serialize_with = "serialize_error")] FeedError),
    /// Superseded before it completed; carries no data
    Cancelled,
}

fn serialize_error<S: serde::Serializer>(err: &FeedError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&err.to_string())
}

impl<T> QueryStatus<T> {
    pub fn from_result(result: Result<T, FeedError>) -> Self {
        match result {
            Ok(value) => QueryStatus::Ready(value),
            Err(FeedError::Cancelled) => QueryStatus::Cancelled,
            Err(err) => QueryStatus::Failed(err),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            QueryStatus::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FeedError> {
        match self {
            QueryStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryStatus::Failed(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryStatus<U> {
        match self {
            QueryStatus::Disabled => QueryStatus::Disabled,
            QueryStatus::Ready(value) => QueryStatus::Ready(f(value)),
            QueryStatus::Failed(err) => QueryStatus::Failed(err),
            QueryStatus::Cancelled => QueryStatus::Cancelled,
        }
    }
}

/// Count of in-flight requests per dataset
#[derive(Debug, Default)]
pub struct FetchActivity {
    markets: AtomicUsize,
    gdelt: AtomicUsize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActivitySnapshot {
    pub markets: bool,
    pub gdelt: bool,
}

impl FetchActivity {
    pub fn snapshot(&self) -> ActivitySnapshot {
        ActivitySnapshot {
            markets: self.markets.load(Ordering::SeqCst) > 0,
            gdelt: self.gdelt.load(Ordering::SeqCst) > 0,
        }
    }

    /// Count a market search as in flight until the guard drops.
    pub fn markets(&self) -> ActivityGuard<'_> {
        ActivityGuard::new(&self.markets)
    }

    pub fn gdelt(&self) -> ActivityGuard<'_> {
        ActivityGuard::new(&self.gdelt)
    }
}

pub struct ActivityGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> ActivityGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        assert_eq!(QueryStatus::from_result(Ok::<_, FeedError>(3)), QueryStatus::Ready(3));
        assert_eq!(
            QueryStatus::<u8>::from_result(Err(FeedError::Cancelled)),
            QueryStatus::Cancelled
        );
        let failed = QueryStatus::<u8>::from_result(Err(FeedError::Timeout));
        assert!(failed.is_failed());
        assert_eq!(failed.error(), Some(&FeedError::Timeout));
    }

    #[test]
    fn test_activity_guard_resets_flag() {
        let activity = FetchActivity::default();
        {
            let _first = activity.gdelt();
            {
                let _second = activity.gdelt();
            }
            assert_eq!(activity.snapshot(), ActivitySnapshot { markets: false, gdelt: true });
        }
        assert_eq!(activity.snapshot(), ActivitySnapshot::default());
    }

    #[test]
    fn test_status_serializes_error_message() {
        let status = QueryStatus::<u8>::Failed(FeedError::ServiceUnavailable { service: "market search".into() });
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "failed");
        assert!(json["value"].as_str().unwrap().starts_with("Service unavailable"));
    }
}
