//! Feed error types

use thiserror::Error;

/// Custom result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors surfaced by the feed clients and the query layer.
///
/// Parsing failures inside a single record never reach this type; they are
/// absorbed by the normalizers. Only request-level failures propagate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Service unavailable: {service} is temporarily unreachable")]
    ServiceUnavailable { service: String },

    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid request: {details}")]
    InvalidRequest { details: String },

    #[error("Request cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Treated as "no data" by best-effort feeds
    SoftFail,
    Recoverable,
    Fatal,
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ServiceUnavailable { .. } => ErrorKind::SoftFail,
            Self::Network { .. } | Self::Timeout => ErrorKind::Recoverable,
            Self::Upstream { status, .. } if *status >= 500 || *status == 429 => {
                ErrorKind::Recoverable
            }
            _ => ErrorKind::Fatal,
        }
    }

    /// Only a 503 degrades to an empty result on best-effort feeds.
    pub fn is_soft_fail(&self) -> bool {
        matches!(self.kind(), ErrorKind::SoftFail)
    }

    /// Whether the UI should offer a retry affordance.
    pub fn should_retry(&self) -> bool {
        matches!(self.kind(), ErrorKind::SoftFail | ErrorKind::Recoverable)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<url::ParseError> for FeedError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidRequest { details: err.to_string() }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() {
            Self::Network { message: err.to_string() }
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network { message: err.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unavailable_message() {
        let err = FeedError::ServiceUnavailable { service: "market detail".to_string() };
        assert!(err.to_string().contains("Service unavailable"));
        assert!(err.is_soft_fail());
        assert!(err.should_retry());
    }

    #[test]
    fn test_error_classification() {
        let server = FeedError::Upstream { status: 502, message: "bad gateway".into() };
        assert_eq!(server.kind(), ErrorKind::Recoverable);

        let client = FeedError::Upstream { status: 400, message: "bad query".into() };
        assert_eq!(client.kind(), ErrorKind::Fatal);
        assert!(!client.should_retry());

        assert!(FeedError::Cancelled.is_cancelled());
        assert!(!FeedError::Timeout.is_soft_fail());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: FeedError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, FeedError::Parse(_)));
    }
}
