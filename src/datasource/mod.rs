//! Record source abstraction for fetching corporate-action histories.

use crate::domain::{CorporateActionRecord, Market};
use async_trait::async_trait;
use std::fmt;

pub mod cache;
pub mod mock;
pub mod tdx;

pub use cache::SessionCache;
pub use mock::MockRecordSource;
pub use tdx::TdxRecordSource;

/// Source of corporate-action records for instruments.
///
/// Implementations own connectivity, retry/backoff, and rate limiting. No
/// pagination contract is assumed: callers fetch an instrument's full
/// history and filter client-side.
#[async_trait]
pub trait RecordSource: Send + Sync + fmt::Debug {
    /// Fetch the full corporate-action history for one instrument.
    ///
    /// # Arguments
    /// * `market` - Trading venue the instrument is listed on
    /// * `code` - Exchange-assigned instrument code
    async fn fetch_corporate_actions(
        &self,
        market: Market,
        code: &str,
    ) -> Result<Vec<CorporateActionRecord>, RecordSourceError>;
}

/// Error type for record source operations.
///
/// Detection treats every variant the same way: the instrument is skipped
/// for this run and counted as an unavailable lookup.
#[derive(Debug, Clone)]
pub enum RecordSourceError {
    /// Connection-level failure: timeout, refused, DNS.
    NetworkError(String),
    /// Non-success HTTP status from the gateway.
    HttpError { status: u16, message: String },
    /// Response body was not the expected shape.
    ParseError(String),
    /// Gateway asked us to slow down.
    RateLimited,
    /// Anything else.
    Other(String),
}

impl fmt::Display for RecordSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RecordSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            RecordSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            RecordSourceError::RateLimited => write!(f, "Rate limited"),
            RecordSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for RecordSourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_source_error_display() {
        let err = RecordSourceError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = RecordSourceError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = RecordSourceError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");

        let err = RecordSourceError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited");
    }
}
