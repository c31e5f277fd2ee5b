#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate sources for the feedback map.
//!
//! Every backend that can report per-region feedback totals implements the
//! [`AggregateSource`] trait. The engine never talks to a backend directly;
//! callers hold an [`AggregateStore`] that keeps the last good batch when a
//! refresh fails.

pub mod envelope;
pub mod file;
pub mod http;
pub mod store;

use async_trait::async_trait;
use feedback_map_analytics_models::AggregateBatch;

pub use envelope::{parse_heatmap_document, parse_heatmap_response};
pub use file::FileAggregateSource;
pub use http::HttpAggregateSource;
pub use store::{AggregateStore, RefreshOutcome, Snapshot};

/// Errors that can occur while fetching aggregates.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered but reported a failure.
    #[error("Upstream error ({status}): {message}")]
    Upstream {
        /// HTTP status, or 200 when the envelope itself reported failure.
        status: u16,
        /// Message from the backend.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Malformed response: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },

    /// Reading a local aggregate file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The lookback window must be at least one day.
    #[error("Invalid lookback window: {days} days")]
    InvalidLookback {
        /// Requested window.
        days: u32,
    },
}

impl FetchError {
    /// Whether retrying the same request later could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Upstream { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed { .. } | Self::Io(_) | Self::InvalidLookback { .. } => false,
        }
    }
}

/// Anything that can produce a batch of per-region aggregates.
#[async_trait]
pub trait AggregateSource: Send + Sync {
    /// Short human-readable description, used in logs.
    fn describe(&self) -> String;

    /// Fetches aggregates for the trailing `lookback_days` days.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the window is zero or the backend cannot
    /// be reached, reports a failure, or returns an undecodable body.
    async fn fetch_aggregates(&self, lookback_days: u32) -> Result<AggregateBatch, FetchError>;
}

/// Rejects a zero-day window before any I/O happens.
///
/// # Errors
///
/// Returns [`FetchError::InvalidLookback`] if `lookback_days` is zero.
pub const fn check_lookback(lookback_days: u32) -> Result<(), FetchError> {
    if lookback_days == 0 {
        return Err(FetchError::InvalidLookback {
            days: lookback_days,
        });
    }
    Ok(())
}

/// A source that always returns the same in-memory batch.
///
/// The batch's own `lookback_days` is replaced by the requested window.
#[derive(Debug, Clone, Default)]
pub struct StaticAggregateSource {
    batch: AggregateBatch,
}

impl StaticAggregateSource {
    /// Wraps `batch`.
    #[must_use]
    pub const fn new(batch: AggregateBatch) -> Self {
        Self { batch }
    }
}

#[async_trait]
impl AggregateSource for StaticAggregateSource {
    fn describe(&self) -> String {
        format!("static batch ({} regions)", self.batch.len())
    }

    async fn fetch_aggregates(&self, lookback_days: u32) -> Result<AggregateBatch, FetchError> {
        check_lookback(lookback_days)?;
        let mut batch = self.batch.clone();
        batch.lookback_days = lookback_days;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use feedback_map_analytics_models::{AggregateSample, SentimentBreakdown};

    use super::*;

    #[tokio::test]
    async fn static_source_returns_batch() {
        let source = StaticAggregateSource::new(AggregateBatch::new(
            1,
            [AggregateSample::new("Nairobi", 3, SentimentBreakdown::default())],
        ));
        let batch = source.fetch_aggregates(14).await.unwrap();
        assert_eq!(batch.lookback_days, 14);
        assert_eq!(batch.get("Nairobi").map(|s| s.count), Some(3));
    }

    #[tokio::test]
    async fn zero_lookback_is_rejected() {
        let source = StaticAggregateSource::default();
        let err = source.fetch_aggregates(0).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidLookback { days: 0 }));
        assert!(!err.is_transient());
    }

    #[test]
    fn transient_classification() {
        let upstream = |status| FetchError::Upstream {
            status,
            message: String::new(),
        };
        assert!(upstream(503).is_transient());
        assert!(upstream(429).is_transient());
        assert!(!upstream(404).is_transient());
        assert!(
            !FetchError::Malformed {
                message: String::new()
            }
            .is_transient()
        );
    }
}
