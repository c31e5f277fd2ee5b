//! Holder of the last good aggregate batch.
//!
//! Readers take an [`Arc`] snapshot and never wait on a fetch in flight.
//! A successful refresh replaces the snapshot wholesale; a failed one
//! leaves it untouched.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use feedback_map_analytics_models::AggregateBatch;

use crate::{AggregateSource, FetchError};

/// How long a batch is considered current. Matches the backend's own
/// heatmap cache lifetime.
pub const DEFAULT_MAX_AGE: TimeDelta = TimeDelta::seconds(60);

/// A batch and the time it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// The aggregates.
    pub batch: AggregateBatch,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Age of the snapshot at `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.fetched_at
    }
}

/// Result of [`AggregateStore::refresh`].
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The batch was replaced.
    Fresh {
        /// Number of regions in the new batch.
        regions: usize,
    },
    /// The fetch failed; the previous batch is still served.
    Stale {
        /// Why the fetch failed.
        error: FetchError,
    },
    /// The fetch failed and there is no previous batch.
    Unavailable {
        /// Why the fetch failed.
        error: FetchError,
    },
}

impl RefreshOutcome {
    /// The fetch error, if the refresh failed.
    #[must_use]
    pub const fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Fresh { .. } => None,
            Self::Stale { error } | Self::Unavailable { error } => Some(error),
        }
    }

    /// Whether there is a batch to render after this refresh.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }
}

/// Stale-retaining store for the current aggregate batch.
#[derive(Debug, Default)]
pub struct AggregateStore {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl AggregateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if any fetch has ever succeeded.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a snapshot exists and is younger than `max_age`.
    #[must_use]
    pub fn is_fresh(&self, max_age: TimeDelta) -> bool {
        self.snapshot()
            .is_some_and(|s| s.age(Utc::now()) < max_age)
    }

    /// Replaces the snapshot with `batch`.
    pub fn replace(&self, batch: AggregateBatch) {
        let snapshot = Arc::new(Snapshot {
            batch,
            fetched_at: Utc::now(),
        });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// Fetches from `source` and updates the snapshot on success.
    ///
    /// The lock is only taken after the fetch completes, so readers are
    /// never blocked by network I/O.
    pub async fn refresh(
        &self,
        source: &dyn AggregateSource,
        lookback_days: u32,
    ) -> RefreshOutcome {
        match source.fetch_aggregates(lookback_days).await {
            Ok(batch) => {
                let regions = batch.len();
                self.replace(batch);
                log::info!(
                    "Refreshed aggregates from {} ({regions} regions, {lookback_days} days)",
                    source.describe()
                );
                RefreshOutcome::Fresh { regions }
            }
            Err(error) => {
                if let Some(previous) = self.snapshot() {
                    log::warn!(
                        "Aggregate refresh from {} failed, keeping batch from {}: {error}",
                        source.describe(),
                        previous.fetched_at.to_rfc3339()
                    );
                    RefreshOutcome::Stale { error }
                } else {
                    log::warn!(
                        "Aggregate refresh from {} failed with no previous batch: {error}",
                        source.describe()
                    );
                    RefreshOutcome::Unavailable { error }
                }
            }
        }
    }

    /// Refreshes only if the current snapshot is missing, older than
    /// `max_age`, or covers a different lookback window.
    ///
    /// Returns `None` when the snapshot was reused.
    pub async fn refresh_if_stale(
        &self,
        source: &dyn AggregateSource,
        lookback_days: u32,
        max_age: TimeDelta,
    ) -> Option<RefreshOutcome> {
        let reusable = self.snapshot().is_some_and(|s| {
            s.batch.lookback_days == lookback_days && s.age(Utc::now()) < max_age
        });
        if reusable {
            log::debug!("Reusing cached aggregates ({lookback_days} days)");
            return None;
        }
        Some(self.refresh(source, lookback_days).await)
    }
}
