//! Aggregate source backed by a saved JSON file.
//!
//! Accepts a full API response (envelope) or just its `data` map. The file
//! is re-read on every fetch, so editing it between refreshes works.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use feedback_map_analytics_models::AggregateBatch;

use crate::envelope::parse_heatmap_document;
use crate::{AggregateSource, FetchError, check_lookback};

/// Reads aggregates from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileAggregateSource {
    path: PathBuf,
}

impl FileAggregateSource {
    /// Creates a source for `path`. The file is not opened until the first
    /// fetch.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path being read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AggregateSource for FileAggregateSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_aggregates(&self, lookback_days: u32) -> Result<AggregateBatch, FetchError> {
        check_lookback(lookback_days)?;

        log::info!("Reading aggregates from {}", self.path.display());
        let body = tokio::fs::read_to_string(&self.path).await?;
        parse_heatmap_document(&body, lookback_days)
    }
}
