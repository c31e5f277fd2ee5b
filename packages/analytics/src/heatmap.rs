//! Joins an aggregate batch with the region registry.
//!
//! This is where registry misses are dropped: a sample whose region is not
//! registered is excluded from the classified output and only shows up in
//! [`HeatmapView::unknown_regions`]. Everything downstream (encoding,
//! projection, legend) works on the joined rows.

use feedback_map_analytics_models::{
    AggregateBatch, BatchSummary, LegendEntry, RegionWithAggregate, RenderMode,
    SentimentBreakdown, SeverityFilter, VisualEncoding,
};
use feedback_map_geography::RegionRegistry;

use crate::classify::{classify, max_count_in_batch};
use crate::encode::{EncoderOptions, encode};
use crate::view::{legend, project};

/// A classified batch, ready for encoding and list views.
#[derive(Debug, Clone, Default)]
pub struct HeatmapView {
    lookback_days: u32,
    max_count: u64,
    regions: Vec<RegionWithAggregate>,
    unknown_regions: Vec<String>,
}

impl HeatmapView {
    /// Classifies every sample in `batch` whose region is in `registry`.
    ///
    /// Region names are matched exactly first, then case-insensitively;
    /// matched rows carry the registry's spelling. Rows are kept in
    /// registry order. The batch maximum is taken over all samples, as
    /// reported by the source.
    #[must_use]
    pub fn build(registry: &RegionRegistry, batch: &AggregateBatch) -> Self {
        let max_count = max_count_in_batch(batch.iter());

        let mut matched: Vec<(usize, RegionWithAggregate)> = Vec::with_capacity(batch.len());
        let mut unknown_regions = Vec::new();

        for sample in batch.iter() {
            let Some(region) = registry.lookup_ignore_case(&sample.region) else {
                log::debug!(
                    "Skipping unknown region '{}' ({} items)",
                    sample.region,
                    sample.count
                );
                unknown_regions.push(sample.region.clone());
                continue;
            };

            let mut sample = sample.clone();
            sample.region.clone_from(&region.name);
            let classification = classify(&sample, max_count);
            let position = registry
                .iter()
                .position(|r| r.name == region.name)
                .unwrap_or(usize::MAX);

            matched.push((
                position,
                RegionWithAggregate {
                    region: region.clone(),
                    sample,
                    classification,
                },
            ));
        }

        // Two spellings of the same region: keep the larger count.
        matched.sort_by(|(pa, a), (pb, b)| pa.cmp(pb).then_with(|| b.count().cmp(&a.count())));
        matched.dedup_by(|(pa, _), (pb, _)| pa == pb);

        if !unknown_regions.is_empty() {
            log::debug!(
                "{} of {} batch regions are not registered",
                unknown_regions.len(),
                batch.len()
            );
        }

        Self {
            lookback_days: batch.lookback_days,
            max_count,
            regions: matched.into_iter().map(|(_, row)| row).collect(),
            unknown_regions,
        }
    }

    /// Lookback window of the underlying batch.
    #[must_use]
    pub const fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// Batch maximum count (at least 1).
    #[must_use]
    pub const fn max_count(&self) -> u64 {
        self.max_count
    }

    /// Classified rows in registry order.
    #[must_use]
    pub fn regions(&self) -> &[RegionWithAggregate] {
        &self.regions
    }

    /// Batch region names that are not in the registry, sorted.
    #[must_use]
    pub fn unknown_regions(&self) -> &[String] {
        &self.unknown_regions
    }

    /// Looks up a classified row by registry name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegionWithAggregate> {
        self.regions.iter().find(|r| r.name() == name)
    }

    /// Whether no registered region has a sample. Renders as "no data
    /// available".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Encodes every row for `mode`, in registry order.
    #[must_use]
    pub fn encodings(&self, mode: RenderMode, options: &EncoderOptions) -> Vec<VisualEncoding> {
        self.regions
            .iter()
            .map(|r| encode(&r.classification, r.count(), self.max_count, mode, options))
            .collect()
    }

    /// Filtered, sorted rows for list display. See [`project`].
    #[must_use]
    pub fn project(
        &self,
        search_text: &str,
        severity_filter: SeverityFilter,
    ) -> Vec<RegionWithAggregate> {
        project(&self.regions, search_text, severity_filter)
    }

    /// Legend rows for the current batch. See [`legend`].
    #[must_use]
    pub fn legend(&self) -> Vec<LegendEntry> {
        legend(&self.regions)
    }

    /// Batch-wide totals over registered regions.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let mut sentiment = SentimentBreakdown::default();
        let mut summary = BatchSummary {
            lookback_days: self.lookback_days,
            unknown_regions: self.unknown_regions.clone(),
            ..BatchSummary::default()
        };

        for row in &self.regions {
            summary.total_feedback = summary.total_feedback.saturating_add(row.count());
            if row.count() > 0 {
                summary.regions_reporting += 1;
            }
            sentiment.accumulate(&row.sample.sentiment);
            *summary.tier_counts.entry(row.tier()).or_insert(0) += 1;
        }

        summary.sentiment = sentiment;
        summary
    }
}
