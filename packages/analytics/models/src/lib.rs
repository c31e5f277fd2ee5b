#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate, classification, and visual encoding types for the feedback
//! heatmap.
//!
//! Everything here is plain data. Aggregates come from the loader,
//! classifications and encodings are derived from them and recomputed
//! whenever a new batch arrives.

use std::collections::BTreeMap;

use feedback_map_geography_models::Region;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Sentiment counts for one region. These may cover only a subset of the
/// region's feedback, so their sum is not required to equal the count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    /// Positive items.
    #[serde(default)]
    pub positive: u64,
    /// Negative items.
    #[serde(default)]
    pub negative: u64,
    /// Neutral items.
    #[serde(default)]
    pub neutral: u64,
}

impl SentimentBreakdown {
    /// Creates a breakdown.
    #[must_use]
    pub const fn new(positive: u64, negative: u64, neutral: u64) -> Self {
        Self {
            positive,
            negative,
            neutral,
        }
    }

    /// Sum of all three buckets.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.positive
            .saturating_add(self.negative)
            .saturating_add(self.neutral)
    }

    /// Adds another breakdown into this one.
    pub const fn accumulate(&mut self, other: &Self) {
        self.positive = self.positive.saturating_add(other.positive);
        self.negative = self.negative.saturating_add(other.negative);
        self.neutral = self.neutral.saturating_add(other.neutral);
    }
}

/// Aggregate feedback for one region over one lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSample {
    /// Region name as reported by the backend.
    pub region: String,
    /// Number of feedback items.
    pub count: u64,
    /// Sentiment breakdown.
    #[serde(default)]
    pub sentiment: SentimentBreakdown,
}

impl AggregateSample {
    /// Creates a sample.
    #[must_use]
    pub fn new(region: impl Into<String>, count: u64, sentiment: SentimentBreakdown) -> Self {
        Self {
            region: region.into(),
            count,
            sentiment,
        }
    }
}

/// All samples returned by a single aggregate fetch.
///
/// A batch is replaced wholesale on refetch; samples are never merged
/// across batches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateBatch {
    /// Lookback window the batch was fetched for, in days.
    pub lookback_days: u32,
    /// Samples keyed by region name.
    pub samples: BTreeMap<String, AggregateSample>,
}

impl AggregateBatch {
    /// Creates a batch from samples. A later sample for the same region
    /// replaces an earlier one.
    #[must_use]
    pub fn new(lookback_days: u32, samples: impl IntoIterator<Item = AggregateSample>) -> Self {
        Self {
            lookback_days,
            samples: samples
                .into_iter()
                .map(|s| (s.region.clone(), s))
                .collect(),
        }
    }

    /// Looks up the sample for a region.
    #[must_use]
    pub fn get(&self, region: &str) -> Option<&AggregateSample> {
        self.samples.get(region)
    }

    /// Iterates samples in region-name order.
    pub fn iter(&self) -> impl Iterator<Item = &AggregateSample> {
        self.samples.values()
    }

    /// Number of regions in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the batch has no regions. An empty batch is valid and
    /// renders as "no data available".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Severity classification for a region.
///
/// Variants are declared in escalation order. `Caution` and `Warning` are
/// distinct labels that share a severity rank with `Medium` and `High`
/// respectively.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SeverityTier {
    /// No feedback in the window.
    NoData,
    /// Low volume, mostly non-negative.
    Low,
    /// Low volume but predominantly negative.
    Caution,
    /// Moderate volume.
    Medium,
    /// Moderate volume with elevated negative sentiment.
    Warning,
    /// High volume.
    High,
    /// High volume with majority negative sentiment.
    Critical,
}

impl SeverityTier {
    /// Severity rank: 0 (no data) through 4 (critical). Labels that are
    /// equivalent in severity share a rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::NoData => 0,
            Self::Low => 1,
            Self::Caution | Self::Medium => 2,
            Self::Warning | Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Display label for legends and tooltips.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoData => "No data",
            Self::Low => "Low",
            Self::Caution => "Caution",
            Self::Medium => "Medium",
            Self::Warning => "Warning",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Whether the tier is High-equivalent or worse.
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        self.rank() >= 3
    }

    /// Returns all variants in escalation order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::NoData,
            Self::Low,
            Self::Caution,
            Self::Medium,
            Self::Warning,
            Self::High,
            Self::Critical,
        ]
    }
}

/// Classifier output for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Region name.
    pub region: String,
    /// Severity tier.
    pub severity_tier: SeverityTier,
    /// Share of the batch's largest count, in `[0, 1]`.
    pub priority_ratio: f64,
    /// Share of this region's feedback that is negative, in `[0, 1]`.
    pub negative_ratio: f64,
}

/// Alternate presentations of the same classified data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RenderMode {
    /// Circles with a glow around high-volume regions.
    Heat,
    /// Large translucent footprints approximating area.
    Choropleth,
    /// Solid count markers.
    Cluster,
    /// Animated rings on elevated regions.
    Pulse,
}

impl RenderMode {
    /// Returns all variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Heat, Self::Choropleth, Self::Cluster, Self::Pulse]
    }
}

/// An opaque color value understood by the rendering collaborator
/// (a CSS hex string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColorToken(&'static str);

impl ColorToken {
    /// Wraps a static color string.
    #[must_use]
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    /// Returns the underlying color string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ColorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.0)
    }
}

/// What an extra circle drawn around a region marker represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RingStyle {
    /// Soft halo behind a high-volume marker.
    Glow,
    /// Translucent areal footprint.
    Footprint,
    /// Small solid dot at the region's center.
    CenterMarker,
    /// Contrasting inner badge on a count marker.
    Badge,
    /// Expanding ring the renderer animates continuously.
    PulseWave,
    /// Dashed outline just outside the marker.
    DashedOutline,
}

/// One additional circle relative to the base marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RingSpec {
    /// What the ring represents.
    pub style: RingStyle,
    /// Ring radius as a multiple of the base radius.
    pub radius_multiplier: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Ring color.
    pub color: ColorToken,
    /// Whether the renderer should animate this ring.
    pub animated: bool,
    /// Whether the ring is stroked with a dashed line.
    pub dashed: bool,
}

/// Visual parameters for one region in one render mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualEncoding {
    /// Region name.
    pub region: String,
    /// Mode this encoding was produced for.
    pub mode: RenderMode,
    /// Base marker radius in pixels, always `> 0`.
    pub radius: f64,
    /// Base marker fill color.
    pub fill_color: ColorToken,
    /// Base marker fill opacity.
    pub fill_opacity: f64,
    /// Extra circles, innermost first.
    pub rings: Vec<RingSpec>,
}

/// Tier filter for list and legend views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityFilter {
    /// Accept every tier.
    #[default]
    All,
    /// Accept exactly this tier.
    Tier(SeverityTier),
}

impl SeverityFilter {
    /// Whether a tier passes the filter.
    #[must_use]
    pub fn matches(self, tier: SeverityTier) -> bool {
        match self {
            Self::All => true,
            Self::Tier(t) => t == tier,
        }
    }
}

impl std::str::FromStr for SeverityFilter {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.trim().parse().map(Self::Tier)
        }
    }
}

/// A registered region joined with its aggregate and classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionWithAggregate {
    /// The registered region.
    pub region: Region,
    /// Its aggregate for the current batch.
    pub sample: AggregateSample,
    /// Its classification for the current batch.
    pub classification: ClassificationResult,
}

impl RegionWithAggregate {
    /// Region name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.region.name
    }

    /// Feedback count.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.sample.count
    }

    /// Severity tier.
    #[must_use]
    pub const fn tier(&self) -> SeverityTier {
        self.classification.severity_tier
    }
}

/// One row of the map legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    /// Tier this row describes.
    pub tier: SeverityTier,
    /// Display label.
    pub label: &'static str,
    /// Tier color.
    pub color: ColorToken,
    /// Number of regions currently in this tier.
    pub region_count: usize,
}

/// Batch-wide totals shown alongside the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Lookback window in days.
    pub lookback_days: u32,
    /// Total feedback across registered regions.
    pub total_feedback: u64,
    /// Registered regions with at least one feedback item.
    pub regions_reporting: usize,
    /// Names in the batch that are not in the registry, sorted.
    pub unknown_regions: Vec<String>,
    /// Summed sentiment across registered regions.
    pub sentiment: SentimentBreakdown,
    /// Number of registered regions per tier.
    pub tier_counts: BTreeMap<SeverityTier, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ranks_pair_equivalent_labels() {
        assert_eq!(SeverityTier::Caution.rank(), SeverityTier::Medium.rank());
        assert_eq!(SeverityTier::Warning.rank(), SeverityTier::High.rank());
        assert!(SeverityTier::Critical.rank() > SeverityTier::High.rank());
        assert_eq!(SeverityTier::NoData.rank(), 0);
    }

    #[test]
    fn tier_ranks_never_decrease_in_declaration_order() {
        for pair in SeverityTier::all().windows(2) {
            assert!(
                pair[0].rank() <= pair[1].rank(),
                "{:?} ranks above {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn tier_string_forms() {
        assert_eq!(SeverityTier::NoData.to_string(), "no_data");
        assert_eq!("CRITICAL".parse::<SeverityTier>().unwrap(), SeverityTier::Critical);
        assert!("severe".parse::<SeverityTier>().is_err());
    }

    #[test]
    fn severity_filter_parsing() {
        assert_eq!("all".parse::<SeverityFilter>().unwrap(), SeverityFilter::All);
        assert_eq!(
            "warning".parse::<SeverityFilter>().unwrap(),
            SeverityFilter::Tier(SeverityTier::Warning)
        );
        assert!(SeverityFilter::All.matches(SeverityTier::Low));
        assert!(!SeverityFilter::Tier(SeverityTier::High).matches(SeverityTier::Warning));
    }

    #[test]
    fn render_mode_parsing() {
        assert_eq!("choropleth".parse::<RenderMode>().unwrap(), RenderMode::Choropleth);
        assert_eq!(RenderMode::Pulse.as_ref(), "pulse");
    }

    #[test]
    fn batch_keeps_last_sample_per_region() {
        let batch = AggregateBatch::new(
            7,
            [
                AggregateSample::new("Nairobi", 1, SentimentBreakdown::default()),
                AggregateSample::new("Nairobi", 5, SentimentBreakdown::default()),
            ],
        );
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get("Nairobi").unwrap().count, 5);
    }

    #[test]
    fn sentiment_accumulates() {
        let mut total = SentimentBreakdown::new(1, 2, 3);
        total.accumulate(&SentimentBreakdown::new(10, 20, 30));
        assert_eq!(total, SentimentBreakdown::new(11, 22, 33));
        assert_eq!(total.total(), 66);
    }
}
