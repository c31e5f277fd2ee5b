//! Severity classification.
//!
//! Volume relative to the busiest region sets the baseline tier; a high
//! share of negative sentiment escalates it by one label. The thresholds
//! are calibration constants and are evaluated in a fixed order.

use feedback_map_analytics_models::{AggregateSample, ClassificationResult, SeverityTier};

/// Volume ratio above which a region is High (or Critical).
pub const HIGH_VOLUME_RATIO: f64 = 0.6;
/// Negative ratio that escalates High to Critical.
pub const CRITICAL_NEGATIVE_RATIO: f64 = 0.5;
/// Volume ratio above which a region is Medium (or Warning).
pub const MEDIUM_VOLUME_RATIO: f64 = 0.3;
/// Negative ratio that escalates Medium to Warning and Low to Caution.
pub const ELEVATED_NEGATIVE_RATIO: f64 = 0.4;

/// Largest count across the samples, floored at 1 so it is always a safe
/// divisor. Compute once per batch.
#[must_use]
pub fn max_count_in_batch<'a>(samples: impl IntoIterator<Item = &'a AggregateSample>) -> u64 {
    samples
        .into_iter()
        .map(|s| s.count)
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Classifies one region's sample against the batch maximum.
///
/// A zero count is always [`SeverityTier::NoData`] with both ratios at 0;
/// the negative ratio is never computed in that case. A `max_count` of 0
/// is treated as 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify(sample: &AggregateSample, max_count: u64) -> ClassificationResult {
    if sample.count == 0 {
        return ClassificationResult {
            region: sample.region.clone(),
            severity_tier: SeverityTier::NoData,
            priority_ratio: 0.0,
            negative_ratio: 0.0,
        };
    }

    let volume_ratio = (sample.count as f64 / max_count.max(1) as f64).clamp(0.0, 1.0);
    let negative_ratio = (sample.sentiment.negative as f64 / sample.count as f64).clamp(0.0, 1.0);

    ClassificationResult {
        region: sample.region.clone(),
        severity_tier: tier_for(volume_ratio, negative_ratio),
        priority_ratio: volume_ratio,
        negative_ratio,
    }
}

fn tier_for(volume_ratio: f64, negative_ratio: f64) -> SeverityTier {
    if volume_ratio > HIGH_VOLUME_RATIO && negative_ratio > CRITICAL_NEGATIVE_RATIO {
        SeverityTier::Critical
    } else if volume_ratio > HIGH_VOLUME_RATIO {
        SeverityTier::High
    } else if volume_ratio > MEDIUM_VOLUME_RATIO && negative_ratio > ELEVATED_NEGATIVE_RATIO {
        SeverityTier::Warning
    } else if volume_ratio > MEDIUM_VOLUME_RATIO {
        SeverityTier::Medium
    } else if negative_ratio > ELEVATED_NEGATIVE_RATIO {
        SeverityTier::Caution
    } else {
        SeverityTier::Low
    }
}
