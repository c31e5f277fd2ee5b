//! Visual encoding for the four render modes.
//!
//! Radius and color are derived once from the count and tier; the render
//! mode only decides which extra rings are drawn around the marker and
//! how opaque the fill is.

use feedback_map_analytics_models::{
    ClassificationResult, ColorToken, RenderMode, RingSpec, RingStyle, SeverityTier,
    VisualEncoding,
};

/// Radius of a region with no feedback.
pub const NO_DATA_RADIUS: f64 = 6.0;
/// Smallest radius of a region with feedback.
pub const MIN_RADIUS: f64 = 10.0;
/// Largest radius of any region.
pub const MAX_RADIUS: f64 = 40.0;
/// Cluster markers are never smaller than this.
pub const CLUSTER_MIN_RADIUS: f64 = 15.0;

const BADGE_COLOR: ColorToken = ColorToken::new("#ffffff");

/// Tunable encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderOptions {
    /// Heat mode draws a glow when `radius * priority_ratio` exceeds this.
    pub heat_glow_threshold: f64,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            heat_glow_threshold: 15.0,
        }
    }
}

/// Fill color for a tier. `Caution` shares `Medium`'s amber.
#[must_use]
pub const fn tier_color(tier: SeverityTier) -> ColorToken {
    match tier {
        SeverityTier::NoData => ColorToken::new("#9ca3af"),
        SeverityTier::Low => ColorToken::new("#22c55e"),
        SeverityTier::Caution | SeverityTier::Medium => ColorToken::new("#f59e0b"),
        SeverityTier::Warning => ColorToken::new("#f97316"),
        SeverityTier::High => ColorToken::new("#ef4444"),
        SeverityTier::Critical => ColorToken::new("#991b1b"),
    }
}

/// Base marker radius on a log scale, so a few very busy regions do not
/// dwarf everything else.
///
/// `6` for a zero count, otherwise
/// `clamp(10 + 30 * log10(count + 1) / log10(max_count + 1), 10, 40)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn base_radius(count: u64, max_count: u64) -> f64 {
    if count == 0 {
        return NO_DATA_RADIUS;
    }

    let max_count = max_count.max(1) as f64;
    let scaled = 30.0 * (count as f64 + 1.0).log10() / (max_count + 1.0).log10();
    (MIN_RADIUS + scaled).clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Produces the visual parameters for one region in one mode.
///
/// Pure: identical arguments always produce an identical encoding.
#[must_use]
pub fn encode(
    classification: &ClassificationResult,
    count: u64,
    max_count: u64,
    mode: RenderMode,
    options: &EncoderOptions,
) -> VisualEncoding {
    let tier = classification.severity_tier;
    let color = tier_color(tier);
    let radius = base_radius(count, max_count);

    let (radius, fill_opacity, rings) = match mode {
        RenderMode::Heat => {
            let mut rings = Vec::new();
            if radius * classification.priority_ratio > options.heat_glow_threshold {
                rings.push(ring(RingStyle::Glow, 3.0, 0.15, color));
            }
            (radius, 0.6, rings)
        }
        RenderMode::Choropleth => (
            radius,
            0.35,
            vec![
                ring(RingStyle::CenterMarker, 0.3, 1.0, color),
                ring(RingStyle::Footprint, 2.5, 0.15, color),
            ],
        ),
        RenderMode::Cluster => (
            radius.max(CLUSTER_MIN_RADIUS),
            0.9,
            vec![ring(RingStyle::Badge, 0.5, 1.0, BADGE_COLOR)],
        ),
        RenderMode::Pulse => {
            let rings = if tier.is_elevated() {
                vec![
                    RingSpec {
                        dashed: true,
                        ..ring(RingStyle::DashedOutline, 1.3, 0.8, color)
                    },
                    RingSpec {
                        animated: true,
                        ..ring(RingStyle::PulseWave, 4.0, 0.25, color)
                    },
                    RingSpec {
                        animated: true,
                        ..ring(RingStyle::PulseWave, 6.0, 0.12, color)
                    },
                ]
            } else {
                Vec::new()
            };
            (radius, 0.8, rings)
        }
    };

    VisualEncoding {
        region: classification.region.clone(),
        mode,
        radius,
        fill_color: color,
        fill_opacity,
        rings,
    }
}

const fn ring(
    style: RingStyle,
    radius_multiplier: f64,
    opacity: f64,
    color: ColorToken,
) -> RingSpec {
    RingSpec {
        style,
        radius_multiplier,
        opacity,
        color,
        animated: false,
        dashed: false,
    }
}
