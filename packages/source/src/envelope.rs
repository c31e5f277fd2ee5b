//! Decoding of the county-heatmap response.
//!
//! The backend wraps every payload in an envelope:
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "County heatmap retrieved",
//!   "data": {
//!     "Nairobi": { "count": 12, "sentiment": { "positive": 3, "negative": 7, "neutral": 2 } }
//!   },
//!   "timestamp": "2025-01-01T00:00:00"
//! }
//! ```
//!
//! Errors raised by the web framework come back as `{ "detail": "..." }`
//! with a non-2xx status instead.

use std::collections::BTreeMap;

use feedback_map_analytics_models::{AggregateBatch, AggregateSample, SentimentBreakdown};
use serde::Deserialize;

use crate::FetchError;

/// Maximum length of a body preview included in error messages.
const BODY_PREVIEW_LEN: usize = 200;

#[derive(Debug, Deserialize)]
struct RegionAggregate {
    count: u64,
    #[serde(default)]
    sentiment: SentimentBreakdown,
}

#[derive(Debug, Deserialize)]
struct HeatmapEnvelope {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<BTreeMap<String, RegionAggregate>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HeatmapDocument {
    Envelope(HeatmapEnvelope),
    Bare(BTreeMap<String, RegionAggregate>),
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

/// Decodes an enveloped county-heatmap response.
///
/// A `null` or missing `data` field is an empty batch.
///
/// # Errors
///
/// * [`FetchError::Malformed`] if `body` is not a valid envelope
/// * [`FetchError::Upstream`] if the envelope reports `success: false`
pub fn parse_heatmap_response(
    body: &str,
    lookback_days: u32,
) -> Result<AggregateBatch, FetchError> {
    let envelope: HeatmapEnvelope =
        serde_json::from_str(body).map_err(|e| malformed(&e, body))?;
    from_envelope(envelope, lookback_days)
}

/// Decodes either an enveloped response or a bare `{ region: aggregate }`
/// map, as found in saved fixture files.
///
/// # Errors
///
/// * [`FetchError::Malformed`] if `body` is neither shape
/// * [`FetchError::Upstream`] if an envelope reports `success: false`
pub fn parse_heatmap_document(
    body: &str,
    lookback_days: u32,
) -> Result<AggregateBatch, FetchError> {
    let document: HeatmapDocument =
        serde_json::from_str(body).map_err(|e| malformed(&e, body))?;

    match document {
        HeatmapDocument::Envelope(envelope) => from_envelope(envelope, lookback_days),
        HeatmapDocument::Bare(data) => Ok(to_batch(data, lookback_days)),
    }
}

/// Extracts a human-readable message from an error response body.
///
/// Falls back to a preview of the raw body.
#[must_use]
pub fn error_message(body: &str) -> String {
    if let Ok(ErrorDetail { detail }) = serde_json::from_str::<ErrorDetail>(body) {
        return match detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }
    if let Ok(HeatmapEnvelope { message, .. }) = serde_json::from_str::<HeatmapEnvelope>(body)
        && !message.is_empty()
    {
        return message;
    }
    preview(body)
}

fn from_envelope(
    envelope: HeatmapEnvelope,
    lookback_days: u32,
) -> Result<AggregateBatch, FetchError> {
    if !envelope.success {
        return Err(FetchError::Upstream {
            status: 200,
            message: if envelope.message.is_empty() {
                "backend reported failure".to_string()
            } else {
                envelope.message
            },
        });
    }

    Ok(to_batch(envelope.data.unwrap_or_default(), lookback_days))
}

fn to_batch(data: BTreeMap<String, RegionAggregate>, lookback_days: u32) -> AggregateBatch {
    AggregateBatch::new(
        lookback_days,
        data.into_iter()
            .map(|(region, agg)| AggregateSample::new(region, agg.count, agg.sentiment)),
    )
}

fn malformed(error: &serde_json::Error, body: &str) -> FetchError {
    FetchError::Malformed {
        message: format!("{error} (body: {})", preview(body)),
    }
}

fn preview(body: &str) -> String {
    if body.len() <= BODY_PREVIEW_LEN {
        return body.to_string();
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
