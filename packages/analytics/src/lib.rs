#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Severity classification and visual encoding for the feedback heatmap.
//!
//! Every function in this crate is a pure, total function of its inputs:
//! the same aggregate batch always yields the same tiers, the same
//! encodings, and the same list ordering. There is no error path here;
//! unknown regions and empty batches are handled by exclusion.

pub mod classify;
pub mod encode;
pub mod heatmap;
pub mod view;

pub use classify::{classify, max_count_in_batch};
pub use encode::{EncoderOptions, base_radius, encode, tier_color};
pub use heatmap::HeatmapView;
pub use view::{legend, project};
