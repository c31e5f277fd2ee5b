#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region registry and distance calculations.
//!
//! The registry is a small, read-only table of named regions with fixed
//! coordinates. It is built once at startup and passed explicitly to
//! everything that needs coordinates (hit testing, heatmap assembly).

pub mod distance;
pub mod registry;

pub use distance::{EARTH_RADIUS_KM, distance_km};
pub use registry::{MAX_REGIONS, RegionRegistry};

use thiserror::Error;

/// Errors that can occur while building a region registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry TOML could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// More regions than the registry supports.
    #[error("Registry has {count} regions, maximum is {max}")]
    TooManyRegions {
        /// Number of regions supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Two regions share a name.
    #[error("Duplicate region name: {name}")]
    DuplicateRegion {
        /// The repeated name.
        name: String,
    },

    /// A region has an empty name or an out-of-range coordinate.
    #[error("Invalid region '{name}': {message}")]
    InvalidRegion {
        /// Offending region name.
        name: String,
        /// Description of what went wrong.
        message: String,
    },
}
