#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region and coordinate types.
//!
//! A region is the unit of feedback aggregation: a named administrative
//! area (a Kenyan county by default) with a single representative
//! coordinate. Regions are defined once at startup from a registry table
//! and never change afterwards.

use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside the valid
    /// latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A named region with a fixed representative coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Region name as reported by the aggregation backend (e.g. "Nairobi").
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Region {
    /// Creates a region.
    #[must_use]
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    /// Returns the region's coordinate.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Pointer position on the rendered map surface, in pixels.
///
/// Carried through hover events so the tooltip renderer can anchor
/// itself; the engine never interprets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPosition {
    /// Horizontal offset from the left edge of the map surface.
    pub x: f64,
    /// Vertical offset from the top edge of the map surface.
    pub y: f64,
}

impl ScreenPosition {
    /// Creates a screen position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A region registry table, deserialized from TOML.
///
/// ```toml
/// id = "kenya_counties"
/// name = "Kenya counties"
///
/// [[regions]]
/// name = "Nairobi"
/// lat = -1.2921
/// lng = 36.8219
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryTable {
    /// Unique table identifier (e.g. `"kenya_counties"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Regions in display/iteration order.
    #[serde(default)]
    pub regions: Vec<Region>,
}
