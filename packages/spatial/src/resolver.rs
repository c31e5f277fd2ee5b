//! Nearest-region lookup for pointer coordinates.
//!
//! A linear scan is used: registries hold at most
//! [`MAX_REGIONS`](feedback_map_geography::MAX_REGIONS) entries, so a
//! spatial tree would cost more than it saves.

use std::sync::Arc;

use feedback_map_geography::{RegionRegistry, distance_km};
use feedback_map_geography_models::{Coordinate, Region};

/// Default catchment radius in kilometers.
pub const DEFAULT_CATCHMENT_KM: f64 = 80.0;

/// The region under the pointer and how far away its coordinate is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a> {
    /// The nearest region.
    pub region: &'a Region,
    /// Great-circle distance from the pointer, in kilometers.
    pub distance_km: f64,
}

/// Returns the region nearest to `pointer` if it is strictly closer than
/// `catchment_km`.
///
/// Ties go to the region that comes first in `regions`. Exact ties are
/// practically impossible with real coordinates, so no further rule is
/// applied.
#[must_use]
pub fn resolve(pointer: Coordinate, regions: &[Region], catchment_km: f64) -> Option<Hit<'_>> {
    let mut best: Option<Hit<'_>> = None;

    for region in regions {
        let d = distance_km(pointer, region.coordinate());
        match best {
            Some(current) if d >= current.distance_km => {}
            _ => {
                best = Some(Hit {
                    region,
                    distance_km: d,
                });
            }
        }
    }

    best.filter(|hit| hit.distance_km < catchment_km)
}

/// A registry paired with a catchment radius.
#[derive(Debug, Clone)]
pub struct HitResolver {
    registry: Arc<RegionRegistry>,
    catchment_km: f64,
}

impl HitResolver {
    /// Creates a resolver over `registry` with the given catchment radius.
    #[must_use]
    pub fn new(registry: Arc<RegionRegistry>, catchment_km: f64) -> Self {
        Self {
            registry,
            catchment_km,
        }
    }

    /// Creates a resolver with [`DEFAULT_CATCHMENT_KM`].
    #[must_use]
    pub fn with_default_catchment(registry: Arc<RegionRegistry>) -> Self {
        Self::new(registry, DEFAULT_CATCHMENT_KM)
    }

    /// Catchment radius in kilometers.
    #[must_use]
    pub const fn catchment_km(&self) -> f64 {
        self.catchment_km
    }

    /// The registry being searched.
    #[must_use]
    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    /// Resolves the region under `pointer`. See [`resolve`].
    #[must_use]
    pub fn resolve(&self, pointer: Coordinate) -> Option<Hit<'_>> {
        let hit = resolve(pointer, self.registry.regions(), self.catchment_km);
        log::trace!(
            "resolve({}, {}) -> {:?}",
            pointer.lat,
            pointer.lng,
            hit.map(|h| (&h.region.name, h.distance_km))
        );
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kenya() -> HitResolver {
        HitResolver::with_default_catchment(Arc::new(RegionRegistry::kenya()))
    }

    #[test]
    fn pointer_on_region_coordinate() {
        let resolver = kenya();
        let hit = resolver.resolve(Coordinate::new(-1.2921, 36.8219)).unwrap();
        assert_eq!(hit.region.name, "Nairobi");
        assert!(hit.distance_km < 1e-6, "distance {}", hit.distance_km);
    }

    #[test]
    fn nearest_wins_over_neighbors() {
        // Slightly north of Nairobi, still closer to it than to Kiambu.
        let resolver = kenya();
        let hit = resolver.resolve(Coordinate::new(-1.25, 36.82)).unwrap();
        assert_eq!(hit.region.name, "Nairobi");

        let hit = resolver.resolve(Coordinate::new(-1.18, 36.83)).unwrap();
        assert_eq!(hit.region.name, "Kiambu");
    }

    #[test]
    fn nothing_within_catchment() {
        let resolver = kenya();
        // Indian Ocean, hundreds of km from any county seat.
        assert!(resolver.resolve(Coordinate::new(-10.0, 50.0)).is_none());
    }

    #[test]
    fn catchment_is_strict() {
        let regions = [Region::new("Origin", 0.0, 0.0)];
        let pointer = Coordinate::new(0.0, 1.0);
        let d = distance_km(pointer, regions[0].coordinate());

        assert!(resolve(pointer, &regions, d).is_none());
        assert!(resolve(pointer, &regions, d + 1e-6).is_some());
    }

    #[test]
    fn equidistant_tie_goes_to_first() {
        let regions = [Region::new("West", 0.0, -1.0), Region::new("East", 0.0, 1.0)];
        let hit = resolve(Coordinate::new(0.0, 0.0), &regions, 500.0).unwrap();
        assert_eq!(hit.region.name, "West");
    }

    #[test]
    fn empty_region_list() {
        assert!(resolve(Coordinate::new(0.0, 0.0), &[], DEFAULT_CATCHMENT_KM).is_none());
    }
}
