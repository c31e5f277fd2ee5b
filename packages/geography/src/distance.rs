//! Great-circle distance.

use feedback_map_geography_models::Coordinate;

/// Mean Earth radius used by [`distance_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two coordinates in kilometers.
///
/// Inputs are in degrees and converted to radians before use. The result
/// is always `>= 0`, symmetric in its arguments, and `0` for identical
/// points.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    // Rounding can push h a hair past 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAIROBI: Coordinate = Coordinate::new(-1.2921, 36.8219);
    const MOMBASA: Coordinate = Coordinate::new(-4.0435, 39.6682);

    #[test]
    fn same_point_is_zero() {
        for c in [NAIROBI, MOMBASA, Coordinate::new(0.0, 0.0), Coordinate::new(89.9, -179.9)] {
            assert!(distance_km(c, c).abs() < 1e-9, "{c:?} distance to itself");
        }
    }

    #[test]
    fn symmetric() {
        let ab = distance_km(NAIROBI, MOMBASA);
        let ba = distance_km(MOMBASA, NAIROBI);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn nairobi_to_mombasa() {
        // Published straight-line distance is roughly 440 km.
        let d = distance_km(NAIROBI, MOMBASA);
        assert!((430.0..450.0).contains(&d), "got {d}");
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        // 2πR / 360
        let expected = 2.0 * std::f64::consts::PI * EARTH_RADIUS_KM / 360.0;
        assert!((d - expected).abs() < 1e-6, "got {d}, expected {expected}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        let expected = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - expected).abs() < 1e-6, "got {d}");
    }
}
