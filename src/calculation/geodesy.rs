//! Great-circle distance.

use crate::models::Coordinate;

/// Mean Earth radius used by the Haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Computes the great-circle distance between two coordinates in meters.
///
/// Uses the Haversine formula. The function is total: callers are expected
/// to pass coordinates inside WGS84 ranges.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::distance_meters;
/// use attendance_engine::models::Coordinate;
///
/// let office = Coordinate::new(9.9668, 78.1338);
/// assert_eq!(distance_meters(office, office), 0.0);
///
/// // One degree of latitude is roughly 111 km.
/// let north = Coordinate::new(10.9668, 78.1338);
/// let d = distance_meters(office, north);
/// assert!((d - 111_195.0).abs() < 1.0);
/// ```
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push the chord a hair outside [0, 1] for antipodal points.
    let half_chord = half_chord.clamp(0.0, 1.0);

    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());
    EARTH_RADIUS_METERS * angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let point = Coordinate::new(51.5007, -0.1246);
        assert_eq!(distance_meters(point, point), 0.0);
    }

    #[test]
    fn test_known_city_pair() {
        // London to Paris, about 343.5 km.
        let london = Coordinate::new(51.5074, -0.1278);
        let paris = Coordinate::new(48.8566, 2.3522);
        let d = distance_meters(london, paris);
        assert!((d - 343_556.0).abs() < 500.0, "got {}", d);
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinate::new(9.9668, 78.1338);
        let b = Coordinate::new(9.9700, 78.1400);
        assert_eq!(distance_meters(a, b), distance_meters(b, a));
    }

    #[test]
    fn test_short_offset_east() {
        // At ~10 degrees latitude, 0.001 degrees of longitude is about 109.5 m.
        let a = Coordinate::new(9.9668, 78.1338);
        let b = Coordinate::new(9.9668, 78.1348);
        let d = distance_meters(a, b);
        assert!((d - 109.5).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_antipodal_points_are_half_circumference() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = distance_meters(a, b);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1e-6);
    }
}
