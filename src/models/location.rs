//! Location models.
//!
//! This module defines coordinates, the GPS samples reported by devices, the
//! office locations they are validated against, and the graded tier a
//! validation ends up in.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, -90 to 90.
    pub latitude: f64,
    /// Longitude in degrees, -180 to 180.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate without validating it.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if both components are finite and inside WGS84 ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::Coordinate;
    ///
    /// assert!(Coordinate::new(9.9668, 78.1338).is_valid());
    /// assert!(!Coordinate::new(f64::NAN, 78.1338).is_valid());
    /// assert!(!Coordinate::new(91.0, 0.0).is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A single GPS fix reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// The reported position.
    pub coordinate: Coordinate,
    /// The device's self-reported accuracy radius in meters.
    pub accuracy_meters: f64,
    /// When the fix was captured.
    pub captured_at: NaiveDateTime,
}

/// A configured office with its acceptance radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeLocation {
    /// Unique identifier for the office.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Office position.
    pub coordinate: Coordinate,
    /// Radius in meters within which a fix counts as inside the office.
    pub radius_meters: f64,
}

/// The graded outcome of validating a position against an office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationTier {
    /// The fix lies inside the office radius.
    Exact,
    /// Weak indoor signal; accepted within an enlarged radius.
    IndoorCompensated,
    /// Very poor GPS; accepted within a wide radius.
    ProximityPoorGps,
    /// Good GPS just outside the radius.
    ProximityGoodGps,
    /// No office accepted the fix.
    Failed,
    /// There were no offices to validate against.
    NoOfficesConfigured,
}

impl std::fmt::Display for ValidationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValidationTier::Exact => "exact",
            ValidationTier::IndoorCompensated => "indoor_compensated",
            ValidationTier::ProximityPoorGps => "proximity_poor_gps",
            ValidationTier::ProximityGoodGps => "proximity_good_gps",
            ValidationTier::Failed => "failed",
            ValidationTier::NoOfficesConfigured => "no_offices_configured",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(0.0, 180.5).is_valid());
        assert!(!Coordinate::new(f64::INFINITY, 0.0).is_valid());
    }

    #[test]
    fn test_tier_serializes_snake_case() {
        let json = serde_json::to_string(&ValidationTier::IndoorCompensated).unwrap();
        assert_eq!(json, "\"indoor_compensated\"");
        assert_eq!(ValidationTier::IndoorCompensated.to_string(), "indoor_compensated");
    }

    #[test]
    fn test_office_deserialization() {
        let json = r#"{
            "id": "office_hq",
            "name": "Head Office",
            "coordinate": {"latitude": 9.9668, "longitude": 78.1338},
            "radius_meters": 100.0
        }"#;

        let office: OfficeLocation = serde_json::from_str(json).unwrap();
        assert_eq!(office.id, "office_hq");
        assert_eq!(office.radius_meters, 100.0);
    }
}
