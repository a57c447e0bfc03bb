//! Request types for the attendance operations.
//!
//! These are the inputs the route layer hands to [`AttendanceService`].
//!
//! [`AttendanceService`]: super::AttendanceService

use serde::{Deserialize, Serialize};

use crate::models::{AttendanceType, Coordinate};

/// A check-in request.
///
/// Which optional fields are required depends on `attendance_type`: remote
/// check-ins need a `reason`, field check-ins need `site_ref` and
/// `photo_ref`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRequest {
    /// The employee checking in.
    pub employee_id: String,
    /// The device's reported position.
    pub coordinate: Coordinate,
    /// The device's reported accuracy radius in meters.
    pub accuracy_meters: f64,
    /// Office, remote or field.
    pub attendance_type: AttendanceType,
    /// Why the employee is working remotely.
    #[serde(default)]
    pub reason: Option<String>,
    /// Customer site reference for field work.
    #[serde(default)]
    pub site_ref: Option<String>,
    /// Reference to the uploaded site photo for field work.
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl CheckInRequest {
    /// An office check-in.
    pub fn office(
        employee_id: impl Into<String>,
        coordinate: Coordinate,
        accuracy_meters: f64,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            coordinate,
            accuracy_meters,
            attendance_type: AttendanceType::Office,
            reason: None,
            site_ref: None,
            photo_ref: None,
        }
    }

    /// A remote check-in with its reason.
    pub fn remote(
        employee_id: impl Into<String>,
        coordinate: Coordinate,
        accuracy_meters: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            attendance_type: AttendanceType::Remote,
            reason: Some(reason.into()),
            ..Self::office(employee_id, coordinate, accuracy_meters)
        }
    }

    /// A field check-in at a customer site.
    pub fn field(
        employee_id: impl Into<String>,
        coordinate: Coordinate,
        accuracy_meters: f64,
        site_ref: impl Into<String>,
        photo_ref: impl Into<String>,
    ) -> Self {
        Self {
            attendance_type: AttendanceType::Field,
            site_ref: Some(site_ref.into()),
            photo_ref: Some(photo_ref.into()),
            ..Self::office(employee_id, coordinate, accuracy_meters)
        }
    }
}

/// A check-out request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutRequest {
    /// The employee checking out.
    pub employee_id: String,
    /// The device's reported position, if it sent one.
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    /// Free-text note, typically explaining an early checkout.
    #[serde(default)]
    pub reason: Option<String>,
}

impl CheckOutRequest {
    /// A checkout with no position and no note.
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            coordinate: None,
            reason: None,
        }
    }
}

/// Returns the trimmed value if it is present and not blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_office_request() {
        let json = r#"{
            "employee_id": "emp_001",
            "coordinate": { "latitude": 9.9668, "longitude": 78.1338 },
            "accuracy_meters": 12.0,
            "attendance_type": "office"
        }"#;

        let request: CheckInRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.attendance_type, AttendanceType::Office);
        assert!(request.reason.is_none());
        assert!(request.site_ref.is_none());
    }

    #[test]
    fn test_field_constructor_sets_references() {
        let request = CheckInRequest::field(
            "emp_001",
            Coordinate::new(0.0, 0.0),
            10.0,
            "site-9",
            "photo-1",
        );
        assert_eq!(request.attendance_type, AttendanceType::Field);
        assert_eq!(request.site_ref.as_deref(), Some("site-9"));
        assert_eq!(request.photo_ref.as_deref(), Some("photo-1"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  home internet  ")), Some("home internet"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
