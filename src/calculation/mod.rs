//! Pure calculation logic for the Attendance Engine.
//!
//! This module contains the side-effect-free engines: great-circle distance,
//! graded location confidence against office radii, and lateness/overtime
//! accounting against department timings. Nothing here suspends or fails;
//! every function returns a verdict, possibly a negative one.

mod geodesy;
mod location_confidence;
mod time_metrics;

pub use geodesy::{EARTH_RADIUS_METERS, distance_meters};
pub use location_confidence::{
    FALLBACK_CONFIDENCE, FALLBACK_MIN_ACCURACY_METERS, FALLBACK_RADIUS_MULTIPLIER,
    GOOD_GPS_MAX_ACCURACY_METERS, GOOD_GPS_RADIUS_MULTIPLIER, INDOOR_MIN_ACCURACY_METERS,
    INDOOR_RADIUS_MULTIPLIER, POOR_GPS_MIN_ACCURACY_METERS, POOR_GPS_RADIUS_MULTIPLIER,
    ValidationResult, apply_low_accuracy_fallback, validate_location,
};
pub use time_metrics::{ClosureHours, TimeMetrics, calculate_time_metrics, closure_hours};
