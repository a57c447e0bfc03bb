//! Location confidence grading.
//!
//! This module decides whether a reported GPS fix counts as "at the office".
//! Each office is classified independently using accuracy-aware tiers,
//! evaluated in a fixed precedence order (first match wins):
//!
//! | Tier | Condition | Confidence | Radius used |
//! |------|-----------|------------|-------------|
//! | Exact | `distance <= R` | 0.95 / 0.9 / 0.8 / 0.7 by accuracy | `R` |
//! | Indoor-compensated | `accuracy >= 200` and `distance <= 2.5R` | 0.75 | `2.5R` |
//! | Proximity, poor GPS | `accuracy > 1000` and `distance <= 5R` | 0.6 | `5R` |
//! | Proximity, good GPS | `accuracy <= 20` and `distance <= 1.5R` | 0.65 | `1.5R` |
//!
//! The highest-confidence passing office wins; ties go to the nearer office.
//! Thresholds never leak into the recommendations shown to employees.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{LocationSample, OfficeLocation, ValidationTier};

use super::geodesy::distance_meters;

/// Radius multiplier for the indoor-compensated tier.
pub const INDOOR_RADIUS_MULTIPLIER: f64 = 2.5;
/// Accuracy at or above which a fix is treated as indoor-degraded.
pub const INDOOR_MIN_ACCURACY_METERS: f64 = 200.0;
/// Radius multiplier for the very-poor-GPS proximity tier.
pub const POOR_GPS_RADIUS_MULTIPLIER: f64 = 5.0;
/// Accuracy above which GPS is considered very poor.
pub const POOR_GPS_MIN_ACCURACY_METERS: f64 = 1000.0;
/// Radius multiplier for the good-GPS proximity tier.
pub const GOOD_GPS_RADIUS_MULTIPLIER: f64 = 1.5;
/// Accuracy at or below which GPS is considered good.
pub const GOOD_GPS_MAX_ACCURACY_METERS: f64 = 20.0;

/// Minimum accuracy for the check-in fallback to apply.
pub const FALLBACK_MIN_ACCURACY_METERS: f64 = 50.0;
/// Radius multiplier for the check-in fallback.
pub const FALLBACK_RADIUS_MULTIPLIER: f64 = 2.0;
/// Confidence a check-in admitted by the fallback is recorded with.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// The verdict of validating one fix against the configured offices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the fix counts as at the office.
    pub is_valid: bool,
    /// Confidence between 0 and 1.
    pub confidence: f64,
    /// The tier the verdict landed in.
    pub tier: ValidationTier,
    /// Distance to the matched office, or to the nearest office on failure.
    pub distance_meters: Option<f64>,
    /// The matched office.
    pub office_id: Option<String>,
    /// Display name of the matched office.
    pub office_name: Option<String>,
    /// The nearest office, whether or not it matched.
    pub nearest_office_id: Option<String>,
    /// The acceptance radius that was applied (the nearest office's radius on failure).
    pub effective_radius_meters: Option<f64>,
    /// Accuracy of the fix that was validated.
    pub accuracy_meters: f64,
    /// True when the check-in fallback admitted an otherwise failed fix.
    #[serde(default)]
    pub fallback_applied: bool,
    /// Plain-language advice for the employee.
    pub recommendations: Vec<String>,
}

/// A passing classification of one office.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OfficeMatch {
    tier: ValidationTier,
    confidence: f64,
    effective_radius: f64,
}

/// Confidence for a fix inside the office radius, graded by accuracy.
fn exact_confidence(accuracy_meters: f64) -> f64 {
    if accuracy_meters <= 5.0 {
        0.95
    } else if accuracy_meters <= 20.0 {
        0.9
    } else if accuracy_meters <= 100.0 {
        0.8
    } else {
        0.7
    }
}

/// Classifies a single office. Returns `None` if no tier accepts the fix.
fn classify_office(distance: f64, radius: f64, accuracy: f64) -> Option<OfficeMatch> {
    if distance <= radius {
        return Some(OfficeMatch {
            tier: ValidationTier::Exact,
            confidence: exact_confidence(accuracy),
            effective_radius: radius,
        });
    }

    let indoor_radius = radius * INDOOR_RADIUS_MULTIPLIER;
    if accuracy >= INDOOR_MIN_ACCURACY_METERS && distance <= indoor_radius {
        return Some(OfficeMatch {
            tier: ValidationTier::IndoorCompensated,
            confidence: 0.75,
            effective_radius: indoor_radius,
        });
    }

    let poor_radius = radius * POOR_GPS_RADIUS_MULTIPLIER;
    if accuracy > POOR_GPS_MIN_ACCURACY_METERS && distance <= poor_radius {
        return Some(OfficeMatch {
            tier: ValidationTier::ProximityPoorGps,
            confidence: 0.6,
            effective_radius: poor_radius,
        });
    }

    let edge_radius = radius * GOOD_GPS_RADIUS_MULTIPLIER;
    if accuracy <= GOOD_GPS_MAX_ACCURACY_METERS && distance <= edge_radius {
        return Some(OfficeMatch {
            tier: ValidationTier::ProximityGoodGps,
            confidence: 0.65,
            effective_radius: edge_radius,
        });
    }

    None
}

/// Builds employee-facing advice for a verdict.
fn recommendations_for(tier: ValidationTier, accuracy_meters: f64) -> Vec<String> {
    let weak_signal = accuracy_meters > 100.0;
    let mut advice = Vec::new();

    match tier {
        ValidationTier::Exact => {
            if weak_signal {
                advice.push(
                    "Location verified, but the GPS signal is weak. Turn on high-accuracy location for faster check-ins."
                        .to_string(),
                );
            }
        }
        ValidationTier::IndoorCompensated => {
            advice.push(
                "Location verified with a weak indoor signal. Moving closer to a window gives a more reliable reading."
                    .to_string(),
            );
        }
        ValidationTier::ProximityPoorGps => {
            advice.push(
                "GPS signal is very poor. Step near a window or outside and turn on high-accuracy location."
                    .to_string(),
            );
        }
        ValidationTier::ProximityGoodGps => {
            advice.push(
                "You are at the edge of the office area. Move inside the building for a more reliable check-in."
                    .to_string(),
            );
        }
        ValidationTier::Failed => {
            advice.push(
                "You appear to be outside the office area. Move closer to the office and try again."
                    .to_string(),
            );
            if weak_signal {
                advice.push(
                    "Your GPS signal is weak. Move closer to a window or step outside, then retry."
                        .to_string(),
                );
            }
            advice.push(
                "If you are working away from the office today, check in as remote or field work instead."
                    .to_string(),
            );
        }
        ValidationTier::NoOfficesConfigured => {
            advice.push(
                "No office locations are configured. Please contact your administrator.".to_string(),
            );
        }
    }

    advice
}

/// Validates a fix against every configured office.
///
/// Never fails: a fix that matches nothing yields a `Failed` verdict, and an
/// empty office list yields a `NoOfficesConfigured` verdict so callers can
/// tell a misconfiguration apart from an employee who is simply elsewhere.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::validate_location;
/// use attendance_engine::models::{Coordinate, LocationSample, OfficeLocation, ValidationTier};
/// use chrono::NaiveDate;
///
/// let office = OfficeLocation {
///     id: "hq".to_string(),
///     name: "Head Office".to_string(),
///     coordinate: Coordinate::new(9.9668, 78.1338),
///     radius_meters: 100.0,
/// };
/// let sample = LocationSample {
///     coordinate: Coordinate::new(9.9668, 78.1338),
///     accuracy_meters: 4.0,
///     captured_at: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap(),
/// };
///
/// let result = validate_location(&sample, &[office]);
/// assert!(result.is_valid);
/// assert_eq!(result.tier, ValidationTier::Exact);
/// assert_eq!(result.confidence, 0.95);
/// ```
pub fn validate_location(sample: &LocationSample, offices: &[OfficeLocation]) -> ValidationResult {
    let accuracy = sample.accuracy_meters;

    if offices.is_empty() {
        return ValidationResult {
            is_valid: false,
            confidence: 0.0,
            tier: ValidationTier::NoOfficesConfigured,
            distance_meters: None,
            office_id: None,
            office_name: None,
            nearest_office_id: None,
            effective_radius_meters: None,
            accuracy_meters: accuracy,
            fallback_applied: false,
            recommendations: recommendations_for(ValidationTier::NoOfficesConfigured, accuracy),
        };
    }

    let mut nearest: Option<(&OfficeLocation, f64)> = None;
    let mut best: Option<(&OfficeLocation, f64, OfficeMatch)> = None;

    for office in offices {
        let distance = distance_meters(sample.coordinate, office.coordinate);

        if nearest.is_none_or(|(_, d)| distance < d) {
            nearest = Some((office, distance));
        }

        let Some(candidate) = classify_office(distance, office.radius_meters, accuracy) else {
            continue;
        };

        let better = match &best {
            None => true,
            Some((_, best_distance, best_match)) => {
                candidate.confidence > best_match.confidence
                    || (candidate.confidence == best_match.confidence && distance < *best_distance)
            }
        };
        if better {
            best = Some((office, distance, candidate));
        }
    }

    let nearest_office_id = nearest.map(|(office, _)| office.id.clone());

    match best {
        Some((office, distance, matched)) => {
            debug!(
                office_id = %office.id,
                tier = %matched.tier,
                distance_meters = distance,
                accuracy_meters = accuracy,
                "Location matched office"
            );
            ValidationResult {
                is_valid: true,
                confidence: matched.confidence,
                tier: matched.tier,
                distance_meters: Some(distance),
                office_id: Some(office.id.clone()),
                office_name: Some(office.name.clone()),
                nearest_office_id,
                effective_radius_meters: Some(matched.effective_radius),
                accuracy_meters: accuracy,
                fallback_applied: false,
                recommendations: recommendations_for(matched.tier, accuracy),
            }
        }
        None => {
            let (office, distance) = match nearest {
                Some((office, distance)) => (Some(office), Some(distance)),
                None => (None, None),
            };
            debug!(
                distance_meters = ?distance,
                accuracy_meters = accuracy,
                "Location matched no office"
            );
            ValidationResult {
                is_valid: false,
                confidence: 0.0,
                tier: ValidationTier::Failed,
                distance_meters: distance,
                office_id: None,
                office_name: None,
                nearest_office_id,
                effective_radius_meters: office.map(|o| o.radius_meters),
                accuracy_meters: accuracy,
                fallback_applied: false,
                recommendations: recommendations_for(ValidationTier::Failed, accuracy),
            }
        }
    }
}

/// Admits a borderline failed fix at reduced confidence.
///
/// Applies only to `Failed` verdicts whose fix has a poor accuracy radius
/// (`>= 50 m`) and lies within twice the nearest office's radius. The
/// verdict keeps its `Failed` tier; it is marked with `fallback_applied`
/// and recorded at confidence 0.5.
///
/// Returns `None` when the fallback does not apply.
pub fn apply_low_accuracy_fallback(result: &ValidationResult) -> Option<ValidationResult> {
    if result.tier != ValidationTier::Failed
        || result.accuracy_meters < FALLBACK_MIN_ACCURACY_METERS
    {
        return None;
    }

    let distance = result.distance_meters?;
    let radius = result.effective_radius_meters?;
    if distance > radius * FALLBACK_RADIUS_MULTIPLIER {
        return None;
    }

    let mut accepted = result.clone();
    accepted.is_valid = true;
    accepted.confidence = FALLBACK_CONFIDENCE;
    accepted.office_id = result.nearest_office_id.clone();
    accepted.fallback_applied = true;
    accepted.recommendations = vec![
        "Check-in accepted, but your location could not be confirmed precisely. Move closer to a window or enable high-accuracy location next time."
            .to_string(),
    ];
    Some(accepted)
}
