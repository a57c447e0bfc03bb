//! Operation results and the response envelopes built from them.
//!
//! Each operation on [`AttendanceService`] returns a typed outcome inside an
//! [`EngineResult`]. The route layer turns those into the flat
//! `success`/`message` envelopes below, which never leak storage details.
//!
//! [`AttendanceService`]: super::AttendanceService

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::{TimeMetrics, ValidationResult};
use crate::error::{EngineError, EngineResult};
use crate::models::AttendanceRecord;
use crate::scheduler::SchedulerEntry;
use crate::timing::TimingSource;

/// A successful check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInOutcome {
    /// The Open record that was created.
    pub record: AttendanceRecord,
    /// The location verdict, for office check-ins.
    pub validation: Option<ValidationResult>,
    /// Whether the department timing was configured or defaulted.
    pub timing_source: TimingSource,
    /// The armed auto-checkout, if the deadline was still ahead.
    pub scheduled: Option<SchedulerEntry>,
    /// Message for the employee.
    pub message: String,
}

/// A successful check-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutOutcome {
    /// The Closed record.
    pub record: AttendanceRecord,
    /// Metrics computed against the actual checkout instant.
    pub metrics: TimeMetrics,
    /// Persisted regular hours.
    pub regular_hours: Decimal,
    /// Persisted overtime hours; zero unless overtime was enabled.
    pub overtime_hours: Decimal,
    /// True when the department disallows early checkout and this one was early.
    pub early_check_out_flagged: bool,
    /// Message for the employee.
    pub message: String,
}

/// A successful overtime opt-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeOutcome {
    /// The record with its overtime state set to pending.
    pub record: AttendanceRecord,
    /// The new auto-checkout deadline.
    pub auto_check_out_at: NaiveDateTime,
    /// Message for the employee.
    pub message: String,
}

/// Envelope returned for a check-in attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInResponse {
    /// Whether the check-in was recorded.
    pub success: bool,
    /// The created record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    /// Human-readable outcome.
    pub message: String,
    /// The location verdict, present for office check-ins that got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

impl From<EngineResult<CheckInOutcome>> for CheckInResponse {
    fn from(result: EngineResult<CheckInOutcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                record_id: Some(outcome.record.id),
                message: outcome.message,
                validation: outcome.validation,
            },
            Err(EngineError::LocationRejected { validation, .. }) => {
                let message = rejection_message(&validation);
                Self {
                    success: false,
                    record_id: None,
                    message,
                    validation: Some(*validation),
                }
            }
            Err(e) => Self {
                success: false,
                record_id: None,
                message: e.user_message(),
                validation: None,
            },
        }
    }
}

fn rejection_message(validation: &ValidationResult) -> String {
    let headline = match validation.distance_meters {
        Some(distance) => format!(
            "Location could not be verified: {:.0}m from the nearest office",
            distance
        ),
        None => "Location could not be verified".to_string(),
    };
    match validation.recommendations.first() {
        Some(advice) => format!("{}. {}", headline, advice),
        None => headline,
    }
}

/// Envelope returned for a check-out attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutResponse {
    /// Whether the checkout was recorded.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Persisted regular hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_hours: Option<Decimal>,
    /// Persisted overtime hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overtime_hours: Option<Decimal>,
}

impl From<EngineResult<CheckOutOutcome>> for CheckOutResponse {
    fn from(result: EngineResult<CheckOutOutcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                message: outcome.message,
                regular_hours: Some(outcome.regular_hours),
                overtime_hours: Some(outcome.overtime_hours),
            },
            Err(e) => Self {
                success: false,
                message: e.user_message(),
                regular_hours: None,
                overtime_hours: None,
            },
        }
    }
}

/// Envelope returned for an overtime opt-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeResponse {
    /// Whether overtime was enabled.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl From<EngineResult<OvertimeOutcome>> for OvertimeResponse {
    fn from(result: EngineResult<OvertimeOutcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                message: outcome.message,
            },
            Err(e) => Self {
                success: false,
                message: e.user_message(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationTier;
    use crate::store::StoreError;

    fn failed_validation() -> ValidationResult {
        ValidationResult {
            is_valid: false,
            confidence: 0.0,
            tier: ValidationTier::Failed,
            distance_meters: Some(412.4),
            office_id: None,
            office_name: None,
            nearest_office_id: Some("hq".to_string()),
            effective_radius_meters: Some(100.0),
            accuracy_meters: 15.0,
            fallback_applied: false,
            recommendations: vec!["Move closer to the office".to_string()],
        }
    }

    #[test]
    fn test_rejected_check_in_carries_validation_and_advice() {
        let response = CheckInResponse::from(Err(EngineError::LocationRejected {
            distance_meters: 412.4,
            validation: Box::new(failed_validation()),
        }));

        assert!(!response.success);
        assert!(response.record_id.is_none());
        assert!(response.message.contains("412m"));
        assert!(response.message.contains("Move closer to the office"));
        assert_eq!(response.validation.unwrap().tier, ValidationTier::Failed);
    }

    #[test]
    fn test_store_failure_is_reported_generically() {
        let response = CheckOutResponse::from(Err(EngineError::Store(StoreError::Unavailable {
            message: "connection reset by peer".to_string(),
        })));

        assert!(!response.success);
        assert!(!response.message.contains("connection reset"));
        assert!(response.regular_hours.is_none());
    }

    #[test]
    fn test_failed_overtime_response_serializes_flat() {
        let response = OvertimeResponse::from(Err(EngineError::OvertimeAlreadyRequested {
            employee_id: "emp_001".to_string(),
        }));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Overtime already requested for employee 'emp_001'");
    }
}
