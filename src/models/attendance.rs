//! Attendance record model.
//!
//! An [`AttendanceRecord`] exists once per employee per calendar day. It is
//! created Open at check-in and becomes Closed when a [`Closure`] is
//! attached, either by a manual checkout or by the auto-checkout scheduler.
//! Closed records are never modified again by the engine.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Coordinate, ValidationTier};

/// Where the employee is working from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceType {
    /// At an office; the position must be validated.
    Office,
    /// Working remotely; a reason is required.
    Remote,
    /// At a customer site; a site reference and a photo are required.
    Field,
}

impl std::fmt::Display for AttendanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceType::Office => write!(f, "office"),
            AttendanceType::Remote => write!(f, "remote"),
            AttendanceType::Field => write!(f, "field"),
        }
    }
}

/// Why a record was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureReason {
    /// The employee checked out.
    Manual,
    /// Closed by the timer two hours after the department checkout time.
    AutoTwoHour,
    /// Closed by the end-of-day cutoff.
    AutoDailyCleanup,
}

impl ClosureReason {
    /// Returns true for closures written by the scheduler.
    pub fn is_automatic(self) -> bool {
        !matches!(self, ClosureReason::Manual)
    }
}

impl std::fmt::Display for ClosureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClosureReason::Manual => write!(f, "manual"),
            ClosureReason::AutoTwoHour => write!(f, "auto_two_hour"),
            ClosureReason::AutoDailyCleanup => write!(f, "auto_daily_cleanup"),
        }
    }
}

/// Approval state of an overtime request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// The employee has not opted in.
    #[default]
    NotRequested,
    /// The employee opted in; approval happens elsewhere.
    Pending,
}

/// Overtime opt-in state embedded in a record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OvertimeState {
    /// Whether overtime was explicitly enabled.
    pub enabled: bool,
    /// When the employee opted in.
    pub requested_at: Option<NaiveDateTime>,
    /// Approval state.
    pub approval_status: ApprovalStatus,
}

impl OvertimeState {
    /// A freshly requested overtime state.
    pub fn requested(at: NaiveDateTime) -> Self {
        Self {
            enabled: true,
            requested_at: Some(at),
            approval_status: ApprovalStatus::Pending,
        }
    }

    /// Returns true if a request is awaiting approval.
    pub fn is_pending(&self) -> bool {
        self.approval_status == ApprovalStatus::Pending
    }
}

/// Location-validation metadata captured at an office check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationValidationMeta {
    /// Confidence the check-in was recorded with.
    pub confidence: f64,
    /// Tier the validation landed in.
    pub validation_type: ValidationTier,
    /// Distance to the matched (or nearest) office in meters.
    pub distance_meters: f64,
    /// The office the fix was matched to, if any.
    pub detected_office_id: Option<String>,
    /// Reported accuracy radius of the fix.
    pub accuracy_meters: f64,
    /// True when a failed validation was admitted by the low-accuracy fallback.
    #[serde(default)]
    pub fallback_applied: bool,
}

/// The closing half of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Closure {
    /// Checkout instant written to the record.
    pub check_out_time: NaiveDateTime,
    /// Position reported at checkout, if any.
    pub check_out_location: Option<Coordinate>,
    /// Free-text reason given at checkout.
    pub check_out_reason: Option<String>,
    /// Regular hours, rounded to two decimal places.
    pub regular_working_hours: Decimal,
    /// Overtime hours, rounded to two decimal places.
    pub overtime_hours: Decimal,
    /// How the record was closed.
    pub reason: ClosureReason,
    /// Minutes before the expected checkout time, if the checkout was early.
    #[serde(default)]
    pub early_minutes: i64,
    /// True when the checkout preceded the check-in and the duration was clamped.
    #[serde(default)]
    pub duration_clamped: bool,
}

/// Auto-checkout deadline fields, written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCheckOut {
    /// Whether the scheduler should close the record.
    pub enabled: bool,
    /// When it should do so.
    pub at: Option<NaiveDateTime>,
}

/// Whether a record is still waiting for a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Checked in, not yet checked out.
    Open,
    /// Checked out.
    Closed,
}

/// One attendance record per employee per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Record id assigned by the store.
    pub id: Uuid,
    /// The employee this record belongs to.
    pub employee_id: String,
    /// Department at check-in time; drives timing lookups for this record.
    pub department: String,
    /// Calendar day of the check-in.
    pub date: NaiveDate,
    /// Office, remote or field.
    pub attendance_type: AttendanceType,
    /// Check-in instant.
    pub check_in_time: NaiveDateTime,
    /// Position reported at check-in.
    pub check_in_location: Option<Coordinate>,
    /// Office validation outcome; only set for office check-ins.
    pub location_validation: Option<LocationValidationMeta>,
    /// Whether the check-in was after the expected check-in time.
    pub is_late: bool,
    /// Whole minutes late.
    pub late_minutes: i64,
    /// Reason given for remote work.
    pub remote_reason: Option<String>,
    /// Customer site reference for field work.
    pub customer_site_id: Option<String>,
    /// Photo reference for field work.
    pub photo_ref: Option<String>,
    /// Whether the scheduler should close this record.
    pub auto_check_out_enabled: bool,
    /// When the scheduler should close this record.
    pub auto_check_out_time: Option<NaiveDateTime>,
    /// Overtime opt-in state.
    #[serde(default)]
    pub overtime: OvertimeState,
    /// Set once the record is closed.
    pub closure: Option<Closure>,
}

impl AttendanceRecord {
    /// Returns the lifecycle state of the record.
    pub fn status(&self) -> RecordStatus {
        if self.closure.is_some() {
            RecordStatus::Closed
        } else {
            RecordStatus::Open
        }
    }

    /// Returns true while the record has no checkout.
    pub fn is_open(&self) -> bool {
        self.status() == RecordStatus::Open
    }

    /// Returns the auto-checkout deadline if the scheduler owns this record.
    pub fn auto_check_out_deadline(&self) -> Option<NaiveDateTime> {
        if self.auto_check_out_enabled {
            self.auto_check_out_time
        } else {
            None
        }
    }
}

/// Fields for creating a record; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttendanceRecord {
    /// The employee checking in.
    pub employee_id: String,
    /// The employee's department.
    pub department: String,
    /// Calendar day of the check-in.
    pub date: NaiveDate,
    /// Office, remote or field.
    pub attendance_type: AttendanceType,
    /// Check-in instant.
    pub check_in_time: NaiveDateTime,
    /// Position reported at check-in.
    pub check_in_location: Option<Coordinate>,
    /// Office validation outcome.
    pub location_validation: Option<LocationValidationMeta>,
    /// Whether the check-in was late.
    pub is_late: bool,
    /// Whole minutes late.
    pub late_minutes: i64,
    /// Reason given for remote work.
    pub remote_reason: Option<String>,
    /// Customer site reference for field work.
    pub customer_site_id: Option<String>,
    /// Photo reference for field work.
    pub photo_ref: Option<String>,
    /// Auto-checkout deadline.
    pub auto_check_out: AutoCheckOut,
}

impl NewAttendanceRecord {
    /// Materializes an Open record with the given id.
    pub fn into_record(self, id: Uuid) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id: self.employee_id,
            department: self.department,
            date: self.date,
            attendance_type: self.attendance_type,
            check_in_time: self.check_in_time,
            check_in_location: self.check_in_location,
            location_validation: self.location_validation,
            is_late: self.is_late,
            late_minutes: self.late_minutes,
            remote_reason: self.remote_reason,
            customer_site_id: self.customer_site_id,
            photo_ref: self.photo_ref,
            auto_check_out_enabled: self.auto_check_out.enabled,
            auto_check_out_time: self.auto_check_out.at,
            overtime: OvertimeState::default(),
            closure: None,
        }
    }
}

/// A partial update to a record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendancePatch {
    /// Closes the record.
    pub closure: Option<Closure>,
    /// Replaces the overtime state.
    pub overtime: Option<OvertimeState>,
    /// Replaces the auto-checkout deadline.
    pub auto_check_out: Option<AutoCheckOut>,
}

impl AttendancePatch {
    /// A patch that closes the record and disables auto-checkout.
    pub fn close(closure: Closure) -> Self {
        Self {
            closure: Some(closure),
            overtime: None,
            auto_check_out: Some(AutoCheckOut {
                enabled: false,
                at: None,
            }),
        }
    }

    /// Applies the patch in place.
    pub fn apply(&self, record: &mut AttendanceRecord) {
        if let Some(closure) = &self.closure {
            record.closure = Some(closure.clone());
        }
        if let Some(overtime) = &self.overtime {
            record.overtime = overtime.clone();
        }
        if let Some(auto) = self.auto_check_out {
            record.auto_check_out_enabled = auto.enabled;
            record.auto_check_out_time = auto.at;
        }
    }
}

/// Converts an internal hour quantity into the two-decimal value that is persisted.
///
/// # Examples
///
/// ```
/// use attendance_engine::models::persisted_hours;
/// use rust_decimal::Decimal;
///
/// assert_eq!(persisted_hours(8.0 + 1.0 / 3.0), Decimal::new(833, 2));
/// assert_eq!(persisted_hours(f64::NAN), Decimal::ZERO);
/// ```
pub fn persisted_hours(hours: f64) -> Decimal {
    Decimal::from_f64(hours)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn open_record() -> AttendanceRecord {
        NewAttendanceRecord {
            employee_id: "emp_001".to_string(),
            department: "Engineering".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            attendance_type: AttendanceType::Office,
            check_in_time: make_datetime("2026-01-15 09:00:00"),
            check_in_location: Some(Coordinate::new(9.9668, 78.1338)),
            location_validation: None,
            is_late: false,
            late_minutes: 0,
            remote_reason: None,
            customer_site_id: None,
            photo_ref: None,
            auto_check_out: AutoCheckOut {
                enabled: true,
                at: Some(make_datetime("2026-01-15 20:00:00")),
            },
        }
        .into_record(Uuid::new_v4())
    }

    #[test]
    fn test_new_record_is_open_with_deadline() {
        let record = open_record();
        assert!(record.is_open());
        assert_eq!(record.status(), RecordStatus::Open);
        assert_eq!(
            record.auto_check_out_deadline(),
            Some(make_datetime("2026-01-15 20:00:00"))
        );
        assert_eq!(record.overtime.approval_status, ApprovalStatus::NotRequested);
    }

    #[test]
    fn test_close_patch_closes_and_disarms() {
        let mut record = open_record();
        let patch = AttendancePatch::close(Closure {
            check_out_time: make_datetime("2026-01-15 18:00:00"),
            check_out_location: None,
            check_out_reason: None,
            regular_working_hours: Decimal::new(900, 2),
            overtime_hours: Decimal::ZERO,
            reason: ClosureReason::AutoTwoHour,
            early_minutes: 0,
            duration_clamped: false,
        });
        assert!(patch.closure.is_some());

        patch.apply(&mut record);

        assert_eq!(record.status(), RecordStatus::Closed);
        assert!(!record.auto_check_out_enabled);
        assert_eq!(record.auto_check_out_deadline(), None);
    }

    #[test]
    fn test_overtime_patch_leaves_record_open() {
        let mut record = open_record();
        let patch = AttendancePatch {
            overtime: Some(OvertimeState::requested(make_datetime("2026-01-15 18:05:00"))),
            auto_check_out: Some(AutoCheckOut {
                enabled: true,
                at: Some(make_datetime("2026-01-15 23:55:00")),
            }),
            ..Default::default()
        };

        patch.apply(&mut record);

        assert!(record.is_open());
        assert!(record.overtime.enabled);
        assert!(record.overtime.is_pending());
        assert_eq!(
            record.auto_check_out_time,
            Some(make_datetime("2026-01-15 23:55:00"))
        );
    }

    #[test]
    fn test_closure_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&ClosureReason::AutoTwoHour).unwrap(),
            "\"auto_two_hour\""
        );
        assert_eq!(ClosureReason::AutoDailyCleanup.to_string(), "auto_daily_cleanup");
        assert!(ClosureReason::AutoDailyCleanup.is_automatic());
        assert!(!ClosureReason::Manual.is_automatic());
    }

    #[test]
    fn test_persisted_hours_rounds_half_away_from_zero() {
        assert_eq!(persisted_hours(9.0), Decimal::new(9, 0));
        assert_eq!(persisted_hours(0.125), Decimal::new(13, 2));
        assert_eq!(persisted_hours(0.004), Decimal::ZERO);
    }
}
