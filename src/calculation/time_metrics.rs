//! Time accounting against a department's working window.
//!
//! This module derives lateness, early departure, and the regular/overtime
//! split from a department's configured wall-clock boundaries and the
//! employee's actual check-in/check-out instants.
//!
//! Overtime is `max(0, total - working_hours)`. Hours stay in full `f64`
//! precision here; they are rounded to two decimals only by
//! [`closure_hours`], which produces the values that get persisted.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{ClosureReason, DepartmentTiming, persisted_hours};

/// Lateness, earliness and hour split for one attendance day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMetrics {
    /// Expected check-in instant on the check-in day.
    pub expected_check_in: NaiveDateTime,
    /// Expected check-out instant on the check-in day.
    pub expected_check_out: NaiveDateTime,
    /// Whether the check-in was after the expected check-in.
    pub is_late: bool,
    /// Whole minutes late, 0 when on time.
    pub late_minutes: i64,
    /// Whether lateness exceeded the department's tolerance.
    pub exceeds_late_threshold: bool,
    /// Whether the checkout was before the expected check-out.
    pub is_early_check_out: bool,
    /// Whole minutes early, 0 when not early.
    pub early_minutes: i64,
    /// Elapsed hours between check-in and checkout, floored at 0.
    pub total_hours: f64,
    /// `total_hours - overtime_hours`.
    pub regular_hours: f64,
    /// Hours beyond the department's working hours.
    pub overtime_hours: f64,
    /// True when the checkout preceded the check-in and the duration was clamped to 0.
    pub duration_clamped: bool,
}

/// Computes time metrics for a check-in and an optional checkout.
///
/// Expected boundaries are anchored on the calendar day of `check_in`.
/// Without a checkout every hour quantity is 0. A checkout before the
/// check-in clamps the duration to 0 and sets `duration_clamped`.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::calculate_time_metrics;
/// use attendance_engine::models::DepartmentTiming;
/// use chrono::NaiveDate;
///
/// let timing = DepartmentTiming {
///     department: "Engineering".to_string(),
///     check_in_time: "09:00".parse().unwrap(),
///     check_out_time: "18:00".parse().unwrap(),
///     working_hours: 8.0,
///     late_threshold_minutes: 15,
///     is_flexible_timing: false,
///     allow_early_check_out: true,
/// };
/// let day = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
///
/// let metrics = calculate_time_metrics(
///     &timing,
///     day.and_hms_opt(9, 10, 0).unwrap(),
///     Some(day.and_hms_opt(19, 10, 0).unwrap()),
/// );
///
/// assert!(metrics.is_late);
/// assert_eq!(metrics.late_minutes, 10);
/// assert_eq!(metrics.total_hours, 10.0);
/// assert_eq!(metrics.overtime_hours, 2.0);
/// assert_eq!(metrics.regular_hours, 8.0);
/// ```
pub fn calculate_time_metrics(
    timing: &DepartmentTiming,
    check_in: NaiveDateTime,
    check_out: Option<NaiveDateTime>,
) -> TimeMetrics {
    let day = check_in.date();
    let expected_check_in = timing.expected_check_in(day);
    let expected_check_out = timing.expected_check_out(day);

    let (is_late, late_minutes) = if !timing.is_flexible_timing && check_in > expected_check_in {
        (true, (check_in - expected_check_in).num_minutes())
    } else {
        (false, 0)
    };
    let exceeds_late_threshold = is_late && late_minutes > i64::from(timing.late_threshold_minutes);

    let Some(check_out) = check_out else {
        return TimeMetrics {
            expected_check_in,
            expected_check_out,
            is_late,
            late_minutes,
            exceeds_late_threshold,
            is_early_check_out: false,
            early_minutes: 0,
            total_hours: 0.0,
            regular_hours: 0.0,
            overtime_hours: 0.0,
            duration_clamped: false,
        };
    };

    let (is_early_check_out, early_minutes) =
        if !timing.is_flexible_timing && check_out < expected_check_out {
            (true, (expected_check_out - check_out).num_minutes())
        } else {
            (false, 0)
        };

    let elapsed_seconds = (check_out - check_in).num_seconds();
    let duration_clamped = elapsed_seconds < 0;
    let total_hours = (elapsed_seconds.max(0) as f64) / 3600.0;

    let working_hours = timing.working_hours.max(0.0);
    let overtime_hours = (total_hours - working_hours).max(0.0);
    let regular_hours = (total_hours - overtime_hours).max(0.0);

    TimeMetrics {
        expected_check_in,
        expected_check_out,
        is_late,
        late_minutes,
        exceeds_late_threshold,
        is_early_check_out,
        early_minutes,
        total_hours,
        regular_hours,
        overtime_hours,
        duration_clamped,
    }
}

/// The persisted regular/overtime split of a closed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureHours {
    /// Regular hours, two decimals.
    pub regular_hours: Decimal,
    /// Overtime hours, two decimals.
    pub overtime_hours: Decimal,
}

/// Splits metrics into the hours that get written when a record closes.
///
/// Manual and automatic closures share this one rule set:
///
/// - Automatic closures are computed with the checkout clamped to the
///   expected checkout, so every computed hour is regular and overtime is
///   always 0.
/// - Manual closures keep the computed regular hours; overtime is only
///   recorded when the employee explicitly enabled it.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{calculate_time_metrics, closure_hours};
/// use attendance_engine::models::{ClosureReason, DepartmentTiming};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let timing = DepartmentTiming {
///     department: "Engineering".to_string(),
///     check_in_time: "09:00".parse().unwrap(),
///     check_out_time: "18:00".parse().unwrap(),
///     working_hours: 8.0,
///     late_threshold_minutes: 0,
///     is_flexible_timing: false,
///     allow_early_check_out: true,
/// };
/// let day = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// let metrics = calculate_time_metrics(
///     &timing,
///     day.and_hms_opt(9, 0, 0).unwrap(),
///     Some(day.and_hms_opt(18, 0, 0).unwrap()),
/// );
///
/// let hours = closure_hours(&metrics, ClosureReason::AutoTwoHour, false);
/// assert_eq!(hours.regular_hours, Decimal::new(9, 0));
/// assert_eq!(hours.overtime_hours, Decimal::ZERO);
/// ```
pub fn closure_hours(
    metrics: &TimeMetrics,
    reason: ClosureReason,
    overtime_enabled: bool,
) -> ClosureHours {
    if reason.is_automatic() {
        return ClosureHours {
            regular_hours: persisted_hours(metrics.total_hours),
            overtime_hours: Decimal::ZERO,
        };
    }

    let overtime = if overtime_enabled {
        metrics.overtime_hours
    } else {
        0.0
    };

    ClosureHours {
        regular_hours: persisted_hours(metrics.regular_hours),
        overtime_hours: persisted_hours(overtime),
    }
}
