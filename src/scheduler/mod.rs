//! Auto-checkout scheduling.
//!
//! The scheduler owns at most one pending timer per checked-in employee and
//! closes records for employees who forget to check out. A timer fires
//! either a grace window after the department checkout time or at the daily
//! cutoff (the overtime path). A periodic sweep and a daily cutoff sweep act
//! as safety nets for timers lost to restarts.
//!
//! The timer table is not durable. Each record carries its own
//! `auto_check_out_enabled` / `auto_check_out_time`, and
//! [`AutoCheckoutScheduler::resume_on_start`] rebuilds the table from Open
//! records.

mod auto_checkout;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AttendanceRecord, ClosureReason};

pub use auto_checkout::AutoCheckoutScheduler;

/// Which deadline a timer was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPath {
    /// Grace window after the department checkout time.
    GracePeriod,
    /// End-of-day cutoff.
    DailyCutoff,
}

impl TimerPath {
    /// The closure reason written when a timer on this path fires.
    pub fn closure_reason(self) -> ClosureReason {
        match self {
            TimerPath::GracePeriod => ClosureReason::AutoTwoHour,
            TimerPath::DailyCutoff => ClosureReason::AutoDailyCleanup,
        }
    }
}

/// A pending auto-checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerEntry {
    /// The employee the timer belongs to.
    pub employee_id: String,
    /// The record the timer will close.
    pub attendance_record_id: Uuid,
    /// When the timer fires.
    pub fire_at: NaiveDateTime,
    /// Which deadline the timer was armed for.
    pub path: TimerPath,
}

/// What a fire attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    /// The record was closed.
    Closed(Box<AttendanceRecord>),
    /// The record was already closed; nothing was written.
    AlreadyClosed,
    /// Overtime is pending; only the daily cutoff may close the record.
    Suspended,
    /// The record no longer exists or belongs to someone else.
    Missing,
}

/// What triggered a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// The periodic safety-net pass.
    Periodic,
    /// The end-of-day pass; every record of the day is due.
    DailyCutoff,
    /// Triggered by an operator.
    Manual,
}

/// Counters from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Open records inspected.
    pub examined: usize,
    /// Records closed by this pass.
    pub closed: usize,
    /// Records not yet due, suspended by overtime, or already closed.
    pub skipped: usize,
    /// Records whose closure failed; they stay Open for the next pass.
    pub failed: usize,
}
