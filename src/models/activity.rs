//! Activity log entries.
//!
//! Entries are appended through the store's audit sink. Location validations
//! are always logged, pass or fail.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    /// A position was validated against the office list.
    LocationValidation,
    /// An attendance record was opened.
    CheckIn,
    /// An employee checked out.
    CheckOut,
    /// The scheduler closed a record.
    AutoCheckOut,
    /// An employee opted in to overtime.
    OvertimeEnabled,
}

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Entry id.
    pub id: Uuid,
    /// The employee the entry is about.
    pub employee_id: String,
    /// The record the entry is about, when one exists.
    pub record_id: Option<Uuid>,
    /// What happened.
    pub action: ActivityAction,
    /// Action-specific payload.
    pub details: serde_json::Value,
    /// When it happened.
    pub recorded_at: NaiveDateTime,
}

impl ActivityLogEntry {
    /// Creates an entry with a fresh id.
    pub fn new(
        employee_id: impl Into<String>,
        record_id: Option<Uuid>,
        action: ActivityAction,
        details: serde_json::Value,
        recorded_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            record_id,
            action,
            details,
            recorded_at,
        }
    }
}
