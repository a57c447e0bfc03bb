//! Persistence seam for the Attendance Engine.
//!
//! The engine does not own storage. It talks to an [`AttendanceStore`], an
//! opaque record store owned by the surrounding application, and expects at
//! least last-write-wins semantics per record id. [`InMemoryStore`] is a
//! complete reference implementation used by tests and local runs.

mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ActivityLogEntry, AttendancePatch, AttendanceRecord, DepartmentTiming, Employee,
    NewAttendanceRecord, OfficeLocation,
};

pub use memory::InMemoryStore;

/// Errors reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: String,
        /// The id that was looked up.
        id: String,
    },

    /// The write conflicts with the record's current state.
    #[error("Conflict: {message}")]
    Conflict {
        /// What conflicted.
        message: String,
    },

    /// The backend could not be reached or failed mid-operation.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Backend-specific description.
        message: String,
    },
}

/// Operations the engine needs from the surrounding record store.
///
/// Implementations must reject a closing patch on an already closed record
/// with [`StoreError::Conflict`]; the scheduler relies on this to turn a
/// race between a manual and an automatic checkout into a no-op.
#[async_trait]
pub trait AttendanceStore: Send + Sync + 'static {
    /// Looks up an employee.
    async fn get_employee(&self, employee_id: &str) -> Result<Option<Employee>, StoreError>;

    /// Lists every configured office.
    async fn get_office_locations(&self) -> Result<Vec<OfficeLocation>, StoreError>;

    /// Looks up a department's timing. Matching is case-insensitive.
    async fn get_department_timing(
        &self,
        department: &str,
    ) -> Result<Option<DepartmentTiming>, StoreError>;

    /// Looks up an employee's record for a calendar day.
    async fn get_attendance_record(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Looks up a record by id.
    async fn get_attendance_record_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Creates an Open record.
    async fn create_attendance_record(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError>;

    /// Applies a partial update and returns the updated record.
    async fn update_attendance_record(
        &self,
        id: Uuid,
        patch: AttendancePatch,
    ) -> Result<AttendanceRecord, StoreError>;

    /// Lists the Open records of a calendar day.
    async fn list_open_attendance_records(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Lists every Open record dated on or before `date`, oldest day first.
    ///
    /// Used after downtime, when records of any past day may still be Open.
    async fn list_open_attendance_records_through(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Appends an audit entry. Callers never fail because of this.
    async fn append_activity_log(&self, entry: ActivityLogEntry) -> Result<(), StoreError>;
}

/// Appends an audit entry, logging and swallowing any failure.
pub(crate) async fn append_activity(store: &dyn AttendanceStore, entry: ActivityLogEntry) {
    let action = entry.action;
    let employee_id = entry.employee_id.clone();
    if let Err(e) = store.append_activity_log(entry).await {
        tracing::warn!(
            employee_id = %employee_id,
            action = ?action,
            error = %e,
            "Failed to append activity log entry"
        );
    }
}
