//! In-memory store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    ActivityLogEntry, AttendancePatch, AttendanceRecord, DepartmentTiming, Employee,
    NewAttendanceRecord, OfficeLocation,
};

use super::{AttendanceStore, StoreError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// A process-local [`AttendanceStore`].
///
/// Enforces one record per employee per day and the immutability of closed
/// records. Failure injection hooks let tests simulate transient backend
/// errors for particular employees.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    employees: Mutex<HashMap<String, Employee>>,
    offices: Mutex<Vec<OfficeLocation>>,
    timings: Mutex<HashMap<String, DepartmentTiming>>,
    records: Mutex<HashMap<Uuid, AttendanceRecord>>,
    activity: Mutex<Vec<ActivityLogEntry>>,
    failing_updates: Mutex<HashSet<String>>,
    fail_activity_log: AtomicBool,
    unavailable: AtomicBool,
    timing_reads: AtomicU64,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee.
    pub fn add_employee(&self, employee: Employee) {
        lock(&self.employees).insert(employee.id.clone(), employee);
    }

    /// Adds an office.
    pub fn add_office(&self, office: OfficeLocation) {
        lock(&self.offices).push(office);
    }

    /// Adds or replaces a department timing.
    pub fn put_department_timing(&self, timing: DepartmentTiming) {
        lock(&self.timings).insert(timing.department.to_lowercase(), timing);
    }

    /// Inserts a record as-is, bypassing the create rules.
    pub fn insert_record(&self, record: AttendanceRecord) {
        lock(&self.records).insert(record.id, record);
    }

    /// Returns a snapshot of every record.
    pub fn records(&self) -> Vec<AttendanceRecord> {
        lock(&self.records).values().cloned().collect()
    }

    /// Returns a record by id.
    pub fn record(&self, id: Uuid) -> Option<AttendanceRecord> {
        lock(&self.records).get(&id).cloned()
    }

    /// Returns a snapshot of the activity log.
    pub fn activity_log(&self) -> Vec<ActivityLogEntry> {
        lock(&self.activity).clone()
    }

    /// Number of department timing reads served.
    pub fn timing_reads(&self) -> u64 {
        self.timing_reads.load(Ordering::Relaxed)
    }

    /// Makes record updates fail for `employee_id` until cleared.
    pub fn fail_updates_for(&self, employee_id: &str) {
        lock(&self.failing_updates).insert(employee_id.to_string());
    }

    /// Clears injected update failures.
    pub fn clear_update_failures(&self) {
        lock(&self.failing_updates).clear();
    }

    /// Makes activity-log appends fail.
    pub fn set_activity_log_failing(&self, failing: bool) {
        self.fail_activity_log.store(failing, Ordering::Relaxed);
    }

    /// Makes every record operation fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable {
                message: "in-memory store marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn get_employee(&self, employee_id: &str) -> Result<Option<Employee>, StoreError> {
        self.check_available()?;
        Ok(lock(&self.employees).get(employee_id).cloned())
    }

    async fn get_office_locations(&self) -> Result<Vec<OfficeLocation>, StoreError> {
        self.check_available()?;
        Ok(lock(&self.offices).clone())
    }

    async fn get_department_timing(
        &self,
        department: &str,
    ) -> Result<Option<DepartmentTiming>, StoreError> {
        self.check_available()?;
        self.timing_reads.fetch_add(1, Ordering::Relaxed);
        Ok(lock(&self.timings).get(&department.to_lowercase()).cloned())
    }

    async fn get_attendance_record(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.check_available()?;
        Ok(lock(&self.records)
            .values()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn get_attendance_record_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.check_available()?;
        Ok(lock(&self.records).get(&id).cloned())
    }

    async fn create_attendance_record(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError> {
        self.check_available()?;
        let mut records = lock(&self.records);

        let duplicate = records
            .values()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date);
        if duplicate {
            return Err(StoreError::Conflict {
                message: format!(
                    "attendance for '{}' on {} already exists",
                    record.employee_id, record.date
                ),
            });
        }

        let created = record.into_record(Uuid::new_v4());
        records.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_attendance_record(
        &self,
        id: Uuid,
        patch: AttendancePatch,
    ) -> Result<AttendanceRecord, StoreError> {
        self.check_available()?;
        let mut records = lock(&self.records);

        let record = records.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "attendance record".to_string(),
            id: id.to_string(),
        })?;

        if lock(&self.failing_updates).contains(&record.employee_id) {
            return Err(StoreError::Unavailable {
                message: format!("injected update failure for '{}'", record.employee_id),
            });
        }

        if !record.is_open() {
            return Err(StoreError::Conflict {
                message: format!("attendance record {} is already closed", id),
            });
        }

        patch.apply(record);
        Ok(record.clone())
    }

    async fn list_open_attendance_records(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.check_available()?;
        let mut open: Vec<AttendanceRecord> = lock(&self.records)
            .values()
            .filter(|r| r.date == date && r.is_open())
            .cloned()
            .collect();
        open.sort_by(|a, b| a.check_in_time.cmp(&b.check_in_time));
        Ok(open)
    }

    async fn list_open_attendance_records_through(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.check_available()?;
        let mut open: Vec<AttendanceRecord> = lock(&self.records)
            .values()
            .filter(|r| r.date <= date && r.is_open())
            .cloned()
            .collect();
        open.sort_by(|a, b| (a.date, a.check_in_time).cmp(&(b.date, b.check_in_time)));
        Ok(open)
    }

    async fn append_activity_log(&self, entry: ActivityLogEntry) -> Result<(), StoreError> {
        if self.fail_activity_log.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable {
                message: "activity log unavailable".to_string(),
            });
        }
        lock(&self.activity).push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceType, AutoCheckOut, Closure, ClosureReason};
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn new_record(employee_id: &str) -> NewAttendanceRecord {
        NewAttendanceRecord {
            employee_id: employee_id.to_string(),
            department: "Engineering".to_string(),
            date: day(),
            attendance_type: AttendanceType::Remote,
            check_in_time: at(9, 0),
            check_in_location: None,
            location_validation: None,
            is_late: false,
            late_minutes: 0,
            remote_reason: Some("plumber visit".to_string()),
            customer_site_id: None,
            photo_ref: None,
            auto_check_out: AutoCheckOut {
                enabled: true,
                at: Some(at(20, 0)),
            },
        }
    }

    fn closure() -> Closure {
        Closure {
            check_out_time: at(18, 0),
            check_out_location: None,
            check_out_reason: None,
            regular_working_hours: Decimal::new(8, 0),
            overtime_hours: Decimal::ZERO,
            reason: ClosureReason::Manual,
            early_minutes: 0,
            duration_clamped: false,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_second_record_same_day() {
        let store = InMemoryStore::new();
        store.create_attendance_record(new_record("emp_001")).await.unwrap();

        let result = store.create_attendance_record(new_record("emp_001")).await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_closed_record_is_immutable() {
        let store = InMemoryStore::new();
        let record = store.create_attendance_record(new_record("emp_001")).await.unwrap();

        store
            .update_attendance_record(record.id, AttendancePatch::close(closure()))
            .await
            .unwrap();
        let second = store
            .update_attendance_record(record.id, AttendancePatch::close(closure()))
            .await;

        assert!(matches!(second, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_list_open_excludes_closed_and_other_days() {
        let store = InMemoryStore::new();
        let a = store.create_attendance_record(new_record("emp_a")).await.unwrap();
        store.create_attendance_record(new_record("emp_b")).await.unwrap();
        let mut other_day = new_record("emp_c");
        other_day.date = day().succ_opt().unwrap();
        store.create_attendance_record(other_day).await.unwrap();

        store
            .update_attendance_record(a.id, AttendancePatch::close(closure()))
            .await
            .unwrap();

        let open = store.list_open_attendance_records(day()).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].employee_id, "emp_b");
    }

    #[tokio::test]
    async fn test_list_open_through_includes_every_past_day() {
        let store = InMemoryStore::new();
        let mut old = new_record("emp_old");
        old.date = day() - chrono::Duration::days(3);
        store.create_attendance_record(old).await.unwrap();
        store.create_attendance_record(new_record("emp_today")).await.unwrap();
        let mut future = new_record("emp_next");
        future.date = day().succ_opt().unwrap();
        store.create_attendance_record(future).await.unwrap();

        let open = store.list_open_attendance_records_through(day()).await.unwrap();

        let ids: Vec<&str> = open.iter().map(|r| r.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["emp_old", "emp_today"]);
    }

    #[tokio::test]
    async fn test_department_timing_lookup_is_case_insensitive() {
        let store = InMemoryStore::new();
        store.put_department_timing(DepartmentTiming {
            department: "Engineering".to_string(),
            check_in_time: "09:00".parse().unwrap(),
            check_out_time: "18:00".parse().unwrap(),
            working_hours: 8.0,
            late_threshold_minutes: 0,
            is_flexible_timing: false,
            allow_early_check_out: true,
        });

        let timing = store.get_department_timing("ENGINEERING").await.unwrap();

        assert!(timing.is_some());
        assert_eq!(store.timing_reads(), 1);
    }

    #[tokio::test]
    async fn test_injected_update_failure() {
        let store = InMemoryStore::new();
        let record = store.create_attendance_record(new_record("emp_001")).await.unwrap();
        store.fail_updates_for("emp_001");

        let result = store
            .update_attendance_record(record.id, AttendancePatch::close(closure()))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));

        store.clear_update_failures();
        assert!(
            store
                .update_attendance_record(record.id, AttendancePatch::close(closure()))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_reads() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        assert!(store.get_office_locations().await.is_err());
    }
}
