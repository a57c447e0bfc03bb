//! The auto-checkout scheduler.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{calculate_time_metrics, closure_hours};
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::EngineResult;
use crate::models::{
    ActivityAction, ActivityLogEntry, AttendancePatch, AttendanceRecord, Closure, ClosureReason,
};
use crate::store::{AttendanceStore, StoreError, append_activity};
use crate::timing::TimingService;

use super::{FireOutcome, SchedulerEntry, SweepKind, SweepReport, TimerPath};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

struct ArmedTimer {
    entry: SchedulerEntry,
    generation: u64,
    handle: JoinHandle<()>,
}

/// Owns the per-employee auto-checkout timers and the background sweeps.
///
/// The scheduler is shared as `Arc<AutoCheckoutScheduler>`; arming spawns a
/// tokio task that holds a clone of that `Arc` until it fires or is
/// cancelled. [`shutdown`](Self::shutdown) aborts every pending task without
/// firing it.
pub struct AutoCheckoutScheduler {
    store: Arc<dyn AttendanceStore>,
    timing: Arc<TimingService>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    timers: Mutex<HashMap<String, ArmedTimer>>,
    background: Mutex<Vec<JoinHandle<()>>>,
    next_generation: AtomicU64,
}

impl AutoCheckoutScheduler {
    /// Creates a scheduler with no timers armed and no sweeps running.
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        timing: Arc<TimingService>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            timing,
            clock,
            config,
            timers: Mutex::new(HashMap::new()),
            background: Mutex::new(Vec::new()),
            next_generation: AtomicU64::new(0),
        })
    }

    /// The scheduler's configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Computes when a record with the given department checkout should be
    /// closed, and on which path.
    ///
    /// The grace deadline never runs past the daily cutoff of the same day;
    /// a department that checks out late enough to hit it gets the cutoff
    /// path directly.
    pub fn deadline_for(&self, department_check_out: NaiveDateTime) -> (NaiveDateTime, TimerPath) {
        let cutoff = self.config.daily_cutoff.on(department_check_out.date());
        let grace_deadline = department_check_out + self.config.grace();

        if grace_deadline >= cutoff {
            (cutoff, TimerPath::DailyCutoff)
        } else {
            (grace_deadline, TimerPath::GracePeriod)
        }
    }

    /// Arms the grace-period timer for a fresh check-in.
    ///
    /// Replaces any timer already armed for the employee. Returns `None`
    /// without scheduling anything when the deadline has already elapsed;
    /// the sweeps pick such records up.
    pub fn arm(
        self: &Arc<Self>,
        employee_id: &str,
        attendance_record_id: Uuid,
        department_check_out: NaiveDateTime,
    ) -> Option<SchedulerEntry> {
        let (fire_at, path) = self.deadline_for(department_check_out);
        self.schedule(SchedulerEntry {
            employee_id: employee_id.to_string(),
            attendance_record_id,
            fire_at,
            path,
        })
    }

    /// Re-arms an employee's timer for the daily cutoff of `date`.
    pub fn arm_daily_cutoff(
        self: &Arc<Self>,
        employee_id: &str,
        attendance_record_id: Uuid,
        date: NaiveDate,
    ) -> Option<SchedulerEntry> {
        self.schedule(SchedulerEntry {
            employee_id: employee_id.to_string(),
            attendance_record_id,
            fire_at: self.config.daily_cutoff.on(date),
            path: TimerPath::DailyCutoff,
        })
    }

    fn schedule(self: &Arc<Self>, entry: SchedulerEntry) -> Option<SchedulerEntry> {
        let mut timers = lock(&self.timers);

        if let Some(previous) = timers.remove(&entry.employee_id) {
            previous.handle.abort();
            debug!(
                employee_id = %entry.employee_id,
                previous_fire_at = %previous.entry.fire_at,
                "Replaced auto-checkout timer"
            );
        }

        let now = self.clock.now();
        let Ok(delay) = (entry.fire_at - now).to_std() else {
            warn!(
                employee_id = %entry.employee_id,
                record_id = %entry.attendance_record_id,
                fire_at = %entry.fire_at,
                "Auto-checkout deadline already elapsed, leaving record to the sweep"
            );
            return None;
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let scheduler = Arc::clone(self);
        let task_entry = entry.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.on_timer(task_entry, generation).await;
        });

        debug!(
            employee_id = %entry.employee_id,
            record_id = %entry.attendance_record_id,
            fire_at = %entry.fire_at,
            path = ?entry.path,
            "Armed auto-checkout timer"
        );
        timers.insert(
            entry.employee_id.clone(),
            ArmedTimer {
                entry: entry.clone(),
                generation,
                handle,
            },
        );

        Some(entry)
    }

    /// Cancels the employee's pending timer. Returns false if none was armed.
    pub fn cancel(&self, employee_id: &str) -> bool {
        match lock(&self.timers).remove(employee_id) {
            Some(timer) => {
                timer.handle.abort();
                debug!(employee_id = %employee_id, "Cancelled auto-checkout timer");
                true
            }
            None => false,
        }
    }

    /// The employee's pending timer, if any.
    pub fn entry_for(&self, employee_id: &str) -> Option<SchedulerEntry> {
        lock(&self.timers)
            .get(employee_id)
            .map(|timer| timer.entry.clone())
    }

    /// Every pending timer, soonest first.
    pub fn pending(&self) -> Vec<SchedulerEntry> {
        let mut entries: Vec<SchedulerEntry> = lock(&self.timers)
            .values()
            .map(|timer| timer.entry.clone())
            .collect();
        entries.sort_by(|a, b| a.fire_at.cmp(&b.fire_at));
        entries
    }

    /// Closes a record automatically.
    ///
    /// Re-reads the record first and does nothing if it is already Closed,
    /// so a manual checkout racing the timer wins without a second write.
    /// On success any timer still armed for the record is dropped.
    pub async fn fire(
        &self,
        employee_id: &str,
        attendance_record_id: Uuid,
        reason: ClosureReason,
    ) -> EngineResult<FireOutcome> {
        let outcome = self
            .close_record(employee_id, attendance_record_id, reason)
            .await?;

        if outcome != FireOutcome::Suspended {
            let mut timers = lock(&self.timers);
            let matches_record = timers
                .get(employee_id)
                .is_some_and(|timer| timer.entry.attendance_record_id == attendance_record_id);
            if matches_record {
                if let Some(timer) = timers.remove(employee_id) {
                    timer.handle.abort();
                }
            }
        }

        Ok(outcome)
    }

    async fn on_timer(&self, entry: SchedulerEntry, generation: u64) {
        let reason = entry.path.closure_reason();
        match self
            .close_record(&entry.employee_id, entry.attendance_record_id, reason)
            .await
        {
            Ok(outcome) => debug!(
                employee_id = %entry.employee_id,
                record_id = %entry.attendance_record_id,
                outcome = ?outcome,
                "Auto-checkout timer fired"
            ),
            Err(e) => warn!(
                employee_id = %entry.employee_id,
                record_id = %entry.attendance_record_id,
                error = %e,
                "Auto-checkout failed, record stays open for the next sweep"
            ),
        }

        let mut timers = lock(&self.timers);
        if timers
            .get(&entry.employee_id)
            .is_some_and(|timer| timer.generation == generation)
        {
            timers.remove(&entry.employee_id);
        }
    }

    async fn close_record(
        &self,
        employee_id: &str,
        attendance_record_id: Uuid,
        reason: ClosureReason,
    ) -> EngineResult<FireOutcome> {
        let Some(record) = self
            .store
            .get_attendance_record_by_id(attendance_record_id)
            .await?
        else {
            warn!(
                employee_id = %employee_id,
                record_id = %attendance_record_id,
                "Auto-checkout target record not found"
            );
            return Ok(FireOutcome::Missing);
        };

        if record.employee_id != employee_id {
            warn!(
                employee_id = %employee_id,
                record_id = %attendance_record_id,
                owner = %record.employee_id,
                "Auto-checkout target belongs to another employee"
            );
            return Ok(FireOutcome::Missing);
        }
        if !record.is_open() {
            return Ok(FireOutcome::AlreadyClosed);
        }
        if reason == ClosureReason::AutoTwoHour && record.overtime.is_pending() {
            return Ok(FireOutcome::Suspended);
        }

        let now = self.clock.now();
        let lookup = self.timing.get_department_timing(&record.department).await?;
        let expected_check_out = lookup.timing.expected_check_out(record.date);
        let check_out = now.min(expected_check_out);

        let metrics = calculate_time_metrics(&lookup.timing, record.check_in_time, Some(check_out));
        let hours = closure_hours(&metrics, reason, record.overtime.enabled);
        let closure = Closure {
            check_out_time: check_out,
            check_out_location: None,
            check_out_reason: Some(closure_note(reason).to_string()),
            regular_working_hours: hours.regular_hours,
            overtime_hours: hours.overtime_hours,
            reason,
            early_minutes: metrics.early_minutes,
            duration_clamped: metrics.duration_clamped,
        };

        let updated = match self
            .store
            .update_attendance_record(record.id, AttendancePatch::close(closure))
            .await
        {
            Ok(updated) => updated,
            Err(StoreError::Conflict { .. }) => {
                debug!(
                    employee_id = %employee_id,
                    record_id = %record.id,
                    "Record closed concurrently, skipping auto-checkout"
                );
                return Ok(FireOutcome::AlreadyClosed);
            }
            Err(e) => return Err(e.into()),
        };

        if metrics.duration_clamped {
            warn!(
                employee_id = %employee_id,
                record_id = %record.id,
                check_in = %record.check_in_time,
                check_out = %check_out,
                "Checkout preceded check-in, duration clamped to zero"
            );
        }

        append_activity(
            self.store.as_ref(),
            ActivityLogEntry::new(
                employee_id,
                Some(record.id),
                ActivityAction::AutoCheckOut,
                json!({
                    "reason": reason,
                    "check_out_time": check_out,
                    "regular_working_hours": hours.regular_hours,
                    "overtime_hours": hours.overtime_hours,
                    "timing_source": lookup.source,
                }),
                now,
            ),
        )
        .await;

        info!(
            employee_id = %employee_id,
            record_id = %record.id,
            reason = %reason,
            regular_hours = %hours.regular_hours,
            "Auto-checkout closed attendance record"
        );

        Ok(FireOutcome::Closed(Box::new(updated)))
    }

    /// Closes every Open record up to today that is due.
    ///
    /// A record is due once its auto-checkout deadline has elapsed, unless
    /// overtime is pending, in which case it waits for the daily cutoff.
    /// Past the cutoff every Open record of the day is due, so records left
    /// over from earlier days always close. A failure on one record is
    /// logged and counted; the pass carries on and the record is retried by
    /// the next pass.
    pub async fn run_sweep(&self, kind: SweepKind) -> EngineResult<SweepReport> {
        let now = self.clock.now();
        let today = now.date();
        let mut report = SweepReport::default();

        for record in self.store.list_open_attendance_records_through(today).await? {
            report.examined += 1;

            let cutoff = self.config.daily_cutoff.on(record.date);
            let cutoff_reached =
                now >= cutoff || (kind == SweepKind::DailyCutoff && record.date == today);

            let Some(reason) = sweep_reason(&record, now, cutoff, cutoff_reached) else {
                report.skipped += 1;
                continue;
            };

            match self.fire(&record.employee_id, record.id, reason).await {
                Ok(FireOutcome::Closed(_)) => report.closed += 1,
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        employee_id = %record.employee_id,
                        record_id = %record.id,
                        error = %e,
                        "Sweep failed to close attendance record"
                    );
                }
            }
        }

        info!(
            kind = ?kind,
            examined = report.examined,
            closed = report.closed,
            skipped = report.skipped,
            failed = report.failed,
            "Auto-checkout sweep finished"
        );

        Ok(report)
    }

    /// Rebuilds the timer table from Open records after a restart.
    ///
    /// Only records with an enabled, unelapsed deadline get a timer. Records
    /// whose deadline passed while the process was down are left to the
    /// sweep. Returns the number of timers armed.
    pub async fn resume_on_start(self: &Arc<Self>) -> EngineResult<usize> {
        let now = self.clock.now();
        let today = now.date();
        let mut armed = 0;

        for record in self.store.list_open_attendance_records_through(today).await? {
            let Some(fire_at) = record.auto_check_out_deadline() else {
                continue;
            };
            if fire_at <= now {
                continue;
            }

            let path = if record.overtime.is_pending()
                || fire_at >= self.config.daily_cutoff.on(record.date)
            {
                TimerPath::DailyCutoff
            } else {
                TimerPath::GracePeriod
            };

            let entry = SchedulerEntry {
                employee_id: record.employee_id.clone(),
                attendance_record_id: record.id,
                fire_at,
                path,
            };
            if self.schedule(entry).is_some() {
                armed += 1;
            }
        }

        info!(armed, "Resumed auto-checkout timers");
        Ok(armed)
    }

    /// Resumes timers and starts the periodic and daily sweeps.
    ///
    /// The periodic sweep runs once immediately, which closes anything whose
    /// deadline passed while the process was down.
    pub async fn start(self: &Arc<Self>) -> EngineResult<usize> {
        let armed = self.resume_on_start().await?;

        let scheduler = Arc::clone(self);
        let periodic = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.config.sweep_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = scheduler.run_sweep(SweepKind::Periodic).await {
                    warn!(error = %e, "Periodic auto-checkout sweep failed");
                }
            }
        });

        let scheduler = Arc::clone(self);
        let daily = tokio::spawn(async move {
            let mut last_cutoff: Option<NaiveDateTime> = None;
            loop {
                let now = scheduler.clock.now();
                let mut next = scheduler.config.daily_cutoff.on(now.date());
                if next <= now || last_cutoff == Some(next) {
                    let Some(tomorrow) = now.date().succ_opt() else {
                        break;
                    };
                    next = scheduler.config.daily_cutoff.on(tomorrow);
                }

                let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
                tokio::time::sleep(delay).await;
                last_cutoff = Some(next);

                if let Err(e) = scheduler.run_sweep(SweepKind::DailyCutoff).await {
                    warn!(error = %e, "Daily auto-checkout sweep failed");
                }
            }
        });

        lock(&self.background).extend([periodic, daily]);
        info!(
            armed,
            sweep_interval_minutes = self.config.sweep_interval_minutes,
            daily_cutoff = %self.config.daily_cutoff,
            "Auto-checkout scheduler started"
        );

        Ok(armed)
    }

    /// Stops the sweeps and drops every pending timer without firing it.
    ///
    /// Records stay Open; the next start reconciles them.
    pub fn shutdown(&self) {
        for handle in lock(&self.background).drain(..) {
            handle.abort();
        }

        let mut timers = lock(&self.timers);
        let cancelled = timers.len();
        for (_, timer) in timers.drain() {
            timer.handle.abort();
        }

        info!(cancelled, "Auto-checkout scheduler stopped");
    }
}

fn closure_note(reason: ClosureReason) -> &'static str {
    match reason {
        ClosureReason::Manual => "Checked out",
        ClosureReason::AutoTwoHour => "Automatic checkout after the grace period",
        ClosureReason::AutoDailyCleanup => "Automatic checkout at the end of day",
    }
}

/// Decides whether a sweep should close `record`, and with which reason.
pub(crate) fn sweep_reason(
    record: &AttendanceRecord,
    now: NaiveDateTime,
    cutoff: NaiveDateTime,
    cutoff_reached: bool,
) -> Option<ClosureReason> {
    let deadline = record.auto_check_out_deadline();

    if cutoff_reached {
        let grace_path = !record.overtime.is_pending() && deadline.is_some_and(|d| d < cutoff);
        return Some(if grace_path {
            ClosureReason::AutoTwoHour
        } else {
            ClosureReason::AutoDailyCleanup
        });
    }

    if record.overtime.is_pending() {
        return None;
    }

    match deadline {
        Some(d) if d <= now => Some(ClosureReason::AutoTwoHour),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::TimingConfig;
    use crate::models::{
        AttendanceType, AutoCheckOut, DepartmentTiming, NewAttendanceRecord, OvertimeState,
        WallClock,
    };
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        clock: Arc<ManualClock>,
        scheduler: Arc<AutoCheckoutScheduler>,
    }

    fn fixture(now: NaiveDateTime) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        store.put_department_timing(DepartmentTiming {
            department: "Engineering".to_string(),
            check_in_time: WallClock::from_hm(9, 0),
            check_out_time: WallClock::from_hm(18, 0),
            working_hours: 8.0,
            late_threshold_minutes: 15,
            is_flexible_timing: false,
            allow_early_check_out: true,
        });
        let clock = Arc::new(ManualClock::new(now));
        let timing = Arc::new(TimingService::new(store.clone(), TimingConfig::default()));
        let scheduler = AutoCheckoutScheduler::new(
            store.clone(),
            timing,
            clock.clone(),
            SchedulerConfig::default(),
        );
        Fixture {
            store,
            clock,
            scheduler,
        }
    }

    async fn open_record(
        store: &InMemoryStore,
        employee_id: &str,
        deadline: NaiveDateTime,
    ) -> AttendanceRecord {
        store
            .create_attendance_record(NewAttendanceRecord {
                employee_id: employee_id.to_string(),
                department: "Engineering".to_string(),
                date: day(),
                attendance_type: AttendanceType::Remote,
                check_in_time: at(9, 0),
                check_in_location: None,
                location_validation: None,
                is_late: false,
                late_minutes: 0,
                remote_reason: Some("site visit".to_string()),
                customer_site_id: None,
                photo_ref: None,
                auto_check_out: AutoCheckOut {
                    enabled: true,
                    at: Some(deadline),
                },
            })
            .await
            .unwrap()
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_deadline_is_grace_after_checkout() {
        let f = fixture(at(9, 0));
        assert_eq!(
            f.scheduler.deadline_for(at(18, 0)),
            (at(20, 0), TimerPath::GracePeriod)
        );
    }

    #[tokio::test]
    async fn test_deadline_capped_at_daily_cutoff() {
        let f = fixture(at(9, 0));
        assert_eq!(
            f.scheduler.deadline_for(at(22, 30)),
            (at(23, 55), TimerPath::DailyCutoff)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let f = fixture(at(9, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;

        f.scheduler.arm("emp_001", record.id, at(18, 0));
        f.scheduler.arm_daily_cutoff("emp_001", record.id, day());

        let pending = f.scheduler.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].fire_at, at(23, 55));
        assert_eq!(pending[0].path, TimerPath::DailyCutoff);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_is_not_scheduled() {
        let f = fixture(at(21, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;

        assert!(f.scheduler.arm("emp_001", record.id, at(18, 0)).is_none());
        assert!(f.scheduler.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let f = fixture(at(9, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;
        f.scheduler.arm("emp_001", record.id, at(18, 0));

        assert!(f.scheduler.cancel("emp_001"));
        assert!(!f.scheduler.cancel("emp_001"));

        f.clock.set(at(20, 1));
        tokio::time::sleep(Duration::from_secs(12 * 3600)).await;
        settle().await;

        assert!(f.store.record(record.id).unwrap().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_and_clamps_to_expected_checkout() {
        let f = fixture(at(9, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;
        f.scheduler.arm("emp_001", record.id, at(18, 0));

        f.clock.set(at(20, 0));
        tokio::time::sleep(Duration::from_secs(11 * 3600 + 1)).await;
        settle().await;

        let closed = f.store.record(record.id).unwrap();
        let closure = closed.closure.expect("record should be closed");
        assert_eq!(closure.check_out_time, at(18, 0));
        assert_eq!(closure.regular_working_hours, Decimal::new(9, 0));
        assert_eq!(closure.overtime_hours, Decimal::ZERO);
        assert_eq!(closure.reason, ClosureReason::AutoTwoHour);
        assert!(f.scheduler.pending().is_empty());
    }

    #[tokio::test]
    async fn test_fire_on_closed_record_is_noop() {
        let f = fixture(at(20, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;

        let first = f
            .scheduler
            .fire("emp_001", record.id, ClosureReason::AutoTwoHour)
            .await
            .unwrap();
        let second = f
            .scheduler
            .fire("emp_001", record.id, ClosureReason::AutoTwoHour)
            .await
            .unwrap();

        assert!(matches!(first, FireOutcome::Closed(_)));
        assert_eq!(second, FireOutcome::AlreadyClosed);
        let auto_entries = f
            .store
            .activity_log()
            .iter()
            .filter(|e| e.action == ActivityAction::AutoCheckOut)
            .count();
        assert_eq!(auto_entries, 1);
    }

    #[tokio::test]
    async fn test_fire_never_pays_overtime_even_when_enabled() {
        let f = fixture(at(23, 55));
        let record = open_record(&f.store, "emp_001", at(23, 55)).await;
        f.store
            .update_attendance_record(
                record.id,
                AttendancePatch {
                    overtime: Some(OvertimeState::requested(at(18, 5))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = f
            .scheduler
            .fire("emp_001", record.id, ClosureReason::AutoDailyCleanup)
            .await
            .unwrap();

        let FireOutcome::Closed(closed) = outcome else {
            panic!("expected a closure, got {:?}", outcome);
        };
        let closure = closed.closure.unwrap();
        assert_eq!(closure.overtime_hours, Decimal::ZERO);
        assert_eq!(closure.reason, ClosureReason::AutoDailyCleanup);
    }

    #[tokio::test]
    async fn test_grace_fire_is_suspended_by_pending_overtime() {
        let f = fixture(at(20, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;
        f.store
            .update_attendance_record(
                record.id,
                AttendancePatch {
                    overtime: Some(OvertimeState::requested(at(18, 5))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = f
            .scheduler
            .fire("emp_001", record.id, ClosureReason::AutoTwoHour)
            .await
            .unwrap();

        assert_eq!(outcome, FireOutcome::Suspended);
        assert!(f.store.record(record.id).unwrap().is_open());
    }

    #[tokio::test]
    async fn test_fire_for_wrong_employee_is_missing() {
        let f = fixture(at(20, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;

        let outcome = f
            .scheduler
            .fire("emp_002", record.id, ClosureReason::AutoTwoHour)
            .await
            .unwrap();

        assert_eq!(outcome, FireOutcome::Missing);
    }

    #[tokio::test]
    async fn test_sweep_isolates_failures() {
        let f = fixture(at(20, 30));
        let a = open_record(&f.store, "emp_a", at(20, 0)).await;
        let b = open_record(&f.store, "emp_b", at(20, 0)).await;
        f.store.fail_updates_for("emp_a");

        let report = f.scheduler.run_sweep(SweepKind::Periodic).await.unwrap();

        assert_eq!(report.examined, 2);
        assert_eq!(report.closed, 1);
        assert_eq!(report.failed, 1);
        assert!(f.store.record(a.id).unwrap().is_open());
        assert!(!f.store.record(b.id).unwrap().is_open());

        f.store.clear_update_failures();
        let retry = f.scheduler.run_sweep(SweepKind::Periodic).await.unwrap();
        assert_eq!(retry.closed, 1);
        assert!(!f.store.record(a.id).unwrap().is_open());
    }

    #[tokio::test]
    async fn test_sweep_skips_records_not_yet_due() {
        let f = fixture(at(19, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;

        let report = f.scheduler.run_sweep(SweepKind::Periodic).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert!(f.store.record(record.id).unwrap().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_arms_only_unelapsed_deadlines() {
        let f = fixture(at(19, 0));
        open_record(&f.store, "emp_due", at(18, 30)).await;
        let waiting = open_record(&f.store, "emp_waiting", at(20, 0)).await;

        let armed = f.scheduler.resume_on_start().await.unwrap();

        assert_eq!(armed, 1);
        let entry = f.scheduler.entry_for("emp_waiting").unwrap();
        assert_eq!(entry.attendance_record_id, waiting.id);
        assert_eq!(entry.path, TimerPath::GracePeriod);
        assert!(f.scheduler.entry_for("emp_due").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_without_firing() {
        let f = fixture(at(9, 0));
        let record = open_record(&f.store, "emp_001", at(20, 0)).await;
        f.scheduler.arm("emp_001", record.id, at(18, 0));

        f.scheduler.shutdown();
        f.clock.set(at(20, 1));
        tokio::time::sleep(Duration::from_secs(12 * 3600)).await;
        settle().await;

        assert!(f.scheduler.pending().is_empty());
        assert!(f.store.record(record.id).unwrap().is_open());
    }

    #[test]
    fn test_sweep_reason_rules() {
        let mut record = NewAttendanceRecord {
            employee_id: "emp_001".to_string(),
            department: "Engineering".to_string(),
            date: day(),
            attendance_type: AttendanceType::Office,
            check_in_time: at(9, 0),
            check_in_location: None,
            location_validation: None,
            is_late: false,
            late_minutes: 0,
            remote_reason: None,
            customer_site_id: None,
            photo_ref: None,
            auto_check_out: AutoCheckOut {
                enabled: true,
                at: Some(at(20, 0)),
            },
        }
        .into_record(Uuid::new_v4());
        let cutoff = at(23, 55);

        assert_eq!(sweep_reason(&record, at(19, 59), cutoff, false), None);
        assert_eq!(
            sweep_reason(&record, at(20, 0), cutoff, false),
            Some(ClosureReason::AutoTwoHour)
        );
        assert_eq!(
            sweep_reason(&record, at(23, 55), cutoff, true),
            Some(ClosureReason::AutoTwoHour)
        );

        record.overtime = OvertimeState::requested(at(18, 5));
        record.auto_check_out_time = Some(cutoff);
        assert_eq!(sweep_reason(&record, at(21, 0), cutoff, false), None);
        assert_eq!(
            sweep_reason(&record, at(23, 55), cutoff, true),
            Some(ClosureReason::AutoDailyCleanup)
        );
    }
}
