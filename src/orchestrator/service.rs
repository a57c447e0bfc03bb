//! The attendance service.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::calculation::{
    ValidationResult, apply_low_accuracy_fallback, closure_hours, validate_location,
};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ActivityAction, ActivityLogEntry, AttendancePatch, AttendanceRecord, AttendanceType,
    AutoCheckOut, Closure, ClosureReason, LocationSample, LocationValidationMeta,
    NewAttendanceRecord, OvertimeState, ValidationTier,
};
use crate::scheduler::{AutoCheckoutScheduler, SweepKind, SweepReport};
use crate::store::{AttendanceStore, StoreError, append_activity};
use crate::timing::TimingService;

use super::request::{CheckInRequest, CheckOutRequest, non_blank};
use super::response::{CheckInOutcome, CheckOutOutcome, OvertimeOutcome};

/// Entry point for check-in, check-out and overtime requests.
///
/// Composes location validation, department timing and the auto-checkout
/// scheduler over a shared [`AttendanceStore`]. All validation happens
/// before the first write, so a rejected request leaves no partial state.
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    timing: Arc<TimingService>,
    scheduler: Arc<AutoCheckoutScheduler>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl AttendanceService {
    /// Creates a service that reads time from `clock`.
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let timing = Arc::new(TimingService::new(Arc::clone(&store), config.timing.clone()));
        let scheduler = AutoCheckoutScheduler::new(
            Arc::clone(&store),
            Arc::clone(&timing),
            Arc::clone(&clock),
            config.scheduler.clone(),
        );

        Self {
            store,
            timing,
            scheduler,
            clock,
            config,
        }
    }

    /// Creates a service on the host's local clock.
    pub fn with_system_clock(store: Arc<dyn AttendanceStore>, config: EngineConfig) -> Self {
        Self::new(store, Arc::new(SystemClock), config)
    }

    /// The auto-checkout scheduler.
    pub fn scheduler(&self) -> &Arc<AutoCheckoutScheduler> {
        &self.scheduler
    }

    /// The department timing service.
    pub fn timing(&self) -> &TimingService {
        &self.timing
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resumes pending auto-checkouts and starts the background sweeps.
    pub async fn start(&self) -> EngineResult<usize> {
        self.scheduler.start().await
    }

    /// Stops the sweeps and drops pending timers without firing them.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    /// Opens today's attendance record for an employee.
    ///
    /// Office check-ins must pass location validation; a failed verdict with
    /// a poor accuracy radius close to an office is admitted at reduced
    /// confidence when the low-accuracy fallback is enabled. Remote
    /// check-ins need a reason and field check-ins need both a site
    /// reference and a photo reference.
    pub async fn check_in(&self, request: CheckInRequest) -> EngineResult<CheckInOutcome> {
        if !request.coordinate.is_valid() {
            return Err(EngineError::InvalidCoordinate {
                latitude: request.coordinate.latitude,
                longitude: request.coordinate.longitude,
            });
        }
        if !request.accuracy_meters.is_finite() || request.accuracy_meters < 0.0 {
            return Err(EngineError::InvalidAccuracy {
                accuracy_meters: request.accuracy_meters,
            });
        }

        let reason = non_blank(request.reason.as_deref()).map(str::to_string);
        let site_ref = non_blank(request.site_ref.as_deref()).map(str::to_string);
        let photo_ref = non_blank(request.photo_ref.as_deref()).map(str::to_string);
        match request.attendance_type {
            AttendanceType::Office => {}
            AttendanceType::Remote => {
                if reason.is_none() {
                    return Err(missing("reason"));
                }
            }
            AttendanceType::Field => {
                if site_ref.is_none() {
                    return Err(missing("site_ref"));
                }
                if photo_ref.is_none() {
                    return Err(missing("photo_ref"));
                }
            }
        }

        let now = self.clock.now();
        let today = now.date();

        let employee = self
            .store
            .get_employee(&request.employee_id)
            .await?
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: request.employee_id.clone(),
            })?;

        if self
            .store
            .get_attendance_record(&employee.id, today)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicateCheckIn {
                employee_id: employee.id,
                date: today,
            });
        }

        let validation = if request.attendance_type == AttendanceType::Office {
            let sample = LocationSample {
                coordinate: request.coordinate,
                accuracy_meters: request.accuracy_meters,
                captured_at: now,
            };
            Some(self.validate_office_location(&employee.id, &sample).await?)
        } else {
            None
        };

        let computed = self
            .timing
            .compute_metrics(&employee.department, now, None)
            .await?;
        let metrics = &computed.metrics;
        if computed.lookup.used_default() {
            warn!(
                employee_id = %employee.id,
                department = %employee.department,
                "Check-in evaluated against default department timing"
            );
        }

        let (deadline, _) = self.scheduler.deadline_for(metrics.expected_check_out);
        let new_record = NewAttendanceRecord {
            employee_id: employee.id.clone(),
            department: employee.department.clone(),
            date: today,
            attendance_type: request.attendance_type,
            check_in_time: now,
            check_in_location: Some(request.coordinate),
            location_validation: validation.as_ref().map(validation_meta),
            is_late: metrics.is_late,
            late_minutes: metrics.late_minutes,
            remote_reason: reason,
            customer_site_id: site_ref,
            photo_ref,
            auto_check_out: AutoCheckOut {
                enabled: true,
                at: Some(deadline),
            },
        };

        let record = match self.store.create_attendance_record(new_record).await {
            Ok(record) => record,
            Err(StoreError::Conflict { .. }) => {
                return Err(EngineError::DuplicateCheckIn {
                    employee_id: employee.id,
                    date: today,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let scheduled = self
            .scheduler
            .arm(&record.employee_id, record.id, metrics.expected_check_out);

        append_activity(
            self.store.as_ref(),
            ActivityLogEntry::new(
                &record.employee_id,
                Some(record.id),
                ActivityAction::CheckIn,
                json!({
                    "attendance_type": record.attendance_type,
                    "is_late": record.is_late,
                    "late_minutes": record.late_minutes,
                    "exceeds_late_threshold": metrics.exceeds_late_threshold,
                    "timing_source": computed.lookup.source,
                    "auto_check_out_time": deadline,
                }),
                now,
            ),
        )
        .await;

        info!(
            employee_id = %record.employee_id,
            record_id = %record.id,
            attendance_type = %record.attendance_type,
            is_late = record.is_late,
            "Checked in"
        );

        let message = check_in_message(&record, validation.as_ref());
        Ok(CheckInOutcome {
            record,
            validation,
            timing_source: computed.lookup.source,
            scheduled,
            message,
        })
    }

    async fn validate_office_location(
        &self,
        employee_id: &str,
        sample: &LocationSample,
    ) -> EngineResult<ValidationResult> {
        let offices = self.store.get_office_locations().await?;
        let mut validation = validate_location(sample, &offices);

        if !validation.is_valid && self.config.location.allow_low_accuracy_fallback {
            if let Some(accepted) = apply_low_accuracy_fallback(&validation) {
                info!(
                    employee_id = %employee_id,
                    accuracy_meters = sample.accuracy_meters,
                    distance_meters = ?validation.distance_meters,
                    "Admitted low-accuracy check-in at reduced confidence"
                );
                validation = accepted;
                validation.office_name = offices
                    .iter()
                    .find(|o| Some(&o.id) == validation.office_id.as_ref())
                    .map(|o| o.name.clone());
            }
        }

        append_activity(
            self.store.as_ref(),
            ActivityLogEntry::new(
                employee_id,
                None,
                ActivityAction::LocationValidation,
                json!({
                    "latitude": sample.coordinate.latitude,
                    "longitude": sample.coordinate.longitude,
                    "accuracy_meters": sample.accuracy_meters,
                    "is_valid": validation.is_valid,
                    "confidence": validation.confidence,
                    "validation_type": validation.tier,
                    "distance_meters": validation.distance_meters,
                    "office_id": validation.office_id,
                    "fallback_applied": validation.fallback_applied,
                }),
                sample.captured_at,
            ),
        )
        .await;

        match validation.tier {
            ValidationTier::NoOfficesConfigured => {
                warn!(
                    employee_id = %employee_id,
                    "Office check-in attempted with no offices configured"
                );
                Err(EngineError::NoOfficesConfigured)
            }
            _ if !validation.is_valid => Err(EngineError::LocationRejected {
                distance_meters: validation.distance_meters.unwrap_or_default(),
                validation: Box::new(validation),
            }),
            _ => Ok(validation),
        }
    }

    /// Closes today's record with the actual checkout instant.
    ///
    /// Overtime is only recorded when the employee enabled it beforehand;
    /// otherwise the overtime figure is forced to zero.
    pub async fn check_out(&self, request: CheckOutRequest) -> EngineResult<CheckOutOutcome> {
        if let Some(coordinate) = request.coordinate.filter(|c| !c.is_valid()) {
            return Err(EngineError::InvalidCoordinate {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            });
        }

        let now = self.clock.now();
        let record = self.open_record_for_today(&request.employee_id, now.date()).await?;

        let computed = self
            .timing
            .compute_metrics(&record.department, record.check_in_time, Some(now))
            .await?;
        let metrics = computed.metrics;
        let hours = closure_hours(&metrics, ClosureReason::Manual, record.overtime.enabled);
        let early_check_out_flagged =
            metrics.is_early_check_out && !computed.lookup.timing.allow_early_check_out;

        let closure = Closure {
            check_out_time: now,
            check_out_location: request.coordinate,
            check_out_reason: non_blank(request.reason.as_deref()).map(str::to_string),
            regular_working_hours: hours.regular_hours,
            overtime_hours: hours.overtime_hours,
            reason: ClosureReason::Manual,
            early_minutes: metrics.early_minutes,
            duration_clamped: metrics.duration_clamped,
        };

        let closed = match self
            .store
            .update_attendance_record(record.id, AttendancePatch::close(closure))
            .await
        {
            Ok(closed) => closed,
            Err(StoreError::Conflict { .. }) => {
                return Err(EngineError::AlreadyCheckedOut {
                    employee_id: record.employee_id,
                    date: record.date,
                });
            }
            Err(e) => return Err(e.into()),
        };
        self.scheduler.cancel(&closed.employee_id);

        if metrics.duration_clamped {
            warn!(
                employee_id = %closed.employee_id,
                record_id = %closed.id,
                check_in = %closed.check_in_time,
                check_out = %now,
                "Checkout preceded check-in, duration clamped to zero"
            );
        }

        append_activity(
            self.store.as_ref(),
            ActivityLogEntry::new(
                &closed.employee_id,
                Some(closed.id),
                ActivityAction::CheckOut,
                json!({
                    "regular_working_hours": hours.regular_hours,
                    "overtime_hours": hours.overtime_hours,
                    "is_early_check_out": metrics.is_early_check_out,
                    "early_minutes": metrics.early_minutes,
                    "duration_clamped": metrics.duration_clamped,
                }),
                now,
            ),
        )
        .await;

        info!(
            employee_id = %closed.employee_id,
            record_id = %closed.id,
            regular_hours = %hours.regular_hours,
            overtime_hours = %hours.overtime_hours,
            "Checked out"
        );

        let message = if early_check_out_flagged {
            format!(
                "Checked out {} minutes before the expected check-out at {}. The early check-out has been recorded.",
                metrics.early_minutes,
                metrics.expected_check_out.format("%H:%M")
            )
        } else {
            format!(
                "Checked out. Regular hours: {}, overtime hours: {}",
                hours.regular_hours, hours.overtime_hours
            )
        };

        Ok(CheckOutOutcome {
            record: closed,
            metrics,
            regular_hours: hours.regular_hours,
            overtime_hours: hours.overtime_hours,
            early_check_out_flagged,
            message,
        })
    }

    /// Opts the employee in to overtime for today.
    ///
    /// Allowed once the department's checkout time has passed, and only
    /// once per record. The grace-period auto-checkout is replaced by one at
    /// the daily cutoff.
    pub async fn enable_overtime(&self, employee_id: &str) -> EngineResult<OvertimeOutcome> {
        let now = self.clock.now();
        let record = self.open_record_for_today(employee_id, now.date()).await?;

        if record.overtime.enabled {
            return Err(EngineError::OvertimeAlreadyRequested {
                employee_id: record.employee_id,
            });
        }

        let lookup = self.timing.get_department_timing(&record.department).await?;
        let boundary = lookup.timing.expected_check_out(record.date);
        if now < boundary {
            return Err(EngineError::OvertimeTooEarly {
                available_at: boundary,
            });
        }

        let cutoff = self.config.daily_cutoff_on(record.date);
        let patch = AttendancePatch {
            overtime: Some(OvertimeState::requested(now)),
            auto_check_out: Some(AutoCheckOut {
                enabled: true,
                at: Some(cutoff),
            }),
            ..Default::default()
        };

        let updated = match self.store.update_attendance_record(record.id, patch).await {
            Ok(updated) => updated,
            Err(StoreError::Conflict { .. }) => {
                return Err(EngineError::AlreadyCheckedOut {
                    employee_id: record.employee_id,
                    date: record.date,
                });
            }
            Err(e) => return Err(e.into()),
        };
        self.scheduler
            .arm_daily_cutoff(&updated.employee_id, updated.id, updated.date);

        append_activity(
            self.store.as_ref(),
            ActivityLogEntry::new(
                &updated.employee_id,
                Some(updated.id),
                ActivityAction::OvertimeEnabled,
                json!({
                    "requested_at": now,
                    "auto_check_out_time": cutoff,
                }),
                now,
            ),
        )
        .await;

        info!(
            employee_id = %updated.employee_id,
            record_id = %updated.id,
            auto_check_out_time = %cutoff,
            "Overtime enabled"
        );

        Ok(OvertimeOutcome {
            record: updated,
            auto_check_out_at: cutoff,
            message: format!(
                "Overtime enabled. Automatic check-out moved to {}",
                cutoff.format("%H:%M")
            ),
        })
    }

    /// Runs one auto-checkout sweep immediately.
    pub async fn run_sweep_now(&self) -> EngineResult<SweepReport> {
        self.scheduler.run_sweep(SweepKind::Manual).await
    }

    /// Drops the cached timing for a department after it was edited.
    pub async fn department_timing_updated(&self, department: &str) {
        self.timing.invalidate(department).await;
    }

    async fn open_record_for_today(
        &self,
        employee_id: &str,
        today: chrono::NaiveDate,
    ) -> EngineResult<AttendanceRecord> {
        let record = self
            .store
            .get_attendance_record(employee_id, today)
            .await?
            .ok_or_else(|| EngineError::NoOpenCheckIn {
                employee_id: employee_id.to_string(),
                date: today,
            })?;

        if !record.is_open() {
            return Err(EngineError::AlreadyCheckedOut {
                employee_id: employee_id.to_string(),
                date: today,
            });
        }
        Ok(record)
    }
}

fn missing(field: &str) -> EngineError {
    EngineError::MissingField {
        field: field.to_string(),
    }
}

fn validation_meta(validation: &ValidationResult) -> LocationValidationMeta {
    LocationValidationMeta {
        confidence: validation.confidence,
        validation_type: validation.tier,
        distance_meters: validation.distance_meters.unwrap_or_default(),
        detected_office_id: validation.office_id.clone(),
        accuracy_meters: validation.accuracy_meters,
        fallback_applied: validation.fallback_applied,
    }
}

fn check_in_message(record: &AttendanceRecord, validation: Option<&ValidationResult>) -> String {
    let place = match record.attendance_type {
        AttendanceType::Office => match validation.and_then(|v| v.office_name.as_deref()) {
            Some(name) => format!("Checked in at {}", name),
            None => "Checked in at the office".to_string(),
        },
        AttendanceType::Remote => "Checked in remotely".to_string(),
        AttendanceType::Field => match record.customer_site_id.as_deref() {
            Some(site) => format!("Checked in at customer site {}", site),
            None => "Checked in at a customer site".to_string(),
        },
    };

    if record.is_late {
        format!("{} ({} minutes late)", place, record.late_minutes)
    } else {
        place
    }
}
