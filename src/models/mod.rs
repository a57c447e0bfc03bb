//! Core data models for the Attendance Engine.
//!
//! This module contains the domain models shared by the engines, the
//! scheduler, the orchestrator and the store seam.

mod activity;
mod attendance;
mod department;
mod employee;
mod location;

pub use activity::{ActivityAction, ActivityLogEntry};
pub use attendance::{
    ApprovalStatus, AttendancePatch, AttendanceRecord, AttendanceType, AutoCheckOut, Closure,
    ClosureReason, LocationValidationMeta, NewAttendanceRecord, OvertimeState, RecordStatus,
    persisted_hours,
};
pub use department::{DepartmentTiming, WallClock};
pub use employee::Employee;
pub use location::{Coordinate, LocationSample, OfficeLocation, ValidationTier};
