//! Error types for the Attendance Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while validating and recording
//! attendance. Every variant maps onto one [`ErrorCategory`], which tells the
//! caller who has to act on it: the employee, an operator, or nobody (retry).

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::calculation::ValidationResult;
use crate::store::StoreError;

/// Who is expected to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The end user can fix this (move closer, fill in a field, wait).
    UserActionable,
    /// An administrator has to fix configuration.
    Configuration,
    /// A collaborator failed; the operation may succeed if retried.
    Transient,
    /// The request itself was malformed.
    InvalidInput,
}

/// The main error type for the Attendance Engine.
///
/// # Example
///
/// ```
/// use attendance_engine::error::{EngineError, ErrorCategory};
///
/// let error = EngineError::MissingField {
///     field: "reason".to_string(),
/// };
/// assert_eq!(error.to_string(), "Missing required field: reason");
/// assert_eq!(error.category(), ErrorCategory::UserActionable);
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No office locations exist, so office check-ins cannot be validated.
    #[error("No office locations are configured")]
    NoOfficesConfigured,

    /// The employee has no record in the employee directory.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The unknown employee id.
        employee_id: String,
    },

    /// The reported position is not close enough to any office.
    #[error("Location could not be verified: {distance_meters:.0}m from the nearest office")]
    LocationRejected {
        /// Distance to the nearest office in meters.
        distance_meters: f64,
        /// The full validation verdict, including recommendations.
        validation: Box<ValidationResult>,
    },

    /// A field required for the chosen attendance type was missing or blank.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// The employee already has an attendance record for the day.
    #[error("Employee '{employee_id}' already checked in on {date}")]
    DuplicateCheckIn {
        /// The employee id.
        employee_id: String,
        /// The calendar day of the existing record.
        date: NaiveDate,
    },

    /// The employee has no attendance record for the day.
    #[error("No active check-in found for employee '{employee_id}' on {date}")]
    NoOpenCheckIn {
        /// The employee id.
        employee_id: String,
        /// The calendar day that was searched.
        date: NaiveDate,
    },

    /// The employee's record for the day is already closed.
    #[error("Employee '{employee_id}' already checked out on {date}")]
    AlreadyCheckedOut {
        /// The employee id.
        employee_id: String,
        /// The calendar day of the closed record.
        date: NaiveDate,
    },

    /// Overtime was requested before the department's checkout time.
    #[error("Overtime can only be enabled after {available_at}")]
    OvertimeTooEarly {
        /// The earliest instant at which overtime may be enabled.
        available_at: NaiveDateTime,
    },

    /// Overtime was already requested for the open record.
    #[error("Overtime already requested for employee '{employee_id}'")]
    OvertimeAlreadyRequested {
        /// The employee id.
        employee_id: String,
    },

    /// Coordinates were NaN, infinite, or outside WGS84 ranges.
    #[error("Invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// The reported latitude.
        latitude: f64,
        /// The reported longitude.
        longitude: f64,
    },

    /// Accuracy radius was negative or not a number.
    #[error("Invalid accuracy radius: {accuracy_meters}")]
    InvalidAccuracy {
        /// The reported accuracy.
        accuracy_meters: f64,
    },

    /// A wall-clock string could not be parsed.
    #[error("Invalid wall-clock time '{value}': expected HH:MM")]
    InvalidWallClock {
        /// The rejected input.
        value: String,
    },

    /// The persistence collaborator failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns the taxonomy bucket for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::LocationRejected { .. }
            | EngineError::MissingField { .. }
            | EngineError::DuplicateCheckIn { .. }
            | EngineError::NoOpenCheckIn { .. }
            | EngineError::AlreadyCheckedOut { .. }
            | EngineError::OvertimeTooEarly { .. }
            | EngineError::OvertimeAlreadyRequested { .. } => ErrorCategory::UserActionable,
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::NoOfficesConfigured
            | EngineError::EmployeeNotFound { .. } => ErrorCategory::Configuration,
            EngineError::InvalidCoordinate { .. }
            | EngineError::InvalidAccuracy { .. }
            | EngineError::InvalidWallClock { .. } => ErrorCategory::InvalidInput,
            EngineError::Store(_) => ErrorCategory::Transient,
        }
    }

    /// Returns the message that should be shown to the person who has to act.
    ///
    /// Transient failures are reported generically so storage internals never
    /// reach the end user.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::NoOfficesConfigured => {
                "No office locations are configured. Please contact your administrator."
                    .to_string()
            }
            EngineError::Store(_) => {
                "Attendance could not be saved right now. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
