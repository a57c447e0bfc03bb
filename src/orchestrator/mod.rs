//! The check-in/check-out orchestrator.
//!
//! [`AttendanceService`] is the only component callers invoke directly. It
//! validates office positions, stamps lateness and hour splits from the
//! department timing, writes attendance records through the store, and
//! keeps the auto-checkout scheduler in step: armed on check-in, cancelled
//! on checkout, moved to the daily cutoff when overtime is enabled.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use attendance_engine::config::EngineConfig;
//! use attendance_engine::models::Coordinate;
//! use attendance_engine::orchestrator::{AttendanceService, CheckInRequest, CheckInResponse};
//! use attendance_engine::store::InMemoryStore;
//!
//! # async fn run() -> Result<(), attendance_engine::error::EngineError> {
//! let store = Arc::new(InMemoryStore::new());
//! let service = AttendanceService::with_system_clock(store, EngineConfig::default());
//! service.start().await?;
//!
//! let request = CheckInRequest::office("emp_001", Coordinate::new(9.9668, 78.1338), 12.0);
//! let response = CheckInResponse::from(service.check_in(request).await);
//! println!("{}", response.message);
//! # Ok(())
//! # }
//! ```

mod request;
mod response;
mod service;

pub use request::{CheckInRequest, CheckOutRequest};
pub use response::{
    CheckInOutcome, CheckInResponse, CheckOutOutcome, CheckOutResponse, OvertimeOutcome,
    OvertimeResponse,
};
pub use service::AttendanceService;
