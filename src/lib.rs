//! Attendance validation and time-accounting engine.
//!
//! This crate decides, per check-in and check-out, whether a reported GPS
//! position counts as being at the office, how elapsed time splits into
//! regular and overtime hours for the employee's department, and when to
//! check out employees who forget to do it themselves.

#![warn(missing_docs)]

pub mod calculation;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod store;
pub mod timing;
