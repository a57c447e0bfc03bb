//! Configuration loading and management for the Attendance Engine.
//!
//! This module loads the engine configuration from YAML: auto-checkout
//! scheduling, the department timing cache and its fallback timing, and
//! office check-in validation switches.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/attendance.yaml").unwrap().into_config();
//! println!("Sweep every {} minutes", config.scheduler.sweep_interval_minutes);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, LocationConfig, SchedulerConfig, TimingConfig};
