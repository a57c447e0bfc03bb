//! Configuration types for the Attendance Engine.
//!
//! This module defines the structures deserialized from the engine's YAML
//! configuration. Every field has a default, so an empty document yields the
//! stock configuration.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DepartmentTiming, WallClock};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Auto-checkout scheduling.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Department timing cache and fallback.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Office check-in validation.
    #[serde(default)]
    pub location: LocationConfig,
}

/// Auto-checkout scheduling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minutes after the department checkout time before auto-checkout fires.
    #[serde(default = "default_grace_minutes")]
    pub grace_minutes: u32,
    /// Local time of the end-of-day cutoff.
    #[serde(default = "default_daily_cutoff")]
    pub daily_cutoff: WallClock,
    /// Minutes between safety-net sweeps.
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u32,
}

impl SchedulerConfig {
    /// The grace window as a chrono duration.
    pub fn grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.grace_minutes))
    }

    /// The sweep interval as a std duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.sweep_interval_minutes.max(1)) * 60)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            grace_minutes: default_grace_minutes(),
            daily_cutoff: default_daily_cutoff(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
        }
    }
}

fn default_grace_minutes() -> u32 {
    120
}

fn default_daily_cutoff() -> WallClock {
    WallClock::from_hm(23, 55)
}

fn default_sweep_interval_minutes() -> u32 {
    15
}

/// Department timing cache and fallback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Seconds a cached timing stays valid.
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached departments.
    #[serde(default = "default_cache_max_capacity")]
    pub cache_max_capacity: u64,
    /// Check-in time used when a department has no timing.
    #[serde(default = "default_check_in")]
    pub default_check_in: WallClock,
    /// Check-out time used when a department has no timing.
    #[serde(default = "default_check_out")]
    pub default_check_out: WallClock,
    /// Working hours used when a department has no timing.
    #[serde(default = "default_working_hours")]
    pub default_working_hours: f64,
    /// Late tolerance used when a department has no timing.
    #[serde(default = "default_late_threshold_minutes")]
    pub default_late_threshold_minutes: u32,
}

impl TimingConfig {
    /// The cache time-to-live.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Builds the fallback timing for a department with no configuration.
    pub fn default_timing(&self, department: &str) -> DepartmentTiming {
        DepartmentTiming {
            department: department.to_string(),
            check_in_time: self.default_check_in,
            check_out_time: self.default_check_out,
            working_hours: self.default_working_hours,
            late_threshold_minutes: self.default_late_threshold_minutes,
            is_flexible_timing: false,
            allow_early_check_out: true,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_cache_ttl_seconds(),
            cache_max_capacity: default_cache_max_capacity(),
            default_check_in: default_check_in(),
            default_check_out: default_check_out(),
            default_working_hours: default_working_hours(),
            default_late_threshold_minutes: default_late_threshold_minutes(),
        }
    }
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

fn default_cache_max_capacity() -> u64 {
    1024
}

fn default_check_in() -> WallClock {
    WallClock::from_hm(9, 0)
}

fn default_check_out() -> WallClock {
    WallClock::from_hm(18, 0)
}

fn default_working_hours() -> f64 {
    8.0
}

fn default_late_threshold_minutes() -> u32 {
    15
}

/// Office check-in validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Admit borderline low-accuracy fixes at reduced confidence.
    #[serde(default = "default_allow_low_accuracy_fallback")]
    pub allow_low_accuracy_fallback: bool,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            allow_low_accuracy_fallback: default_allow_low_accuracy_fallback(),
        }
    }
}

fn default_allow_low_accuracy_fallback() -> bool {
    true
}

impl EngineConfig {
    /// The daily cutoff instant for a calendar day.
    pub fn daily_cutoff_on(&self, date: NaiveDate) -> chrono::NaiveDateTime {
        self.scheduler.daily_cutoff.on(date)
    }
}
