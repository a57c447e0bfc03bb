//! Department timing model.
//!
//! This module defines [`WallClock`], a validated time of day, and
//! [`DepartmentTiming`], a department's configured working window.
//! Strings are parsed into `WallClock` once, when they cross the
//! serde boundary; the engines only ever see the typed value.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A time of day with minute precision.
///
/// # Examples
///
/// ```
/// use attendance_engine::models::WallClock;
///
/// let checkout: WallClock = "18:00".parse().unwrap();
/// assert_eq!(checkout.hour(), 18);
/// assert_eq!(checkout.to_string(), "18:00");
/// assert!("24:00".parse::<WallClock>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WallClock {
    hour: u8,
    minute: u8,
}

impl WallClock {
    pub(crate) const fn from_hm(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Creates a wall-clock time, rejecting out-of-range components.
    pub fn new(hour: u32, minute: u32) -> EngineResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(EngineError::InvalidWallClock {
                value: format!("{}:{}", hour, minute),
            });
        }
        Ok(Self::from_hm(hour as u8, minute as u8))
    }

    /// Hour of day, 0-23.
    pub fn hour(&self) -> u32 {
        u32::from(self.hour)
    }

    /// Minute of hour, 0-59.
    pub fn minute(&self) -> u32 {
        u32::from(self.minute)
    }

    /// Converts to a chrono time.
    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }

    /// Combines this time with a calendar date.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.to_naive_time())
    }
}

impl FromStr for WallClock {
    type Err = EngineError;

    /// Accepts `HH:MM` and `HH:MM:SS`; seconds are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidWallClock {
            value: s.to_string(),
        };

        let mut parts = s.trim().split(':');
        let hour = parts.next().ok_or_else(invalid)?;
        let minute = parts.next().ok_or_else(invalid)?;
        if let Some(seconds) = parts.next() {
            let seconds: u32 = seconds.parse().map_err(|_| invalid())?;
            if seconds > 59 {
                return Err(invalid());
            }
        }
        if parts.next().is_some() || hour.is_empty() || minute.len() != 2 {
            return Err(invalid());
        }

        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for WallClock {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WallClock> for String {
    fn from(value: WallClock) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A department's configured working window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentTiming {
    /// Department name. Lookups are case-insensitive.
    pub department: String,
    /// Expected check-in time.
    pub check_in_time: WallClock,
    /// Expected check-out time.
    pub check_out_time: WallClock,
    /// Standard working hours per day; anything above counts as overtime.
    pub working_hours: f64,
    /// Minutes of lateness tolerated before the late threshold is exceeded.
    #[serde(default)]
    pub late_threshold_minutes: u32,
    /// Flexible departments never report lateness.
    #[serde(default)]
    pub is_flexible_timing: bool,
    /// Whether leaving before the checkout time is expected.
    #[serde(default = "default_allow_early_check_out")]
    pub allow_early_check_out: bool,
}

fn default_allow_early_check_out() -> bool {
    true
}

impl DepartmentTiming {
    /// Expected check-in instant on the given day.
    pub fn expected_check_in(&self, date: NaiveDate) -> NaiveDateTime {
        self.check_in_time.on(date)
    }

    /// Expected check-out instant on the given day.
    pub fn expected_check_out(&self, date: NaiveDate) -> NaiveDateTime {
        self.check_out_time.on(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hh_mm() {
        let clock: WallClock = "09:30".parse().unwrap();
        assert_eq!(clock.hour(), 9);
        assert_eq!(clock.minute(), 30);
    }

    #[test]
    fn test_parse_drops_seconds() {
        let clock: WallClock = "18:00:45".parse().unwrap();
        assert_eq!(clock, WallClock::from_hm(18, 0));
    }

    #[test]
    fn test_parse_single_digit_hour() {
        let clock: WallClock = "9:05".parse().unwrap();
        assert_eq!(clock.to_string(), "09:05");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "18", "18:0", "24:00", "12:60", "ab:cd", "12:00:99", "1:2:3:4"] {
            assert!(
                input.parse::<WallClock>().is_err(),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_on_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let clock = WallClock::from_hm(23, 55);
        assert_eq!(clock.on(date), date.and_hms_opt(23, 55, 0).unwrap());
    }

    #[test]
    fn test_wall_clock_serde_as_string() {
        let json = serde_json::to_string(&WallClock::from_hm(9, 0)).unwrap();
        assert_eq!(json, "\"09:00\"");
        assert!(serde_json::from_str::<WallClock>("\"31:00\"").is_err());
    }

    #[test]
    fn test_department_timing_defaults_on_deserialize() {
        let json = r#"{
            "department": "Sales",
            "check_in_time": "09:00",
            "check_out_time": "18:00",
            "working_hours": 8.0
        }"#;

        let timing: DepartmentTiming = serde_json::from_str(json).unwrap();
        assert_eq!(timing.late_threshold_minutes, 0);
        assert!(!timing.is_flexible_timing);
        assert!(timing.allow_early_check_out);

        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(
            timing.expected_check_out(date),
            date.and_hms_opt(18, 0, 0).unwrap()
        );
    }
}
