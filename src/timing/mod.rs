//! Department timing lookup and time accounting.
//!
//! [`TimingService`] fronts the store's department timings with a short-lived
//! cache keyed by lower-cased department name. Entries expire after the
//! configured TTL (5 minutes by default) and are dropped explicitly when a
//! department's timing is written. Departments with no timing get the
//! configured default, flagged as such, so lookups never fail for an
//! unknown department.

use std::sync::Arc;

use chrono::NaiveDateTime;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculation::{TimeMetrics, calculate_time_metrics};
use crate::config::TimingConfig;
use crate::error::EngineResult;
use crate::models::DepartmentTiming;
use crate::store::AttendanceStore;

/// Where a timing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingSource {
    /// The department has its own timing.
    Configured,
    /// The department has no timing; the default was applied.
    Default,
}

/// A department timing plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingLookup {
    /// The timing to apply.
    pub timing: DepartmentTiming,
    /// Whether it was configured or defaulted.
    pub source: TimingSource,
}

impl TimingLookup {
    /// Returns true when the default timing was applied.
    pub fn used_default(&self) -> bool {
        self.source == TimingSource::Default
    }
}

/// Time metrics together with the timing they were computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentMetrics {
    /// The timing used.
    pub lookup: TimingLookup,
    /// The computed metrics.
    pub metrics: TimeMetrics,
}

/// Cached access to department timings.
pub struct TimingService {
    store: Arc<dyn AttendanceStore>,
    cache: Cache<String, DepartmentTiming>,
    config: TimingConfig,
}

impl TimingService {
    /// Creates a service backed by `store`.
    pub fn new(store: Arc<dyn AttendanceStore>, config: TimingConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_max_capacity)
            .time_to_live(config.cache_ttl())
            .build();

        Self {
            store,
            cache,
            config,
        }
    }

    fn cache_key(department: &str) -> String {
        department.trim().to_lowercase()
    }

    /// Returns the department's timing, from cache when possible.
    ///
    /// Falls back to the configured default when the store has no timing for
    /// the department. Defaults are not cached, so a newly configured timing
    /// is picked up on the next lookup. Store failures propagate.
    pub async fn get_department_timing(&self, department: &str) -> EngineResult<TimingLookup> {
        let key = Self::cache_key(department);

        if let Some(timing) = self.cache.get(&key).await {
            return Ok(TimingLookup {
                timing,
                source: TimingSource::Configured,
            });
        }

        match self.store.get_department_timing(department).await? {
            Some(timing) => {
                debug!(department = %department, "Cached department timing");
                self.cache.insert(key, timing.clone()).await;
                Ok(TimingLookup {
                    timing,
                    source: TimingSource::Configured,
                })
            }
            None => {
                warn!(
                    department = %department,
                    check_in = %self.config.default_check_in,
                    check_out = %self.config.default_check_out,
                    "No timing configured for department, using default"
                );
                Ok(TimingLookup {
                    timing: self.config.default_timing(department),
                    source: TimingSource::Default,
                })
            }
        }
    }

    /// Looks up the department's timing and computes metrics against it.
    pub async fn compute_metrics(
        &self,
        department: &str,
        check_in: NaiveDateTime,
        check_out: Option<NaiveDateTime>,
    ) -> EngineResult<DepartmentMetrics> {
        let lookup = self.get_department_timing(department).await?;
        let metrics = calculate_time_metrics(&lookup.timing, check_in, check_out);
        Ok(DepartmentMetrics { lookup, metrics })
    }

    /// Drops the cached timing for a department.
    pub async fn invalidate(&self, department: &str) {
        debug!(department = %department, "Invalidated department timing");
        self.cache.invalidate(&Self::cache_key(department)).await;
    }
}
