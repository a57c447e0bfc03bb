//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::EngineConfig;

/// Loads and provides access to the engine configuration.
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/attendance.yaml").unwrap();
/// println!("Daily cutoff: {}", loader.config().scheduler.daily_cutoff);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from a YAML file.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The file is missing or unreadable (`ConfigNotFound`)
    /// - The file is not valid YAML or has invalid values, such as an
    ///   unparseable wall-clock time (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse(&content, &path_str)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::from_yaml_str("scheduler:\n  grace_minutes: 90\n")?;
    /// assert_eq!(loader.config().scheduler.grace_minutes, 90);
    /// assert_eq!(loader.config().scheduler.sweep_interval_minutes, 15);
    /// # Ok::<(), attendance_engine::error::EngineError>(())
    /// ```
    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> EngineResult<Self> {
        // serde_yaml treats an empty document as null rather than an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: EngineConfig =
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { config })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader and returns the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WallClock;

    fn config_path() -> &'static str {
        "./config/attendance.yaml"
    }

    #[test]
    fn test_load_shipped_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let config = result.unwrap().into_config();
        assert_eq!(config.scheduler.grace_minutes, 120);
        assert_eq!(config.scheduler.daily_cutoff, WallClock::from_hm(23, 55));
        assert_eq!(config.scheduler.sweep_interval_minutes, 15);
        assert_eq!(config.timing.cache_ttl_seconds, 300);
        assert!(config.location.allow_low_accuracy_fallback);
    }

    #[test]
    fn test_missing_file_returns_config_not_found() {
        let result = ConfigLoader::load("./config/does-not-exist.yaml");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("does-not-exist.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let loader = ConfigLoader::from_yaml_str("").unwrap();
        assert_eq!(loader.config(), &EngineConfig::default());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let loader = ConfigLoader::from_yaml_str(
            "timing:\n  default_check_out: \"17:30\"\n  default_working_hours: 7.5\n",
        )
        .unwrap();
        let timing = &loader.config().timing;

        assert_eq!(timing.default_check_out, WallClock::from_hm(17, 30));
        assert_eq!(timing.default_working_hours, 7.5);
        assert_eq!(timing.default_check_in, WallClock::from_hm(9, 0));
        assert_eq!(timing.cache_ttl_seconds, 300);
    }

    #[test]
    fn test_invalid_wall_clock_is_parse_error() {
        let result = ConfigLoader::from_yaml_str("scheduler:\n  daily_cutoff: \"25:00\"\n");
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let result = ConfigLoader::from_yaml_str("scheduler: [unclosed");
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }

    #[test]
    fn test_default_timing_for_unknown_department() {
        let config = EngineConfig::default();
        let timing = config.timing.default_timing("Logistics");

        assert_eq!(timing.department, "Logistics");
        assert_eq!(timing.check_in_time, WallClock::from_hm(9, 0));
        assert_eq!(timing.check_out_time, WallClock::from_hm(18, 0));
        assert_eq!(timing.working_hours, 8.0);
    }
}
