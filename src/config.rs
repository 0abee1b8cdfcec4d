//! Configuration management.
//!
//! Provides the configuration structure for ingestion and assembly:
//! slot collision handling, file matching, interpolation reach and
//! cache behaviour.

use crate::constants::{CACHE_FILE_NAME, DATA_FILE_EXTENSION, FALLBACK_YEAR, INTERPOLATE_WINDOW};
use crate::error::{Result, SodarError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a day resolves two records that land in the same slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// The record parsed later overwrites the earlier one
    #[default]
    KeepLast,
    /// The first record parsed for a slot is kept
    KeepFirst,
}

impl CollisionPolicy {
    /// Whether an incoming record replaces the one already in its slot
    pub fn replaces_existing(self) -> bool {
        matches!(self, CollisionPolicy::KeepLast)
    }
}

/// Global configuration for SoDAR processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SodarConfig {
    /// Resolution of duplicate records within a day
    pub collision_policy: CollisionPolicy,

    /// Year assumed for a day whose log has no timestamp records
    pub fallback_year: i32,

    /// Extension of daily log files (case-insensitive)
    pub file_extension: String,

    /// Columns searched on each side of a gap during interpolation
    pub interpolate_window: usize,

    /// Consult and write the series cache
    pub use_cache: bool,

    /// Cache file name inside the station directory
    pub cache_file_name: String,

    /// Show a progress bar while ingesting daily logs
    pub show_progress: bool,
}

impl Default for SodarConfig {
    fn default() -> Self {
        Self {
            collision_policy: CollisionPolicy::default(),
            fallback_year: FALLBACK_YEAR,
            file_extension: DATA_FILE_EXTENSION.to_string(),
            interpolate_window: INTERPOLATE_WINDOW,
            use_cache: true,
            cache_file_name: CACHE_FILE_NAME.to_string(),
            show_progress: false,
        }
    }
}

impl SodarConfig {
    /// Set the slot collision policy
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Set the year used for days without timestamp records
    pub fn with_fallback_year(mut self, year: i32) -> Self {
        self.fallback_year = year;
        self
    }

    /// Set the interpolation window
    pub fn with_interpolate_window(mut self, window: usize) -> Self {
        self.interpolate_window = window;
        self
    }

    /// Disable the series cache
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Enable the ingestion progress bar
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    /// Reject settings the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.interpolate_window == 0 {
            return Err(SodarError::configuration(
                "interpolate_window must be at least 1",
            ));
        }
        if self.file_extension.is_empty() || self.file_extension.contains('.') {
            return Err(SodarError::configuration(format!(
                "file_extension '{}' must be a bare extension such as 'sdr'",
                self.file_extension
            )));
        }
        if !(2000..=2099).contains(&self.fallback_year) {
            return Err(SodarError::configuration(format!(
                "fallback_year {} cannot be encoded in a two digit timestamp",
                self.fallback_year
            )));
        }
        debug!("Configuration validated: {:?}", self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SodarConfig::default();
        assert_eq!(config.collision_policy, CollisionPolicy::KeepLast);
        assert_eq!(config.interpolate_window, 3);
        assert_eq!(config.file_extension, "sdr");
        assert!(config.use_cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = SodarConfig::default()
            .with_collision_policy(CollisionPolicy::KeepFirst)
            .with_interpolate_window(5)
            .with_fallback_year(2013)
            .without_cache();
        assert_eq!(config.collision_policy, CollisionPolicy::KeepFirst);
        assert_eq!(config.interpolate_window, 5);
        assert_eq!(config.fallback_year, 2013);
        assert!(!config.use_cache);
    }

    #[test]
    fn test_validation_failures() {
        let config = SodarConfig::default().with_interpolate_window(0);
        assert!(matches!(
            config.validate(),
            Err(SodarError::Configuration { .. })
        ));

        let config = SodarConfig {
            file_extension: ".sdr".to_string(),
            ..SodarConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SodarConfig::default().with_fallback_year(1999);
        assert!(config.validate().is_err());
    }
}
