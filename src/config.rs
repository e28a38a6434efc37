//! Engine configuration
//!
//! Tunables for the exposure timer and the environmental provider. Every
//! field has a default, so a partial (or empty) JSON document is a valid
//! configuration.

use crate::error::UvError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minutes to burn at UV index 1 for the reference skin sensitivity
pub const DEFAULT_BURN_REFERENCE_MINUTES: f64 = 100.0;

/// Sunscreen reapplication interval (2 hours)
pub const DEFAULT_REAPPLY_INTERVAL_SECONDS: i64 = 7200;

/// Environmental snapshot time-to-live (1 hour)
pub const DEFAULT_CACHE_TTL_SECONDS: i64 = 3600;

/// Number of locations kept in the snapshot cache
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Largest UTC offset accepted (±18 hours)
const MAX_UTC_OFFSET_SECONDS: i32 = 18 * 3600;

/// Exposure timer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub burn_reference_minutes: f64,
    pub reapply_interval_seconds: i64,
    /// Offset of the user's local time from UTC, used for the midnight reset
    pub utc_offset_seconds: i32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            burn_reference_minutes: DEFAULT_BURN_REFERENCE_MINUTES,
            reapply_interval_seconds: DEFAULT_REAPPLY_INTERVAL_SECONDS,
            utc_offset_seconds: 0,
        }
    }
}

/// Environmental provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub cache_ttl_seconds: i64,
    pub cache_capacity: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UvConfig {
    pub timer: TimerConfig,
    pub provider: ProviderConfig,
}

impl UvConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, UvError> {
        let config: UvConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self, UvError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| UvError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, UvError> {
        serde_json::to_string_pretty(self).map_err(|e| UvError::EncodingError(e.to_string()))
    }

    /// Check every field is within a usable range
    pub fn validate(&self) -> Result<(), UvError> {
        let timer = &self.timer;
        if !timer.burn_reference_minutes.is_finite() || timer.burn_reference_minutes <= 0.0 {
            return Err(UvError::ConfigError(format!(
                "timer.burn_reference_minutes must be positive, got {}",
                timer.burn_reference_minutes
            )));
        }
        if timer.reapply_interval_seconds <= 0 {
            return Err(UvError::ConfigError(format!(
                "timer.reapply_interval_seconds must be positive, got {}",
                timer.reapply_interval_seconds
            )));
        }
        if timer.utc_offset_seconds.abs() > MAX_UTC_OFFSET_SECONDS {
            return Err(UvError::ConfigError(format!(
                "timer.utc_offset_seconds out of range: {}",
                timer.utc_offset_seconds
            )));
        }
        if self.provider.cache_ttl_seconds < 0 {
            return Err(UvError::ConfigError(format!(
                "provider.cache_ttl_seconds must not be negative, got {}",
                self.provider.cache_ttl_seconds
            )));
        }
        if self.provider.cache_capacity == 0 {
            return Err(UvError::ConfigError(
                "provider.cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
