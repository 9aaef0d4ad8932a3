use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::MetricsEngine;
use crate::error::ConfigurationError;
use crate::logging::LogConfig;
use crate::models::AthleteProfile;
use crate::series::{MidpointSample, WindowAlignment};
use crate::zones::{ZoneModel, ZoneOverrides};

/// Complete engine configuration as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Athlete thresholds
    pub profile: AthleteProfile,

    /// Explicit zone boundaries that replace the profile-derived ones
    pub zones: ZoneOverrides,

    /// Tunable analysis constants
    pub analysis: AnalysisConfig,

    /// Logging setup for hosts embedding the engine
    pub logging: LogConfig,
}

/// Constants used by the metric formulas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rolling window for normalized power (seconds)
    pub rolling_window_seconds: f64,

    /// Trailing or centered rolling window
    pub window_alignment: WindowAlignment,

    /// Altitude change ignored as sensor jitter (meters)
    pub elevation_noise_threshold_m: f64,

    /// Half that receives a sample sitting exactly on the midpoint
    pub midpoint_sample: MidpointSample,

    /// Minimum speed counted as moving (m/s)
    pub moving_speed_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rolling_window_seconds: 30.0,
            window_alignment: WindowAlignment::Trailing,
            elevation_noise_threshold_m: 1.0,
            midpoint_sample: MidpointSample::SecondHalf,
            moving_speed_threshold: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if !(self.rolling_window_seconds > 0.0 && self.rolling_window_seconds.is_finite()) {
            return Err(invalid("rolling_window_seconds", self.rolling_window_seconds));
        }
        if !(self.elevation_noise_threshold_m >= 0.0 && self.elevation_noise_threshold_m.is_finite()) {
            return Err(invalid(
                "elevation_noise_threshold_m",
                self.elevation_noise_threshold_m,
            ));
        }
        if !(self.moving_speed_threshold >= 0.0 && self.moving_speed_threshold.is_finite()) {
            return Err(invalid("moving_speed_threshold", self.moving_speed_threshold));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: f64) -> ConfigurationError {
    ConfigurationError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "Failed to serialize configuration to TOML")
    }

    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_toml_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = self.to_toml_string()?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitsight")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::info!(
                    path = %config_path.display(),
                    error = %err,
                    "Using default configuration"
                );
                Self::default()
            }
        }
    }

    /// Check analysis constants and zone overrides
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        self.analysis.validate()?;
        ZoneModel::with_overrides(&self.profile, &self.zones)?;
        Ok(())
    }

    /// Build a ready-to-use engine from this configuration
    pub fn build_engine(&self) -> crate::Result<MetricsEngine> {
        self.analysis.validate()?;
        let zones = ZoneModel::with_overrides(&self.profile, &self.zones)?;
        Ok(MetricsEngine::new(
            self.profile.clone(),
            zones,
            self.analysis.clone(),
        ))
    }
}
