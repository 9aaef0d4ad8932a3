//! Unified error hierarchy for fitsight
//!
//! Only malformed input and invalid configuration are errors. Missing data is
//! never an error; it becomes an [`Unavailable`](crate::metric::Unavailable)
//! marker inside the report.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Channel;

/// Top-level error type for all fitsight operations
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Input violates series or lap invariants; the whole pass is aborted
    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    /// Invalid zone or analysis configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Malformed sample series or lap list
#[derive(Debug, Error, PartialEq)]
pub enum DataIntegrityError {
    /// Sample timestamps went backwards
    #[error("Non-monotonic timestamp at sample {index}: {current} precedes {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    /// A reading is NaN or infinite
    #[error("Non-finite {channel} reading at sample {index}")]
    NonFiniteReading { index: usize, channel: Channel },

    /// Lap ends before it starts
    #[error("Lap {index} has negative duration: {start} to {end}")]
    InvalidLap {
        index: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Laps are not in ascending index order
    #[error("Lap {current} is out of order after lap {previous}")]
    LapOrder { previous: u32, current: u32 },

    /// Two laps share part of the timeline
    #[error("Lap {current} overlaps lap {previous}")]
    OverlappingLaps { previous: u32, current: u32 },
}

/// Invalid zone overrides or analysis parameters
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// Zone override with no boundaries
    #[error("Empty zone boundary list for {channel}")]
    EmptyBoundaries { channel: Channel },

    /// Zone boundaries not strictly ascending
    #[error("Unsorted zone boundaries for {channel} at position {position}")]
    UnsortedBoundaries { channel: Channel, position: usize },

    /// Zone boundary at or below zero
    #[error("Zone boundaries for {channel} must be positive")]
    NonPositiveBoundary { channel: Channel },

    /// Out-of-range analysis parameter
    #[error("Invalid parameter {name}={value}")]
    InvalidParameter { name: String, value: String },

    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Result type alias for fitsight operations
pub type Result<T> = std::result::Result<T, MetricsError>;

impl MetricsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MetricsError::DataIntegrity(DataIntegrityError::NonFiniteReading { .. }) => {
                ErrorSeverity::Error
            }
            MetricsError::DataIntegrity(_) => ErrorSeverity::Critical,
            MetricsError::Configuration(ConfigurationError::Parse(_)) => ErrorSeverity::Error,
            MetricsError::Configuration(_) => ErrorSeverity::Warning,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            MetricsError::DataIntegrity(DataIntegrityError::NonMonotonicTimestamp {
                index, ..
            }) => {
                format!(
                    "Activity samples are out of order (sample {}). The file may be corrupted.",
                    index
                )
            }
            MetricsError::DataIntegrity(
                DataIntegrityError::InvalidLap { index, .. }
                | DataIntegrityError::OverlappingLaps { current: index, .. }
                | DataIntegrityError::LapOrder { current: index, .. },
            ) => {
                format!("Lap {} has an invalid time range.", index)
            }
            MetricsError::Configuration(
                ConfigurationError::EmptyBoundaries { channel }
                | ConfigurationError::UnsortedBoundaries { channel, .. }
                | ConfigurationError::NonPositiveBoundary { channel },
            ) => {
                format!(
                    "Custom {} zones must be a non-empty list of ascending positive values.",
                    channel
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Input is unusable; nothing can be reported
    Critical,
    /// Error that prevents the operation
    Error,
    /// Recoverable by fixing configuration
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
