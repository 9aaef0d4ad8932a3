// Library interface for fitsight
// Derives training metrics from decoded activity samples

pub mod basic;
pub mod config;
pub mod efficiency;
pub mod engine;
pub mod environment;
pub mod error;
pub mod heart_rate;
pub mod insights;
pub mod logging;
pub mod metric;
pub mod models;
pub mod pace;
pub mod power;
pub mod report;
pub mod series;
pub mod stats;
pub mod tss;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::{AnalysisConfig, EngineConfig};
pub use engine::MetricsEngine;
pub use error::{ConfigurationError, DataIntegrityError, MetricsError, Result};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use metric::{Metric, Unavailable};
pub use report::{ActivityReport, LapReport, WindowMetrics};
pub use series::{MidpointSample, SampleSeries, SeriesWindow, WindowAlignment};
pub use tss::TssCalculator;
pub use zones::{ZoneModel, ZoneOverride, ZoneOverrides, ZoneSet};
