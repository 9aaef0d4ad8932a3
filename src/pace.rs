use serde::{Deserialize, Serialize};

use crate::metric::{Metric, Unavailable};
use crate::models::Channel;
use crate::series::SeriesWindow;
use crate::stats::{self, ChannelStats};

/// Speed statistics and derived pace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceAnalysis {
    /// m/s
    pub mean_speed: Metric<f64>,
    pub max_speed: Metric<f64>,
    /// Coefficient of variation of speed
    pub speed_variability: Metric<f64>,
    /// Mean of per-sample pace in seconds per kilometer
    pub mean_pace: Metric<f64>,
    /// Fastest per-sample pace in seconds per kilometer
    pub best_pace: Metric<f64>,
}

impl PaceAnalysis {
    fn unavailable(reason: Unavailable) -> Self {
        Self {
            mean_speed: Metric::unavailable(reason),
            max_speed: Metric::unavailable(reason),
            speed_variability: Metric::unavailable(reason),
            mean_pace: Metric::unavailable(reason),
            best_pace: Metric::unavailable(reason),
        }
    }
}

/// Seconds per kilometer at a speed in m/s; `None` when stationary
pub fn pace_seconds_per_km(speed: f64) -> Option<f64> {
    if speed > 0.0 {
        Some(1000.0 / speed)
    } else {
        None
    }
}

pub struct SpeedAnalyzer;

impl SpeedAnalyzer {
    pub fn analyze(window: &SeriesWindow<'_>) -> PaceAnalysis {
        if let Err(reason) = window.require(Channel::Speed) {
            return PaceAnalysis::unavailable(reason);
        }
        let Some(stats) = ChannelStats::from_values(window.values(Channel::Speed)) else {
            return PaceAnalysis::unavailable(Unavailable::MissingChannel(Channel::Speed));
        };

        // Zero speed readings have no pace and are left out
        let paces = window.values(Channel::Speed).filter_map(pace_seconds_per_km);
        let mean_pace = stats::mean(paces.clone());
        let best_pace = paces.reduce(f64::min);

        PaceAnalysis {
            mean_speed: Metric::available(stats.mean),
            max_speed: Metric::available(stats.max),
            speed_variability: stats.coefficient_of_variation().into(),
            mean_pace: Metric::from_option(mean_pace, Unavailable::InsufficientData),
            best_pace: Metric::from_option(best_pace, Unavailable::InsufficientData),
        }
    }
}
