use serde::{Deserialize, Serialize};

use crate::metric::{Metric, Unavailable};
use crate::models::Channel;
use crate::series::SeriesWindow;
use crate::stats::ChannelStats;

/// Mean, extremes and spread of one environmental channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

/// Ambient conditions over the analysed range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentAnalysis {
    /// Degrees Celsius
    pub temperature: Metric<ChannelProfile>,
    /// Meters above sea level
    pub altitude: Metric<ChannelProfile>,
}

pub struct EnvironmentAnalyzer;

impl EnvironmentAnalyzer {
    pub fn analyze(window: &SeriesWindow<'_>) -> EnvironmentAnalysis {
        EnvironmentAnalysis {
            temperature: Self::profile(window, Channel::Temperature).into(),
            altitude: Self::profile(window, Channel::Altitude).into(),
        }
    }

    pub fn profile(window: &SeriesWindow<'_>, channel: Channel) -> Result<ChannelProfile, Unavailable> {
        window.require(channel)?;
        let stats = ChannelStats::from_values(window.values(channel))
            .ok_or(Unavailable::MissingChannel(channel))?;
        Ok(ChannelProfile {
            mean: stats.mean,
            min: stats.min,
            max: stats.max,
            range: stats.range(),
        })
    }
}
