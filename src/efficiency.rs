use serde::{Deserialize, Serialize};

use crate::heart_rate::{half_means, output_channel, HalfSplit};
use crate::metric::{ratio, Metric, Unavailable};
use crate::models::Channel;
use crate::series::{MidpointSample, SeriesWindow};
use crate::stats::ChannelStats;

/// Mean output divided by mean heart rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputRatio {
    pub output: Channel,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyAnalysis {
    /// Output per heartbeat; higher is better
    pub hr_efficiency: Metric<OutputRatio>,
    /// Mean speed divided by mean power
    pub power_efficiency: Metric<f64>,
    /// Aerobic decoupling between the halves in percent
    pub decoupling: Metric<HalfSplit>,
}

pub struct EfficiencyAnalyzer;

impl EfficiencyAnalyzer {
    pub fn analyze(window: &SeriesWindow<'_>, midpoint: MidpointSample) -> EfficiencyAnalysis {
        EfficiencyAnalysis {
            hr_efficiency: Self::hr_efficiency(window).into(),
            power_efficiency: Self::power_efficiency(window).into(),
            decoupling: Self::decoupling(window, midpoint).into(),
        }
    }

    /// Mean speed (or power when speed is absent) per mean heart rate.
    /// Both channels need at least two readings.
    pub fn hr_efficiency(window: &SeriesWindow<'_>) -> Result<OutputRatio, Unavailable> {
        window.require(Channel::HeartRate)?;
        let output = output_channel(window, [Channel::Speed, Channel::Power])?;

        let heart_rate = mean_of_two_or_more(window, Channel::HeartRate)?;
        let output_mean = mean_of_two_or_more(window, output)?;

        Ok(OutputRatio {
            output,
            value: ratio(output_mean, heart_rate)?,
        })
    }

    pub fn power_efficiency(window: &SeriesWindow<'_>) -> Result<f64, Unavailable> {
        window.require(Channel::Speed)?;
        window.require(Channel::Power)?;
        let speed = mean_of_two_or_more(window, Channel::Speed)?;
        let power = mean_of_two_or_more(window, Channel::Power)?;
        ratio(speed, power)
    }

    /// Decoupling = (ef1 - ef2) / ef1 × 100 where ef = mean output / mean HR.
    ///
    /// Positive when output per heartbeat fell in the second half. Power is
    /// the preferred output; speed is used when power is absent.
    pub fn decoupling(window: &SeriesWindow<'_>, midpoint: MidpointSample) -> Result<HalfSplit, Unavailable> {
        window.require(Channel::HeartRate)?;
        let output = output_channel(window, [Channel::Power, Channel::Speed])?;

        let [first, second] = half_means(window, output, midpoint)?;
        let first_half = ratio(first.output, first.heart_rate)?;
        let second_half = ratio(second.output, second.heart_rate)?;
        let percent = ratio(first_half - second_half, first_half)? * 100.0;

        Ok(HalfSplit {
            output,
            first_half,
            second_half,
            percent,
        })
    }
}

fn mean_of_two_or_more(window: &SeriesWindow<'_>, channel: Channel) -> Result<f64, Unavailable> {
    match ChannelStats::from_values(window.values(channel)) {
        Some(stats) if stats.count >= 2 => Ok(stats.mean),
        Some(_) => Err(Unavailable::InsufficientData),
        None => Err(Unavailable::MissingChannel(channel)),
    }
}
