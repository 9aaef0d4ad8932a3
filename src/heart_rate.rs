//! Heart rate statistics and cardiac drift

use serde::{Deserialize, Serialize};

use crate::metric::{ratio, Metric, Unavailable};
use crate::models::Channel;
use crate::series::{MidpointSample, SeriesWindow};
use crate::stats::{self, ChannelStats};

/// First-half versus second-half comparison of an HR/output ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfSplit {
    /// Output channel the heart rate was compared against
    pub output: Channel,
    pub first_half: f64,
    pub second_half: f64,
    /// Relative change between the halves in percent
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateAnalysis {
    pub mean: Metric<f64>,
    pub max: Metric<f64>,
    pub min: Metric<f64>,
    pub range: Metric<f64>,
    pub std_dev: Metric<f64>,
    /// Coefficient of variation (std dev / mean)
    pub variability: Metric<f64>,
    /// Change of mean HR per unit of output between the halves
    pub drift: Metric<HalfSplit>,
}

impl HeartRateAnalysis {
    fn unavailable(reason: Unavailable) -> Self {
        Self {
            mean: Metric::unavailable(reason),
            max: Metric::unavailable(reason),
            min: Metric::unavailable(reason),
            range: Metric::unavailable(reason),
            std_dev: Metric::unavailable(reason),
            variability: Metric::unavailable(reason),
            drift: Metric::unavailable(reason),
        }
    }
}

pub struct HeartRateAnalyzer;

impl HeartRateAnalyzer {
    pub fn analyze(window: &SeriesWindow<'_>, midpoint: MidpointSample) -> HeartRateAnalysis {
        if let Err(reason) = window.require(Channel::HeartRate) {
            return HeartRateAnalysis::unavailable(reason);
        }
        let Some(stats) = ChannelStats::from_values(window.values(Channel::HeartRate)) else {
            return HeartRateAnalysis::unavailable(Unavailable::MissingChannel(Channel::HeartRate));
        };

        HeartRateAnalysis {
            mean: Metric::available(stats.mean),
            max: Metric::available(stats.max),
            min: Metric::available(stats.min),
            range: Metric::available(stats.range()),
            std_dev: Metric::from_option(stats.std_dev, Unavailable::InsufficientData),
            variability: stats.coefficient_of_variation().into(),
            drift: Self::drift(window, midpoint).into(),
        }
    }

    /// Drift = (r2 - r1) / r1 × 100 where r = mean HR / mean output per half.
    ///
    /// Speed is the preferred output; power is used when speed is absent.
    pub fn drift(window: &SeriesWindow<'_>, midpoint: MidpointSample) -> Result<HalfSplit, Unavailable> {
        window.require(Channel::HeartRate)?;
        let output = output_channel(window, [Channel::Speed, Channel::Power])?;

        let [first, second] = half_means(window, output, midpoint)?;
        let first_half = ratio(first.heart_rate, first.output)?;
        let second_half = ratio(second.heart_rate, second.output)?;
        let percent = ratio(second_half - first_half, first_half)? * 100.0;

        Ok(HalfSplit {
            output,
            first_half,
            second_half,
            percent,
        })
    }
}

/// Mean heart rate and mean output of one half
#[derive(Debug, Clone, Copy)]
pub(crate) struct HalfMeans {
    pub heart_rate: f64,
    pub output: f64,
}

/// First preferred channel that has readings in the window
pub(crate) fn output_channel(
    window: &SeriesWindow<'_>,
    preference: [Channel; 2],
) -> Result<Channel, Unavailable> {
    preference
        .into_iter()
        .find(|&channel| window.has_channel(channel))
        .ok_or(Unavailable::MissingChannel(preference[0]))
}

/// Per-half means; each half needs at least one reading of both channels
pub(crate) fn half_means(
    window: &SeriesWindow<'_>,
    output: Channel,
    midpoint: MidpointSample,
) -> Result<[HalfMeans; 2], Unavailable> {
    let (first, second) = window.split_at_midpoint(midpoint);
    Ok([half_mean(&first, output)?, half_mean(&second, output)?])
}

fn half_mean(half: &SeriesWindow<'_>, output: Channel) -> Result<HalfMeans, Unavailable> {
    Ok(HalfMeans {
        heart_rate: stats::mean(half.values(Channel::HeartRate)).ok_or(Unavailable::InsufficientData)?,
        output: stats::mean(half.values(output)).ok_or(Unavailable::InsufficientData)?,
    })
}
