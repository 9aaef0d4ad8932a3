//! Session totals: duration, distance, climbing, energy and movement

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::metric::{ratio, Metric, Unavailable};
use crate::models::Channel;
use crate::series::SeriesWindow;
use crate::stats::ChannelStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicMetrics {
    /// Seconds
    pub duration: Metric<f64>,
    /// Meters
    pub distance: Metric<f64>,
    pub elevation_gain: Metric<f64>,
    pub elevation_loss: Metric<f64>,
    /// Meters climbed per kilometer travelled
    pub elevation_gain_per_km: Metric<f64>,
    /// Kilocalories reported by the device
    pub calories: Metric<f64>,
    pub calories_per_hour: Metric<f64>,
    /// Seconds spent at or above the moving speed threshold
    pub moving_time: Metric<f64>,
    /// Moving time as a percentage of duration
    pub activity_factor: Metric<f64>,
    pub mean_cadence: Metric<f64>,
    pub max_cadence: Metric<f64>,
}

/// Climbing and descending totals
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElevationChange {
    pub gain: f64,
    pub loss: f64,
}

pub struct BasicAnalyzer;

impl BasicAnalyzer {
    pub fn analyze(window: &SeriesWindow<'_>, config: &AnalysisConfig) -> BasicMetrics {
        let duration = window.require_samples().map(|_| window.duration());
        let distance = Self::distance(window);
        let elevation = Self::elevation(window, config.elevation_noise_threshold_m);
        let calories = Self::cumulative(window, Channel::Calories);
        let moving_time = Self::moving_time(window, config.moving_speed_threshold);
        let cadence = window
            .require(Channel::Cadence)
            .and_then(|_| {
                ChannelStats::from_values(window.values(Channel::Cadence))
                    .ok_or(Unavailable::MissingChannel(Channel::Cadence))
            });

        let elevation_gain_per_km = elevation
            .and_then(|e| distance.and_then(|d| ratio(e.gain, d / 1000.0)));
        let calories_per_hour = calories
            .and_then(|kcal| moving_time.and_then(|secs| ratio(kcal, secs / 3600.0)));
        let activity_factor = moving_time
            .and_then(|moving| duration.and_then(|total| ratio(moving, total)))
            .map(|share| share * 100.0);

        BasicMetrics {
            duration: duration.into(),
            distance: distance.into(),
            elevation_gain: elevation.map(|e| e.gain).into(),
            elevation_loss: elevation.map(|e| e.loss).into(),
            elevation_gain_per_km: elevation_gain_per_km.into(),
            calories: calories.into(),
            calories_per_hour: calories_per_hour.into(),
            moving_time: moving_time.into(),
            activity_factor: activity_factor.into(),
            mean_cadence: cadence.map(|c| c.mean).into(),
            max_cadence: cadence.map(|c| c.max).into(),
        }
    }

    /// Cumulative distance channel when recorded, otherwise speed integrated
    /// over time with the trapezoidal rule
    pub fn distance(window: &SeriesWindow<'_>) -> Result<f64, Unavailable> {
        window.require_samples()?;
        if let Ok(distance) = Self::cumulative(window, Channel::Distance) {
            return Ok(distance);
        }

        window.require(Channel::Speed)?;
        let mut readings = window.readings(Channel::Speed);
        let Some(mut previous) = readings.next() else {
            return Err(Unavailable::MissingChannel(Channel::Speed));
        };

        let mut meters = 0.0;
        let mut intervals = 0usize;
        for (offset, speed) in readings {
            meters += (speed + previous.1) / 2.0 * (offset - previous.0);
            previous = (offset, speed);
            intervals += 1;
        }

        if intervals == 0 {
            return Err(Unavailable::InsufficientData);
        }
        Ok(meters)
    }

    /// Last minus first reading of a cumulative channel
    pub fn cumulative(window: &SeriesWindow<'_>, channel: Channel) -> Result<f64, Unavailable> {
        window.require(channel)?;
        let mut values = window.values(channel);
        let first = values.next().ok_or(Unavailable::MissingChannel(channel))?;
        let last = values.last().ok_or(Unavailable::InsufficientData)?;
        Ok(last - first)
    }

    /// Total climb and descent with a hysteresis noise filter: a change only
    /// counts once altitude departs from the last accepted value by at least
    /// `threshold` meters.
    pub fn elevation(window: &SeriesWindow<'_>, threshold: f64) -> Result<ElevationChange, Unavailable> {
        window.require(Channel::Altitude)?;
        let mut altitudes = window.values(Channel::Altitude);
        let Some(mut reference) = altitudes.next() else {
            return Err(Unavailable::MissingChannel(Channel::Altitude));
        };

        let mut change = ElevationChange::default();
        for altitude in altitudes {
            let delta = altitude - reference;
            if delta >= threshold && delta > 0.0 {
                change.gain += delta;
                reference = altitude;
            } else if -delta >= threshold && delta < 0.0 {
                change.loss -= delta;
                reference = altitude;
            }
        }
        Ok(change)
    }

    /// Elapsed time of samples whose speed is at or above `threshold`
    pub fn moving_time(window: &SeriesWindow<'_>, threshold: f64) -> Result<f64, Unavailable> {
        window.require(Channel::Speed)?;
        Ok(window
            .timed_values(Channel::Speed)
            .filter(|(speed, _)| *speed >= threshold)
            .map(|(_, elapsed)| elapsed)
            .sum())
    }
}
