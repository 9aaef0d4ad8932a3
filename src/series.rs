//! Immutable time series of activity samples.
//!
//! [`SampleSeries`] validates the decoded samples once and then hands out
//! borrowed [`SeriesWindow`]s: the whole session or a single lap. Every
//! analyzer works on a window, so lap-scoped metrics use exactly the same code
//! path as session metrics.
//!
//! Channel projections and rolling means are lazy iterators over the
//! underlying samples; calling the producing method again restarts them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataIntegrityError;
use crate::metric::Unavailable;
use crate::models::{Channel, Lap, Sample};

/// Position of the rolling window relative to the sample it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAlignment {
    /// Window `(t - w, t]`
    #[default]
    Trailing,
    /// Window `(t - w/2, t + w/2]`
    Centered,
}

impl WindowAlignment {
    fn bounds(&self, t: f64, width: f64) -> (f64, f64) {
        match self {
            WindowAlignment::Trailing => (t - width, t),
            WindowAlignment::Centered => (t - width / 2.0, t + width / 2.0),
        }
    }
}

/// Which half receives a sample sitting exactly on the temporal midpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidpointSample {
    FirstHalf,
    #[default]
    SecondHalf,
}

/// Validated, ordered activity samples
#[derive(Debug, Clone, Default)]
pub struct SampleSeries {
    samples: Vec<Sample>,
    /// Seconds since the first sample, one per sample
    offsets: Vec<f64>,
}

impl SampleSeries {
    /// Build a series, rejecting out-of-order timestamps and non-finite readings
    pub fn new(samples: Vec<Sample>) -> Result<Self, DataIntegrityError> {
        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(DataIntegrityError::NonMonotonicTimestamp {
                    index: index + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }

        for (index, sample) in samples.iter().enumerate() {
            for channel in Channel::ALL {
                if let Some(value) = sample.value(channel) {
                    if !value.is_finite() {
                        return Err(DataIntegrityError::NonFiniteReading { index, channel });
                    }
                }
            }
        }

        let offsets = match samples.first() {
            Some(first) => {
                let origin = first.timestamp;
                samples
                    .iter()
                    .map(|s| seconds_between(origin, s.timestamp))
                    .collect()
            }
            None => Vec::new(),
        };

        Ok(Self { samples, offsets })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Last minus first timestamp; zero for an empty series
    pub fn duration_seconds(&self) -> f64 {
        self.window().duration()
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.window().has_channel(channel)
    }

    /// `(seconds since start, value)` pairs for a channel, skipping absent readings
    pub fn channel(&self, channel: Channel) -> Readings<'_> {
        self.window().readings(channel)
    }

    /// Rolling mean of a channel over the full session
    pub fn rolling_mean(
        &self,
        channel: Channel,
        window_seconds: f64,
        alignment: WindowAlignment,
    ) -> RollingMean<'_> {
        self.window().rolling_mean(channel, window_seconds, alignment)
    }

    /// The whole session, bounded by the first and last sample
    pub fn window(&self) -> SeriesWindow<'_> {
        let end = self.offsets.last().copied().unwrap_or(0.0);
        SeriesWindow {
            samples: &self.samples,
            offsets: &self.offsets,
            start: 0.0,
            end,
        }
    }

    /// Samples with `lap.start <= t <= lap.end`, bounded by the lap itself
    pub fn lap_window(&self, lap: &Lap) -> SeriesWindow<'_> {
        let Some(origin) = self.start_time() else {
            return SeriesWindow {
                samples: &[],
                offsets: &[],
                start: 0.0,
                end: 0.0,
            };
        };

        let start = seconds_between(origin, lap.start);
        let end = seconds_between(origin, lap.end);
        let lo = self.offsets.partition_point(|&o| o < start);
        let hi = self.offsets.partition_point(|&o| o <= end).max(lo);

        SeriesWindow {
            samples: &self.samples[lo..hi],
            offsets: &self.offsets[lo..hi],
            start,
            end,
        }
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Borrowed, contiguous range of a [`SampleSeries`] with explicit time bounds
#[derive(Debug, Clone, Copy)]
pub struct SeriesWindow<'a> {
    samples: &'a [Sample],
    offsets: &'a [f64],
    start: f64,
    end: f64,
}

impl<'a> SeriesWindow<'a> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &'a [Sample] {
        self.samples
    }

    pub fn offsets(&self) -> &'a [f64] {
        self.offsets
    }

    /// Window start in seconds since the session start
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Window end in seconds since the session start
    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.samples.iter().any(|s| s.value(channel).is_some())
    }

    /// Fewer than two samples cannot carry any metric
    pub fn require_samples(&self) -> Result<(), Unavailable> {
        if self.samples.len() < 2 {
            Err(Unavailable::InsufficientData)
        } else {
            Ok(())
        }
    }

    /// Enough samples and at least one reading of the channel
    pub fn require(&self, channel: Channel) -> Result<(), Unavailable> {
        self.require_samples()?;
        if self.has_channel(channel) {
            Ok(())
        } else {
            Err(Unavailable::MissingChannel(channel))
        }
    }

    pub fn readings(&self, channel: Channel) -> Readings<'a> {
        Readings {
            samples: self.samples,
            offsets: self.offsets,
            channel,
            position: 0,
        }
    }

    /// Channel values without their timestamps
    pub fn values(&self, channel: Channel) -> impl Iterator<Item = f64> + Clone + 'a {
        self.readings(channel).map(|(_, value)| value)
    }

    /// Time credited to sample `index`: the gap to the next sample, or to the
    /// window end for the last one
    pub fn elapsed(&self, index: usize) -> f64 {
        let here = self.offsets[index];
        let next = self.offsets.get(index + 1).copied().unwrap_or(self.end);
        (next - here).max(0.0)
    }

    /// `(value, elapsed seconds)` for every sample carrying a reading
    pub fn timed_values(&self, channel: Channel) -> impl Iterator<Item = (f64, f64)> + 'a {
        let window = *self;
        (0..window.len()).filter_map(move |index| {
            window.samples[index]
                .value(channel)
                .map(|value| (value, window.elapsed(index)))
        })
    }

    pub fn rolling_mean(
        &self,
        channel: Channel,
        window_seconds: f64,
        alignment: WindowAlignment,
    ) -> RollingMean<'a> {
        RollingMean {
            window: *self,
            channel,
            width: window_seconds,
            alignment,
            index: 0,
            head: 0,
            tail: 0,
            sum: 0.0,
            count: 0,
        }
    }

    /// Split at the temporal midpoint into two equal-duration halves
    pub fn split_at_midpoint(&self, midpoint: MidpointSample) -> (SeriesWindow<'a>, SeriesWindow<'a>) {
        let mid = self.start + self.duration() / 2.0;
        let at = match midpoint {
            MidpointSample::SecondHalf => self.offsets.partition_point(|&o| o < mid),
            MidpointSample::FirstHalf => self.offsets.partition_point(|&o| o <= mid),
        };

        let first = SeriesWindow {
            samples: &self.samples[..at],
            offsets: &self.offsets[..at],
            start: self.start,
            end: mid,
        };
        let second = SeriesWindow {
            samples: &self.samples[at..],
            offsets: &self.offsets[at..],
            start: mid,
            end: self.end,
        };
        (first, second)
    }
}

/// Lazy projection of one channel as `(seconds since start, value)` pairs
#[derive(Debug, Clone)]
pub struct Readings<'a> {
    samples: &'a [Sample],
    offsets: &'a [f64],
    channel: Channel,
    position: usize,
}

impl<'a> Iterator for Readings<'a> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.samples.len() {
            let index = self.position;
            self.position += 1;
            if let Some(value) = self.samples[index].value(self.channel) {
                return Some((self.offsets[index], value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.samples.len() - self.position))
    }
}

/// Lazy rolling mean, one item per sample index.
///
/// Yields `(index, Some(mean))` only where the whole window lies inside both
/// the analysed range and the span of its samples, and holds at least one
/// reading; edge samples whose window would reach past either bound yield
/// `(index, None)`. Runs in a single O(n)
/// pass using a running sum.
#[derive(Debug, Clone)]
pub struct RollingMean<'a> {
    window: SeriesWindow<'a>,
    channel: Channel,
    width: f64,
    alignment: WindowAlignment,
    index: usize,
    /// Next sample to enter the window
    head: usize,
    /// Oldest sample still inside the window
    tail: usize,
    sum: f64,
    count: usize,
}

impl<'a> Iterator for RollingMean<'a> {
    type Item = (usize, Option<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        let offsets = self.window.offsets;
        let samples = self.window.samples;
        if self.index >= samples.len() {
            return None;
        }

        let (lo, hi) = self.alignment.bounds(offsets[self.index], self.width);

        while self.head < samples.len() && offsets[self.head] <= hi {
            if let Some(value) = samples[self.head].value(self.channel) {
                self.sum += value;
                self.count += 1;
            }
            self.head += 1;
        }

        while self.tail < self.head && offsets[self.tail] <= lo {
            if let Some(value) = samples[self.tail].value(self.channel) {
                self.sum -= value;
                self.count -= 1;
            }
            self.tail += 1;
        }

        if self.count == 0 {
            self.sum = 0.0;
        }

        // Coverage is bounded by the data as well as the range: a lap that
        // starts before the first sample has no readings there to average
        let first = offsets[0].max(self.window.start);
        let last = offsets[samples.len() - 1].min(self.window.end);
        let covered = lo >= first && hi <= last;
        let mean = if covered && self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        };

        let index = self.index;
        self.index += 1;
        Some((index, mean))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.window.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RollingMean<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn series_from(values: &[Option<f64>], channel: Channel) -> SampleSeries {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let sample = Sample::new(t0() + Duration::seconds(i as i64));
                match v {
                    Some(v) => sample.with(channel, *v),
                    None => sample,
                }
            })
            .collect();
        SampleSeries::new(samples).unwrap()
    }

    #[test]
    fn test_empty_series() {
        let series = SampleSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.duration_seconds(), 0.0);
        assert!(!series.has_channel(Channel::HeartRate));
        assert_eq!(series.channel(Channel::HeartRate).count(), 0);
    }

    #[test]
    fn test_rejects_out_of_order_timestamps() {
        let samples = vec![
            Sample::new(t0()),
            Sample::new(t0() + Duration::seconds(2)),
            Sample::new(t0() + Duration::seconds(1)),
        ];
        let err = SampleSeries::new(samples).unwrap_err();
        assert!(matches!(
            err,
            DataIntegrityError::NonMonotonicTimestamp { index: 2, .. }
        ));
    }

    #[test]
    fn test_equal_timestamps_are_allowed() {
        let samples = vec![Sample::new(t0()), Sample::new(t0())];
        assert!(SampleSeries::new(samples).is_ok());
    }

    #[test]
    fn test_rejects_non_finite_reading() {
        let samples = vec![
            Sample::new(t0()).with(Channel::Power, 100.0),
            Sample::new(t0() + Duration::seconds(1)).with(Channel::Power, f64::NAN),
        ];
        let err = SampleSeries::new(samples).unwrap_err();
        assert_eq!(
            err,
            DataIntegrityError::NonFiniteReading {
                index: 1,
                channel: Channel::Power
            }
        );
    }

    #[test]
    fn test_channel_projection_skips_gaps_and_restarts() {
        let series = series_from(&[Some(120.0), None, Some(0.0), Some(130.0)], Channel::HeartRate);
        let readings = series.channel(Channel::HeartRate);

        let first: Vec<_> = readings.clone().collect();
        let second: Vec<_> = readings.collect();
        assert_eq!(first, vec![(0.0, 120.0), (2.0, 0.0), (3.0, 130.0)]);
        assert_eq!(first, second);
        assert_eq!(series.duration_seconds(), 3.0);
    }

    #[test]
    fn test_trailing_rolling_mean_excludes_partial_windows() {
        let values: Vec<Option<f64>> = (0..10).map(|i| Some(i as f64)).collect();
        let series = series_from(&values, Channel::Power);

        let means: Vec<_> = series
            .rolling_mean(Channel::Power, 3.0, WindowAlignment::Trailing)
            .collect();

        assert_eq!(means.len(), 10);
        assert_eq!(means[0], (0, None));
        assert_eq!(means[2], (2, None));
        // Window (0, 3] holds samples 1, 2, 3
        assert_eq!(means[3], (3, Some(2.0)));
        assert_eq!(means[9], (9, Some(8.0)));
    }

    #[test]
    fn test_lap_wider_than_data_does_not_pad_windows() {
        // Lap runs 0..=200 s but the first record arrives at 20 s
        let samples: Vec<Sample> = (20..=200)
            .map(|i| {
                let watts = if i % 40 < 20 { 300.0 } else { 120.0 };
                Sample::new(t0() + Duration::seconds(i)).with(Channel::Power, watts)
            })
            .collect();
        let series = SampleSeries::new(samples).unwrap();
        let lap = Lap::new(1, t0(), t0() + Duration::seconds(200));
        let lap_window = series.lap_window(&lap);
        assert_eq!(lap_window.len(), series.len());
        assert_eq!(lap_window.start(), -20.0);

        for alignment in [WindowAlignment::Trailing, WindowAlignment::Centered] {
            let session: Vec<_> = series.rolling_mean(Channel::Power, 30.0, alignment).collect();
            let lap: Vec<_> = lap_window.rolling_mean(Channel::Power, 30.0, alignment).collect();
            assert_eq!(lap, session);
        }

        // Same on the far side when the lap ends after the last record
        let lap = Lap::new(1, t0() + Duration::seconds(20), t0() + Duration::seconds(260));
        let lap_window = series.lap_window(&lap);
        let session: Vec<_> = series
            .rolling_mean(Channel::Power, 30.0, WindowAlignment::Centered)
            .collect();
        let lap: Vec<_> = lap_window
            .rolling_mean(Channel::Power, 30.0, WindowAlignment::Centered)
            .collect();
        assert_eq!(lap, session);
        assert_eq!(session.iter().filter(|(_, m)| m.is_some()).count(), 151);
    }

    #[test]
    fn test_centered_rolling_mean_excludes_both_edges() {
        let values: Vec<Option<f64>> = (0..10).map(|i| Some(i as f64)).collect();
        let series = series_from(&values, Channel::Power);

        let defined: Vec<_> = series
            .rolling_mean(Channel::Power, 4.0, WindowAlignment::Centered)
            .filter_map(|(i, m)| m.map(|m| (i, m)))
            .collect();

        // Window (t-2, t+2] fits for t in 2..=7
        assert_eq!(defined.first(), Some(&(2, 2.5)));
        assert_eq!(defined.last(), Some(&(7, 7.5)));
        assert_eq!(defined.len(), 6);
    }

    #[test]
    fn test_rolling_mean_skips_absent_readings() {
        let series = series_from(
            &[Some(100.0), None, Some(200.0), None, Some(300.0)],
            Channel::Power,
        );
        let means: Vec<_> = series
            .rolling_mean(Channel::Power, 2.0, WindowAlignment::Trailing)
            .collect();
        // Window (1, 3] holds samples 2 and 3; only sample 2 has a reading
        assert_eq!(means[3], (3, Some(200.0)));
        assert_eq!(means[4], (4, Some(300.0)));
    }

    #[test]
    fn test_lap_window_is_inclusive() {
        let values: Vec<Option<f64>> = (0..10).map(|_| Some(150.0)).collect();
        let series = series_from(&values, Channel::HeartRate);
        let lap = Lap::new(1, t0() + Duration::seconds(3), t0() + Duration::seconds(6));

        let window = series.lap_window(&lap);
        assert_eq!(window.len(), 4);
        assert_eq!(window.start(), 3.0);
        assert_eq!(window.end(), 6.0);
        assert_eq!(window.elapsed(3), 0.0);
    }

    #[test]
    fn test_elapsed_reaches_window_end() {
        let values: Vec<Option<f64>> = vec![Some(1.0); 3];
        let series = series_from(&values, Channel::HeartRate);
        let lap = Lap::new(0, t0(), t0() + Duration::seconds(5));

        let window = series.lap_window(&lap);
        assert_eq!(window.elapsed(0), 1.0);
        assert_eq!(window.elapsed(2), 3.0);
        let total: f64 = window.timed_values(Channel::HeartRate).map(|(_, dt)| dt).sum();
        assert_eq!(total, 5.0);
    }

    #[test]
    fn test_split_at_midpoint() {
        let values: Vec<Option<f64>> = (0..5).map(|i| Some(i as f64)).collect();
        let series = series_from(&values, Channel::Speed);
        let window = series.window();

        let (first, second) = window.split_at_midpoint(MidpointSample::SecondHalf);
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 3);
        assert_eq!(first.end(), 2.0);
        assert_eq!(second.start(), 2.0);

        let (first, second) = window.split_at_midpoint(MidpointSample::FirstHalf);
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
    }
}
