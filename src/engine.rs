//! Orchestrates every analyzer over the session and its laps

use rayon::prelude::*;

use crate::basic::BasicAnalyzer;
use crate::config::AnalysisConfig;
use crate::efficiency::EfficiencyAnalyzer;
use crate::environment::EnvironmentAnalyzer;
use crate::error::{DataIntegrityError, MetricsError, Result};
use crate::heart_rate::HeartRateAnalyzer;
use crate::insights::InsightAnalyzer;
use crate::logging::log_error;
use crate::models::{AthleteProfile, Channel, Lap, Sample};
use crate::pace::SpeedAnalyzer;
use crate::power::PowerAnalyzer;
use crate::report::{ActivityReport, LapReport, WindowMetrics, ZoneAnalysis};
use crate::series::{SampleSeries, SeriesWindow};
use crate::zones::{ZoneAnalyzer, ZoneModel};

/// Pure metrics engine; holds no mutable state and can be shared across threads
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    profile: AthleteProfile,
    zones: ZoneModel,
    config: AnalysisConfig,
}

impl MetricsEngine {
    pub fn new(profile: AthleteProfile, zones: ZoneModel, config: AnalysisConfig) -> Self {
        Self {
            profile,
            zones,
            config,
        }
    }

    /// Engine with profile-derived zones and default analysis constants
    pub fn from_profile(profile: AthleteProfile) -> Result<Self> {
        let zones = ZoneModel::from_profile(&profile)?;
        Ok(Self::new(profile, zones, AnalysisConfig::default()))
    }

    pub fn profile(&self) -> &AthleteProfile {
        &self.profile
    }

    pub fn zones(&self) -> &ZoneModel {
        &self.zones
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Validate raw samples and analyze them in one step
    pub fn analyze_samples(&self, samples: Vec<Sample>, laps: &[Lap]) -> Result<ActivityReport> {
        let series = SampleSeries::new(samples).map_err(|err| {
            let err = MetricsError::from(err);
            log_error(&err);
            err
        })?;
        self.analyze(&series, laps)
    }

    /// Compute the full report for a session and its laps.
    ///
    /// Only malformed laps fail; missing data becomes unavailable metrics.
    pub fn analyze(&self, series: &SampleSeries, laps: &[Lap]) -> Result<ActivityReport> {
        let span = tracing::info_span!(
            "activity_report",
            samples = series.len(),
            laps = laps.len()
        );
        let _enter = span.enter();

        if let Err(err) = validate_laps(laps) {
            let err = MetricsError::from(err);
            log_error(&err);
            return Err(err);
        }

        let (overall, lap_reports) = rayon::join(
            || self.analyze_window(&series.window()),
            || {
                laps.par_iter()
                    .map(|lap| self.analyze_lap(series, lap))
                    .collect::<Vec<_>>()
            },
        );

        let (available, total) = overall.availability();
        tracing::info!(
            duration_seconds = series.duration_seconds(),
            available,
            total,
            "Activity report assembled"
        );

        Ok(ActivityReport::assemble(series, overall, lap_reports))
    }

    /// Metrics for one lap's sample subrange
    pub fn analyze_lap(&self, series: &SampleSeries, lap: &Lap) -> LapReport {
        let span = tracing::debug_span!("lap", index = lap.index);
        let _enter = span.enter();

        let window = series.lap_window(lap);
        if window.len() < 2 {
            tracing::debug!(samples = window.len(), "Lap has too few samples");
        }
        LapReport::new(lap, window.len(), self.analyze_window(&window))
    }

    /// Every metric over a single analysed range
    pub fn analyze_window(&self, window: &SeriesWindow<'_>) -> WindowMetrics {
        let midpoint = self.config.midpoint_sample;

        let basic = BasicAnalyzer::analyze(window, &self.config);
        let heart_rate = HeartRateAnalyzer::analyze(window, midpoint);
        let power = PowerAnalyzer::analyze(window, &self.profile, &self.config);
        let pace = SpeedAnalyzer::analyze(window);
        let zones = ZoneAnalysis {
            heart_rate: ZoneAnalyzer::analyze(window, &self.zones, Channel::HeartRate),
            power: ZoneAnalyzer::analyze(window, &self.zones, Channel::Power),
        };
        let efficiency = EfficiencyAnalyzer::analyze(window, midpoint);
        let environment = EnvironmentAnalyzer::analyze(window);

        let insights = InsightAnalyzer::analyze(
            &basic,
            &heart_rate,
            &power,
            &pace,
            &zones.heart_rate,
            &efficiency,
        );

        tracing::debug!(
            samples = window.len(),
            duration_seconds = window.duration(),
            "Window analyzed"
        );

        WindowMetrics {
            basic,
            heart_rate,
            power,
            pace,
            zones,
            efficiency,
            environment,
            insights,
        }
    }
}

/// Laps must have non-negative duration, ascending indices and must not
/// overlap. Adjacent laps may share a boundary instant.
pub fn validate_laps(laps: &[Lap]) -> std::result::Result<(), DataIntegrityError> {
    for lap in laps {
        if lap.end < lap.start {
            return Err(DataIntegrityError::InvalidLap {
                index: lap.index,
                start: lap.start,
                end: lap.end,
            });
        }
    }

    for pair in laps.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.index <= previous.index {
            return Err(DataIntegrityError::LapOrder {
                previous: previous.index,
                current: current.index,
            });
        }
        if current.start < previous.end {
            return Err(DataIntegrityError::OverlappingLaps {
                previous: previous.index,
                current: current.index,
            });
        }
    }

    Ok(())
}
