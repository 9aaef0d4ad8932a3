use crate::config::AnalysisConfig;
use crate::metric::{ratio, Unavailable};
use crate::models::Channel;
use crate::series::SeriesWindow;
use crate::stats;

/// Normalized Power and the plain mean of the rolling means it was built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPower {
    pub normalized_power: f64,
    /// Mean of the same fully covered windows; the 4th-power mean never
    /// falls below it
    pub mean_rolling_power: f64,
}

impl SmoothedPower {
    /// Variability Index over the windows Normalized Power covers.
    ///
    /// Clamped at 1.0 to absorb rounding on constant traces.
    pub fn variability_index(&self) -> Result<f64, Unavailable> {
        Ok(ratio(self.normalized_power, self.mean_rolling_power)?.max(1.0))
    }
}

/// Core TSS calculation engine
pub struct TssCalculator;

impl TssCalculator {
    /// Normalized Power: fourth root of the mean of the fourth powers of the
    /// rolling mean of power.
    ///
    /// Only fully covered windows contribute, so a range shorter than the
    /// rolling window has no Normalized Power.
    pub fn normalized_power(
        window: &SeriesWindow<'_>,
        config: &AnalysisConfig,
    ) -> Result<f64, Unavailable> {
        Self::smoothed_power(window, config).map(|smoothed| smoothed.normalized_power)
    }

    /// Normalized Power together with the mean rolling power of the same windows
    pub fn smoothed_power(
        window: &SeriesWindow<'_>,
        config: &AnalysisConfig,
    ) -> Result<SmoothedPower, Unavailable> {
        window.require(Channel::Power)?;

        let rolling = window
            .rolling_mean(
                Channel::Power,
                config.rolling_window_seconds,
                config.window_alignment,
            )
            .filter_map(|(_, mean)| mean);

        let avg_fourth_power = stats::mean(rolling.clone().map(|power| power.powi(4)))
            .ok_or(Unavailable::InsufficientData)?;
        let mean_rolling_power = stats::mean(rolling).ok_or(Unavailable::InsufficientData)?;

        Ok(SmoothedPower {
            // Take fourth root (sqrt of sqrt)
            normalized_power: avg_fourth_power.sqrt().sqrt(),
            mean_rolling_power,
        })
    }

    /// Intensity Factor (IF = NP / FTP)
    pub fn intensity_factor(normalized_power: f64, ftp: u16) -> Result<f64, Unavailable> {
        ratio(normalized_power, f64::from(ftp))
    }

    /// TSS = (duration_seconds × NP × IF) / (FTP × 3600) × 100
    pub fn training_stress_score(
        duration_seconds: f64,
        normalized_power: f64,
        intensity_factor: f64,
        ftp: u16,
    ) -> Result<f64, Unavailable> {
        let work = duration_seconds * normalized_power * intensity_factor;
        Ok(ratio(work, f64::from(ftp) * 3600.0)? * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;
    use crate::series::{SampleSeries, WindowAlignment};
    use chrono::{Duration, TimeZone, Utc};

    fn power_series(watts: impl Fn(i64) -> f64, seconds: i64) -> SampleSeries {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 4, 9, 0, 0).unwrap();
        let samples = (0..=seconds)
            .map(|i| Sample::new(t0 + Duration::seconds(i)).with(Channel::Power, watts(i)))
            .collect();
        SampleSeries::new(samples).unwrap()
    }

    #[test]
    fn test_constant_power_normalizes_to_itself() {
        let series = power_series(|_| 200.0, 3600);
        let np = TssCalculator::normalized_power(&series.window(), &AnalysisConfig::default());
        assert_eq!(np, Ok(200.0));
    }

    #[test]
    fn test_intervals_raise_normalized_power() {
        // 60s at 300W, 60s at 100W: mean power 200W
        let series = power_series(|i| if (i / 60) % 2 == 0 { 300.0 } else { 100.0 }, 1200);
        let np = TssCalculator::normalized_power(&series.window(), &AnalysisConfig::default()).unwrap();
        assert!(np > 210.0, "np = {}", np);
    }

    #[test]
    fn test_short_range_has_no_normalized_power() {
        let series = power_series(|_| 250.0, 20);
        assert_eq!(
            TssCalculator::normalized_power(&series.window(), &AnalysisConfig::default()),
            Err(Unavailable::InsufficientData)
        );

        // Exactly one full trailing window at t = 30
        let series = power_series(|_| 250.0, 30);
        assert_eq!(
            TssCalculator::normalized_power(&series.window(), &AnalysisConfig::default()),
            Ok(250.0)
        );
    }

    #[test]
    fn test_variability_index_ignores_excluded_lead_in() {
        // 2000W spike at t = 0 sits outside every full trailing window
        let series = power_series(|i| if i == 0 { 2000.0 } else { 200.0 }, 60);
        let smoothed =
            TssCalculator::smoothed_power(&series.window(), &AnalysisConfig::default()).unwrap();

        assert_eq!(smoothed.normalized_power, 200.0);
        assert_eq!(smoothed.mean_rolling_power, 200.0);
        assert_eq!(smoothed.variability_index(), Ok(1.0));
    }

    #[test]
    fn test_centered_alignment() {
        let config = AnalysisConfig {
            window_alignment: WindowAlignment::Centered,
            ..AnalysisConfig::default()
        };
        let series = power_series(|_| 180.0, 600);
        assert_eq!(TssCalculator::normalized_power(&series.window(), &config), Ok(180.0));
    }

    #[test]
    fn test_missing_power_channel() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 4, 9, 0, 0).unwrap();
        let samples = (0..60)
            .map(|i| Sample::new(t0 + Duration::seconds(i)).with(Channel::HeartRate, 140.0))
            .collect();
        let series = SampleSeries::new(samples).unwrap();
        assert_eq!(
            TssCalculator::normalized_power(&series.window(), &AnalysisConfig::default()),
            Err(Unavailable::MissingChannel(Channel::Power))
        );
    }

    #[test]
    fn test_tss_for_one_hour_at_80_percent() {
        let intensity = TssCalculator::intensity_factor(200.0, 250).unwrap();
        assert!((intensity - 0.8).abs() < 1e-12);

        let tss = TssCalculator::training_stress_score(3600.0, 200.0, intensity, 250).unwrap();
        assert!((tss - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_hour_at_ftp_is_100_tss() {
        let tss = TssCalculator::training_stress_score(3600.0, 250.0, 1.0, 250).unwrap();
        assert!((tss - 100.0).abs() < 1e-9);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_normalized_power_bounds(
                watts in prop::collection::vec(0.0f64..1500.0, 31..400)
            ) {
                let series = power_series(|i| watts[i as usize], watts.len() as i64 - 1);
                let window = series.window();
                let config = AnalysisConfig::default();

                let np = TssCalculator::normalized_power(&window, &config);
                prop_assert!(np.is_ok());
                let np = np.unwrap();

                let rolling: Vec<f64> = window
                    .rolling_mean(Channel::Power, config.rolling_window_seconds, config.window_alignment)
                    .filter_map(|(_, mean)| mean)
                    .collect();
                let mean_rolling = rolling.iter().sum::<f64>() / rolling.len() as f64;
                let max_rolling = rolling.iter().copied().fold(0.0, f64::max);

                // Power mean inequality over the smoothed trace
                prop_assert!(np >= mean_rolling - 1e-9 * mean_rolling.max(1.0));
                prop_assert!(np <= max_rolling + 1e-9 * max_rolling.max(1.0));
            }

            #[test]
            fn test_variability_index_never_below_one(
                lead_in in 0.0f64..3000.0,
                watts in prop::collection::vec(1.0f64..1500.0, 31..400)
            ) {
                // A hard first sample is left out of every trailing window
                let series = power_series(
                    |i| if i == 0 { lead_in } else { watts[i as usize - 1] },
                    watts.len() as i64,
                );
                let window = series.window();
                let smoothed = TssCalculator::smoothed_power(&window, &AnalysisConfig::default()).unwrap();
                let vi = smoothed.variability_index().unwrap();

                prop_assert!(vi >= 1.0);
                prop_assert!(smoothed.normalized_power >= smoothed.mean_rolling_power * (1.0 - 1e-12));
            }

            #[test]
            fn test_tss_scales_with_duration(
                ftp in 150u16..350u16,
                np in 100.0f64..400.0,
                duration in 1800.0f64..7200.0
            ) {
                let intensity = TssCalculator::intensity_factor(np, ftp).unwrap();
                let single = TssCalculator::training_stress_score(duration, np, intensity, ftp).unwrap();
                let double = TssCalculator::training_stress_score(duration * 2.0, np, intensity, ftp).unwrap();

                prop_assert!(single > 0.0);
                prop_assert!((double - 2.0 * single).abs() < 1e-6 * double);
            }
        }
    }
}
