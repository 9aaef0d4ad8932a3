use chrono::{Duration, TimeZone, Utc};
use fitsight::zones::ZoneAnalyzer;
use fitsight::{AthleteProfile, Channel, Lap, MetricsEngine, Sample, SampleSeries};
use proptest::prelude::*;

fn create_test_athlete() -> AthleteProfile {
    AthleteProfile {
        age: Some(30),
        weight: Some(68.0),
        ftp: Some(240),
        max_hr: None,
    }
}

/// Irregular 1-5 s sampling with optional heart rate and power readings
fn irregular_series() -> impl Strategy<Value = SampleSeries> {
    prop::collection::vec(
        (
            1i64..=5,
            prop::option::of(80.0f64..200.0),
            prop::option::of(0.0f64..600.0),
        ),
        2..300,
    )
    .prop_map(|points| {
        let t0 = Utc.with_ymd_and_hms(2024, 2, 1, 6, 0, 0).unwrap();
        let mut offset = 0;
        let samples = points
            .into_iter()
            .map(|(gap, hr, power)| {
                let mut sample = Sample::new(t0 + Duration::seconds(offset));
                sample.heart_rate = hr;
                sample.power = power;
                offset += gap;
                sample
            })
            .collect();
        SampleSeries::new(samples).unwrap()
    })
}

proptest! {
    #[test]
    fn test_zone_time_sums_to_covered_time(series in irregular_series()) {
        let engine = MetricsEngine::from_profile(create_test_athlete()).unwrap();
        let window = series.window();

        for channel in [Channel::HeartRate, Channel::Power] {
            let distribution = ZoneAnalyzer::analyze(&window, engine.zones(), channel);
            if let Some(distribution) = distribution.value() {
                let covered: f64 = window.timed_values(channel).map(|(_, dt)| dt).sum();
                let summed: f64 = distribution.zones.iter().map(|z| z.seconds).sum();
                prop_assert!((summed - covered).abs() < 1e-6);
                prop_assert!((distribution.total_seconds - covered).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_whole_session_lap_equals_session(series in irregular_series()) {
        let engine = MetricsEngine::from_profile(create_test_athlete()).unwrap();
        let lap = Lap::new(7, series.start_time().unwrap(), series.end_time().unwrap());

        let session = engine.analyze_window(&series.window());
        let lap_report = engine.analyze_lap(&series, &lap);
        prop_assert_eq!(lap_report.sample_count, series.len());
        prop_assert_eq!(lap_report.metrics, session);
    }

    #[test]
    fn test_constant_trace_has_no_drift(
        heart_rate in 90.0f64..190.0,
        watts in 50.0f64..450.0,
        seconds in 60i64..2000
    ) {
        let t0 = Utc.with_ymd_and_hms(2024, 2, 1, 6, 0, 0).unwrap();
        let samples = (0..=seconds)
            .map(|i| {
                Sample::new(t0 + Duration::seconds(i))
                    .with(Channel::HeartRate, heart_rate)
                    .with(Channel::Power, watts)
            })
            .collect();
        let series = SampleSeries::new(samples).unwrap();
        let engine = MetricsEngine::from_profile(create_test_athlete()).unwrap();
        let metrics = engine.analyze_window(&series.window());

        prop_assert_eq!(metrics.heart_rate.drift.get().map(|d| d.percent), Some(0.0));
        prop_assert_eq!(metrics.efficiency.decoupling.get().map(|d| d.percent), Some(0.0));
        let vi = metrics.power.variability_index.get().unwrap();
        prop_assert!((vi - 1.0).abs() < 1e-9);
    }
}
