use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fitsight::{
    AnalysisConfig, AthleteProfile, Channel, Lap, MetricsEngine, Sample, SampleSeries,
    TssCalculator,
};

/// Performance benchmarks for the metrics engine
///
/// Sessions of increasing length check that every metric stays a single
/// linear pass over the samples.

fn create_benchmark_athlete() -> AthleteProfile {
    AthleteProfile {
        age: Some(35),
        weight: Some(70.0),
        ftp: Some(250),
        max_hr: Some(190),
    }
}

fn create_session(seconds: i64) -> SampleSeries {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let samples = (0..=seconds)
        .map(|i| {
            let t = i as f64;
            Sample::new(t0 + Duration::seconds(i))
                .with(Channel::HeartRate, 140.0 + 15.0 * (t / 600.0).sin())
                .with(Channel::Power, 220.0 + 80.0 * (t / 30.0).sin())
                .with(Channel::Speed, 9.0 + (t / 120.0).cos())
                .with(Channel::Cadence, 90.0)
                .with(Channel::Altitude, 300.0 + 50.0 * (t / 900.0).sin())
                .with(Channel::Temperature, 20.0)
        })
        .collect();
    SampleSeries::new(samples).unwrap()
}

fn create_laps(seconds: i64, lap_seconds: i64) -> Vec<Lap> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    (0..seconds / lap_seconds)
        .map(|n| {
            Lap::new(
                n as u32 + 1,
                t0 + Duration::seconds(n * lap_seconds),
                t0 + Duration::seconds((n + 1) * lap_seconds),
            )
        })
        .collect()
}

fn bench_normalized_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("Normalized Power");
    let config = AnalysisConfig::default();

    for &seconds in &[600, 3600, 14400] {
        let series = create_session(seconds);

        group.throughput(Throughput::Elements(series.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("normalized_power", seconds),
            &series,
            |b, series| {
                b.iter(|| TssCalculator::normalized_power(black_box(&series.window()), &config));
            },
        );
    }

    group.finish();
}

fn bench_activity_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("Activity Report");
    let engine = MetricsEngine::from_profile(create_benchmark_athlete()).unwrap();

    for &seconds in &[600, 3600, 14400] {
        let series = create_session(seconds);
        let laps = create_laps(seconds, 300);

        group.throughput(Throughput::Elements(series.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("analyze", seconds),
            &(series, laps),
            |b, (series, laps)| {
                b.iter(|| engine.analyze(black_box(series), black_box(laps)));
            },
        );
    }

    group.finish();
}

fn bench_report_serialization(c: &mut Criterion) {
    let engine = MetricsEngine::from_profile(create_benchmark_athlete()).unwrap();
    let series = create_session(3600);
    let report = engine.analyze(&series, &create_laps(3600, 600)).unwrap();

    c.bench_function("metric_map", |b| {
        b.iter(|| black_box(&report).metric_map());
    });
}

criterion_group!(
    benches,
    bench_normalized_power,
    bench_activity_report,
    bench_report_serialization
);
criterion_main!(benches);
