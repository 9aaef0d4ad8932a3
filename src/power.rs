use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::metric::{ratio, Metric, Unavailable};
use crate::models::{AthleteProfile, Channel, ProfileField};
use crate::series::SeriesWindow;
use crate::stats::ChannelStats;
use crate::tss::TssCalculator;

/// Power-based training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerAnalysis {
    pub mean: Metric<f64>,
    pub max: Metric<f64>,
    pub min: Metric<f64>,
    pub std_dev: Metric<f64>,
    /// Normalized Power (30-second rolling average by default)
    pub normalized_power: Metric<f64>,
    /// Intensity Factor (IF = NP/FTP)
    pub intensity_factor: Metric<f64>,
    pub training_stress_score: Metric<f64>,
    /// Variability Index (VI = NP / mean of the rolling power NP is built from)
    pub variability_index: Metric<f64>,
    /// Mean power per kilogram of body weight
    pub watts_per_kg: Metric<f64>,
}

impl PowerAnalysis {
    fn unavailable(reason: Unavailable) -> Self {
        Self {
            mean: Metric::unavailable(reason),
            max: Metric::unavailable(reason),
            min: Metric::unavailable(reason),
            std_dev: Metric::unavailable(reason),
            normalized_power: Metric::unavailable(reason),
            intensity_factor: Metric::unavailable(reason),
            training_stress_score: Metric::unavailable(reason),
            variability_index: Metric::unavailable(reason),
            watts_per_kg: Metric::unavailable(reason),
        }
    }
}

/// Power analysis engine
pub struct PowerAnalyzer;

impl PowerAnalyzer {
    /// Calculate comprehensive power metrics for a window
    pub fn analyze(
        window: &SeriesWindow<'_>,
        profile: &AthleteProfile,
        config: &AnalysisConfig,
    ) -> PowerAnalysis {
        if let Err(reason) = window.require_samples() {
            return PowerAnalysis::unavailable(reason);
        }

        // Missing profile fields are reported ahead of missing data
        let ftp = profile
            .ftp_watts()
            .ok_or(Unavailable::MissingProfile(ProfileField::Ftp));
        let weight = profile
            .weight_kg()
            .ok_or(Unavailable::MissingProfile(ProfileField::Weight));

        let Some(stats) = ChannelStats::from_values(window.values(Channel::Power)) else {
            let reason = Unavailable::MissingChannel(Channel::Power);
            return PowerAnalysis {
                intensity_factor: Metric::unavailable(ftp.err().unwrap_or(reason)),
                training_stress_score: Metric::unavailable(ftp.err().unwrap_or(reason)),
                watts_per_kg: Metric::unavailable(weight.err().unwrap_or(reason)),
                ..PowerAnalysis::unavailable(reason)
            };
        };

        let smoothed = TssCalculator::smoothed_power(window, config);
        let normalized_power = smoothed.map(|s| s.normalized_power);

        let intensity_factor = ftp.and_then(|ftp| {
            normalized_power.and_then(|np| TssCalculator::intensity_factor(np, ftp))
        });
        let training_stress_score = ftp.and_then(|ftp| {
            let np = normalized_power?;
            let intensity = TssCalculator::intensity_factor(np, ftp)?;
            TssCalculator::training_stress_score(window.duration(), np, intensity, ftp)
        });

        // Same windows as NP, so VI >= 1
        let variability_index = smoothed.and_then(|s| s.variability_index());

        let watts_per_kg = weight.and_then(|weight| ratio(stats.mean, weight));

        PowerAnalysis {
            mean: Metric::available(stats.mean),
            max: Metric::available(stats.max),
            min: Metric::available(stats.min),
            std_dev: Metric::from_option(stats.std_dev, Unavailable::InsufficientData),
            normalized_power: normalized_power.into(),
            intensity_factor: intensity_factor.into(),
            training_stress_score: training_stress_score.into(),
            variability_index: variability_index.into(),
            watts_per_kg: watts_per_kg.into(),
        }
    }
}
