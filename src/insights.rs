//! Rule-based classification of a window's metrics.
//!
//! Insights are computed from already-derived metrics and never from raw
//! samples. An insight whose inputs are unavailable carries the same reason.

use serde::{Deserialize, Serialize};

use crate::basic::BasicMetrics;
use crate::efficiency::EfficiencyAnalysis;
use crate::heart_rate::HeartRateAnalysis;
use crate::metric::{Metric, Unavailable};
use crate::pace::PaceAnalysis;
use crate::power::PowerAnalysis;
use crate::zones::ZoneDistribution;

const CONSISTENT_PACING_CV: f64 = 0.05;
const MODERATE_PACING_CV: f64 = 0.10;
const AEROBIC_BASE_PERCENT: f64 = 70.0;
const HIGH_INTENSITY_PERCENT: f64 = 20.0;
const DRIFT_DECOUPLING_PERCENT: f64 = 5.0;
const VARIABLE_POWER_INDEX: f64 = 1.1;
const STEADY_HEART_RATE_CV: f64 = 0.10;
const COMPLETION_ACTIVITY_FACTOR: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStrategy {
    Consistent,
    Moderate,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortDistribution {
    /// Most time in heart rate zone 2
    AerobicBase,
    /// Large share in heart rate zones 4 and 5
    HighIntensity,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutQuality {
    Excellent,
    Good,
    NeedsImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueIndicators {
    /// Aerobic decoupling above 5%
    pub cardiovascular_drift: Metric<bool>,
    /// Variability index above 1.1
    pub variable_power: Metric<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInsights {
    pub pacing: Metric<PacingStrategy>,
    pub effort: Metric<EffortDistribution>,
    pub fatigue: FatigueIndicators,
    pub quality: Metric<WorkoutQuality>,
}

pub struct InsightAnalyzer;

impl InsightAnalyzer {
    pub fn analyze(
        basic: &BasicMetrics,
        heart_rate: &HeartRateAnalysis,
        power: &PowerAnalysis,
        pace: &PaceAnalysis,
        heart_rate_zones: &Metric<ZoneDistribution>,
        efficiency: &EfficiencyAnalysis,
    ) -> PerformanceInsights {
        PerformanceInsights {
            pacing: pace.speed_variability.as_result().map(|&cv| Self::pacing(cv)).into(),
            effort: heart_rate_zones.as_result().map(Self::effort).into(),
            fatigue: FatigueIndicators {
                cardiovascular_drift: efficiency
                    .decoupling
                    .as_result()
                    .map(|split| split.percent > DRIFT_DECOUPLING_PERCENT)
                    .into(),
                variable_power: power
                    .variability_index
                    .as_result()
                    .map(|&vi| vi > VARIABLE_POWER_INDEX)
                    .into(),
            },
            quality: Self::quality(&heart_rate.variability, &basic.activity_factor).into(),
        }
    }

    pub fn pacing(speed_variability: f64) -> PacingStrategy {
        if speed_variability < CONSISTENT_PACING_CV {
            PacingStrategy::Consistent
        } else if speed_variability < MODERATE_PACING_CV {
            PacingStrategy::Moderate
        } else {
            PacingStrategy::Variable
        }
    }

    pub fn effort(zones: &ZoneDistribution) -> EffortDistribution {
        let high_intensity = zones.percent_in(3) + zones.percent_in(4);
        if zones.percent_in(1) > AEROBIC_BASE_PERCENT {
            EffortDistribution::AerobicBase
        } else if high_intensity > HIGH_INTENSITY_PERCENT {
            EffortDistribution::HighIntensity
        } else {
            EffortDistribution::Mixed
        }
    }

    /// Share of passed checks among those that could be evaluated
    pub fn quality(
        heart_rate_variability: &Metric<f64>,
        activity_factor: &Metric<f64>,
    ) -> Result<WorkoutQuality, Unavailable> {
        let checks = [
            heart_rate_variability
                .as_result()
                .map(|&cv| cv < STEADY_HEART_RATE_CV),
            activity_factor
                .as_result()
                .map(|&factor| factor > COMPLETION_ACTIVITY_FACTOR),
        ];

        let evaluated: Vec<bool> = checks.iter().filter_map(|c| c.ok()).collect();
        if evaluated.is_empty() {
            return Err(checks
                .iter()
                .find_map(|c| c.err())
                .unwrap_or(Unavailable::InsufficientData));
        }

        let passed = evaluated.iter().filter(|&&ok| ok).count();
        let share = passed as f64 / evaluated.len() as f64;
        Ok(if share > 0.8 {
            WorkoutQuality::Excellent
        } else if share > 0.6 {
            WorkoutQuality::Good
        } else {
            WorkoutQuality::NeedsImprovement
        })
    }
}
