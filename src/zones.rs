use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::metric::{Metric, Unavailable};
use crate::models::{AthleteProfile, Channel, ProfileField};
use crate::series::SeriesWindow;

/// Errors that can occur during zone lookups
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ZoneError {
    #[error("No {0} zones available: {1}")]
    Unavailable(Channel, Unavailable),
    #[error("Zones are not defined for channel {0}")]
    UnsupportedChannel(Channel),
}

const HEART_RATE_ZONE_NAMES: [&str; 5] = ["Recovery", "Aerobic", "Tempo", "Threshold", "Maximum"];

const POWER_ZONE_NAMES: [&str; 7] = [
    "Active Recovery",
    "Endurance",
    "Tempo",
    "Lactate Threshold",
    "VO2 Max",
    "Anaerobic Capacity",
    "Neuromuscular Power",
];

/// Upper bounds of heart rate zones 1-4 as fractions of max HR
///
/// - Z1: < 60% (Recovery)
/// - Z2: 60-70% (Aerobic)
/// - Z3: 70-80% (Tempo)
/// - Z4: 80-90% (Threshold)
/// - Z5: 90%+ (Maximum)
pub fn default_heart_rate_fractions() -> Vec<Decimal> {
    vec![dec!(0.60), dec!(0.70), dec!(0.80), dec!(0.90)]
}

/// Upper bounds of Coggan power zones 1-6 as fractions of FTP
///
/// - Z1: < 55% (Active Recovery)
/// - Z2: 55-75% (Endurance)
/// - Z3: 75-90% (Tempo)
/// - Z4: 90-105% (Lactate Threshold)
/// - Z5: 105-120% (VO2 Max)
/// - Z6: 120-150% (Anaerobic Capacity)
/// - Z7: 150%+ (Neuromuscular Power)
pub fn default_power_fractions() -> Vec<Decimal> {
    vec![
        dec!(0.55),
        dec!(0.75),
        dec!(0.90),
        dec!(1.05),
        dec!(1.20),
        dec!(1.50),
    ]
}

/// Threshold estimation formulas
pub struct ThresholdEstimator;

impl ThresholdEstimator {
    /// Estimate max heart rate from age (Tanaka: 208 - 0.7 × age)
    pub fn estimate_max_hr_from_age(age: u8) -> Decimal {
        dec!(208) - dec!(0.7) * Decimal::from(age)
    }

    /// Measured max HR if present, otherwise the age-based estimate
    pub fn resolve_max_hr(profile: &AthleteProfile) -> Result<Decimal, Unavailable> {
        match (profile.measured_max_hr(), profile.age) {
            (Some(max_hr), _) => Ok(Decimal::from(max_hr)),
            (None, Some(age)) => Ok(Self::estimate_max_hr_from_age(age)),
            (None, None) => Err(Unavailable::MissingProfile(ProfileField::MaxHr)),
        }
    }

    pub fn resolve_ftp(profile: &AthleteProfile) -> Result<Decimal, Unavailable> {
        profile
            .ftp_watts()
            .map(Decimal::from)
            .ok_or(Unavailable::MissingProfile(ProfileField::Ftp))
    }
}

/// Caller-supplied zone boundaries that replace the profile defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "boundaries", rename_all = "snake_case")]
pub enum ZoneOverride {
    /// Upper bounds as fractions of max HR or FTP
    Fractions(Vec<Decimal>),
    /// Upper bounds in bpm or watts; the athlete profile is not consulted
    Absolute(Vec<Decimal>),
}

/// Optional overrides per zoned channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneOverrides {
    pub heart_rate: Option<ZoneOverride>,
    pub power: Option<ZoneOverride>,
}

/// Ordered zone boundaries for one channel.
///
/// Zones are half-open `[low, high)` intervals; the top zone is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    channel: Channel,
    upper_bounds: Vec<f64>,
    names: Vec<String>,
}

impl ZoneSet {
    /// Build from absolute upper bounds of every zone but the last
    pub fn new(channel: Channel, upper_bounds: Vec<f64>) -> Result<Self, ConfigurationError> {
        validate_boundaries(channel, &upper_bounds, 0.0)?;
        let names = zone_names(channel, upper_bounds.len() + 1);
        Ok(Self {
            channel,
            upper_bounds,
            names,
        })
    }

    /// Build from fractions of a reference threshold (max HR or FTP)
    pub fn from_fractions(
        channel: Channel,
        reference: Decimal,
        fractions: &[Decimal],
    ) -> Result<Self, ConfigurationError> {
        validate_boundaries(channel, fractions, Decimal::ZERO)?;
        if reference <= Decimal::ZERO {
            return Err(ConfigurationError::InvalidParameter {
                name: format!("{} zone reference", channel),
                value: reference.to_string(),
            });
        }

        let upper_bounds = fractions
            .iter()
            .map(|fraction| decimal_to_f64(channel, *fraction * reference))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(channel, upper_bounds)
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn zone_count(&self) -> usize {
        self.upper_bounds.len() + 1
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    pub fn name(&self, zone: usize) -> &str {
        &self.names[zone]
    }

    /// Zero-based zone index: the first zone whose upper bound exceeds the value
    pub fn classify(&self, value: f64) -> usize {
        self.upper_bounds
            .iter()
            .position(|&upper| value < upper)
            .unwrap_or(self.upper_bounds.len())
    }

    /// `[low, high)` of a zone; `high` is `None` for the top zone
    pub fn bounds(&self, zone: usize) -> (f64, Option<f64>) {
        let low = if zone == 0 {
            0.0
        } else {
            self.upper_bounds[zone - 1]
        };
        (low, self.upper_bounds.get(zone).copied())
    }
}

fn zone_names(channel: Channel, count: usize) -> Vec<String> {
    let defaults: &[&str] = match channel {
        Channel::HeartRate => &HEART_RATE_ZONE_NAMES,
        Channel::Power => &POWER_ZONE_NAMES,
        _ => &[],
    };
    if defaults.len() == count {
        defaults.iter().map(|name| name.to_string()).collect()
    } else {
        (1..=count).map(|n| format!("Zone {}", n)).collect()
    }
}

fn validate_boundaries<T: PartialOrd + Copy>(
    channel: Channel,
    boundaries: &[T],
    zero: T,
) -> Result<(), ConfigurationError> {
    if boundaries.is_empty() {
        return Err(ConfigurationError::EmptyBoundaries { channel });
    }
    if boundaries.iter().any(|b| !(*b > zero)) {
        return Err(ConfigurationError::NonPositiveBoundary { channel });
    }
    if let Some(position) = boundaries.windows(2).position(|pair| !(pair[0] < pair[1])) {
        return Err(ConfigurationError::UnsortedBoundaries {
            channel,
            position: position + 1,
        });
    }
    Ok(())
}

fn decimal_to_f64(channel: Channel, value: Decimal) -> Result<f64, ConfigurationError> {
    value
        .to_f64()
        .ok_or_else(|| ConfigurationError::InvalidParameter {
            name: format!("{} zone boundary", channel),
            value: value.to_string(),
        })
}

/// Heart rate and power zones for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneModel {
    heart_rate: Metric<ZoneSet>,
    power: Metric<ZoneSet>,
}

impl ZoneModel {
    /// Default 5-zone HR and 7-zone power model derived from the profile
    pub fn from_profile(profile: &AthleteProfile) -> Result<Self, ConfigurationError> {
        Self::with_overrides(profile, &ZoneOverrides::default())
    }

    /// Profile-derived zones with explicit overrides taking precedence
    pub fn with_overrides(
        profile: &AthleteProfile,
        overrides: &ZoneOverrides,
    ) -> Result<Self, ConfigurationError> {
        let heart_rate = Self::build_zone_set(
            Channel::HeartRate,
            overrides.heart_rate.as_ref(),
            ThresholdEstimator::resolve_max_hr(profile),
            default_heart_rate_fractions(),
        )?;
        let power = Self::build_zone_set(
            Channel::Power,
            overrides.power.as_ref(),
            ThresholdEstimator::resolve_ftp(profile),
            default_power_fractions(),
        )?;

        tracing::debug!(
            heart_rate_zones = heart_rate.is_available(),
            power_zones = power.is_available(),
            "Zone model built"
        );

        Ok(Self { heart_rate, power })
    }

    fn build_zone_set(
        channel: Channel,
        zone_override: Option<&ZoneOverride>,
        reference: Result<Decimal, Unavailable>,
        default_fractions: Vec<Decimal>,
    ) -> Result<Metric<ZoneSet>, ConfigurationError> {
        match zone_override {
            Some(ZoneOverride::Absolute(bounds)) => {
                validate_boundaries(channel, bounds, Decimal::ZERO)?;
                let upper_bounds = bounds
                    .iter()
                    .map(|b| decimal_to_f64(channel, *b))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Metric::available(ZoneSet::new(channel, upper_bounds)?))
            }
            Some(ZoneOverride::Fractions(fractions)) => {
                // Shape errors surface even when the reference is missing
                validate_boundaries(channel, fractions, Decimal::ZERO)?;
                match reference {
                    Ok(reference) => Ok(Metric::available(ZoneSet::from_fractions(
                        channel, reference, fractions,
                    )?)),
                    Err(reason) => Ok(Metric::unavailable(reason)),
                }
            }
            None => match reference {
                Ok(reference) => Ok(Metric::available(ZoneSet::from_fractions(
                    channel,
                    reference,
                    &default_fractions,
                )?)),
                Err(reason) => Ok(Metric::unavailable(reason)),
            },
        }
    }

    pub fn heart_rate(&self) -> &Metric<ZoneSet> {
        &self.heart_rate
    }

    pub fn power(&self) -> &Metric<ZoneSet> {
        &self.power
    }

    /// Zone set for a channel, or why it is missing
    pub fn availability(&self, channel: Channel) -> Result<&ZoneSet, ZoneError> {
        let zones = match channel {
            Channel::HeartRate => &self.heart_rate,
            Channel::Power => &self.power,
            other => return Err(ZoneError::UnsupportedChannel(other)),
        };
        zones
            .as_result()
            .map_err(|reason| ZoneError::Unavailable(channel, reason))
    }

    /// Map a raw reading to its zero-based zone index.
    ///
    /// Fails when the model has no zones for the channel; check
    /// [`availability`](Self::availability) first.
    pub fn classify(&self, channel: Channel, value: f64) -> Result<usize, ZoneError> {
        Ok(self.availability(channel)?.classify(value))
    }
}

/// Time spent in a single zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTime {
    /// Zero-based zone index
    pub zone: usize,
    pub name: String,
    pub low: f64,
    pub high: Option<f64>,
    pub seconds: f64,
    /// Share of the channel's covered time
    pub percent: f64,
}

/// Elapsed time per zone for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDistribution {
    pub channel: Channel,
    pub zones: Vec<ZoneTime>,
    /// Total time covered by readings of the channel
    pub total_seconds: f64,
}

impl ZoneDistribution {
    pub fn seconds_in(&self, zone: usize) -> f64 {
        self.zones.get(zone).map(|z| z.seconds).unwrap_or(0.0)
    }

    pub fn percent_in(&self, zone: usize) -> f64 {
        self.zones.get(zone).map(|z| z.percent).unwrap_or(0.0)
    }
}

/// Zone distribution analysis utilities
pub struct ZoneAnalyzer;

impl ZoneAnalyzer {
    /// Time-in-zone for a channel, or why it cannot be computed
    pub fn analyze(
        window: &SeriesWindow<'_>,
        model: &ZoneModel,
        channel: Channel,
    ) -> Metric<ZoneDistribution> {
        if window.len() < 2 {
            return Metric::insufficient();
        }
        if !window.has_channel(channel) {
            return Metric::unavailable(Unavailable::MissingChannel(channel));
        }
        match model.availability(channel) {
            Ok(zones) => Metric::available(Self::distribution(window, zones)),
            Err(ZoneError::Unavailable(_, reason)) => Metric::unavailable(reason),
            Err(ZoneError::UnsupportedChannel(_)) => {
                Metric::unavailable(Unavailable::MissingChannel(channel))
            }
        }
    }

    /// Credit each reading's elapsed time to the zone of its value
    pub fn distribution(window: &SeriesWindow<'_>, zones: &ZoneSet) -> ZoneDistribution {
        let mut seconds = vec![0.0f64; zones.zone_count()];
        let mut total_seconds = 0.0f64;

        for (value, elapsed) in window.timed_values(zones.channel()) {
            seconds[zones.classify(value)] += elapsed;
            total_seconds += elapsed;
        }

        let zones_out = seconds
            .iter()
            .enumerate()
            .map(|(zone, &secs)| {
                let (low, high) = zones.bounds(zone);
                ZoneTime {
                    zone,
                    name: zones.name(zone).to_string(),
                    low,
                    high,
                    seconds: secs,
                    percent: if total_seconds > 0.0 {
                        secs / total_seconds * 100.0
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        ZoneDistribution {
            channel: zones.channel(),
            zones: zones_out,
            total_seconds,
        }
    }
}
