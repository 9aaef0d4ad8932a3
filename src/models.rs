use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signal channels carried by activity samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    HeartRate,
    Power,
    Cadence,
    Speed,
    Altitude,
    Temperature,
    /// Cumulative distance in meters
    Distance,
    /// Cumulative energy expenditure in kilocalories
    Calories,
}

impl Channel {
    pub const ALL: [Channel; 8] = [
        Channel::HeartRate,
        Channel::Power,
        Channel::Cadence,
        Channel::Speed,
        Channel::Altitude,
        Channel::Temperature,
        Channel::Distance,
        Channel::Calories,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::HeartRate => "heart_rate",
            Channel::Power => "power",
            Channel::Cadence => "cadence",
            Channel::Speed => "speed",
            Channel::Altitude => "altitude",
            Channel::Temperature => "temperature",
            Channel::Distance => "distance",
            Channel::Calories => "calories",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Channel::HeartRate => "bpm",
            Channel::Power => "W",
            Channel::Cadence => "rpm",
            Channel::Speed => "m/s",
            Channel::Altitude => "m",
            Channel::Temperature => "°C",
            Channel::Distance => "m",
            Channel::Calories => "kcal",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|channel| channel.name() == s)
            .ok_or_else(|| format!("Unknown channel: {}", s))
    }
}

/// Single timestamped reading from the decoded activity file.
///
/// Every channel is optional: an absent reading is distinct from a zero reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,

    /// Heart rate in beats per minute
    pub heart_rate: Option<f64>,

    /// Power output in watts
    pub power: Option<f64>,

    /// Cadence in revolutions (or steps) per minute
    pub cadence: Option<f64>,

    /// Speed in meters per second
    pub speed: Option<f64>,

    /// Altitude in meters above sea level
    pub altitude: Option<f64>,

    /// Ambient temperature in degrees Celsius
    pub temperature: Option<f64>,

    /// Cumulative distance in meters
    pub distance: Option<f64>,

    /// Cumulative calories reported by the device
    pub calories: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            heart_rate: None,
            power: None,
            cadence: None,
            speed: None,
            altitude: None,
            temperature: None,
            distance: None,
            calories: None,
        }
    }

    /// Builder-style setter for any channel
    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        *self.slot_mut(channel) = Some(value);
        self
    }

    pub fn value(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::HeartRate => self.heart_rate,
            Channel::Power => self.power,
            Channel::Cadence => self.cadence,
            Channel::Speed => self.speed,
            Channel::Altitude => self.altitude,
            Channel::Temperature => self.temperature,
            Channel::Distance => self.distance,
            Channel::Calories => self.calories,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<f64> {
        match channel {
            Channel::HeartRate => &mut self.heart_rate,
            Channel::Power => &mut self.power,
            Channel::Cadence => &mut self.cadence,
            Channel::Speed => &mut self.speed,
            Channel::Altitude => &mut self.altitude,
            Channel::Temperature => &mut self.temperature,
            Channel::Distance => &mut self.distance,
            Channel::Calories => &mut self.calories,
        }
    }
}

/// Lap boundary as recorded by the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Ordinal position of the lap within the session
    pub index: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Lap {
    pub fn new(index: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { index, start, end }
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }
}

/// Athlete data used for threshold-based metrics.
///
/// Every field is optional; a missing field disables exactly the metrics that need it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Age in years
    pub age: Option<u8>,

    /// Weight in kilograms
    pub weight: Option<f64>,

    /// Functional Threshold Power (watts)
    pub ftp: Option<u16>,

    /// Maximum Heart Rate
    pub max_hr: Option<u16>,
}

impl AthleteProfile {
    /// FTP usable as a threshold; zero counts as not set
    pub fn ftp_watts(&self) -> Option<u16> {
        self.ftp.filter(|&ftp| ftp > 0)
    }

    /// Measured max HR usable as a threshold; zero counts as not set
    pub fn measured_max_hr(&self) -> Option<u16> {
        self.max_hr.filter(|&max_hr| max_hr > 0)
    }

    pub fn weight_kg(&self) -> Option<f64> {
        self.weight.filter(|&weight| weight.is_finite() && weight > 0.0)
    }

    pub fn has_power_thresholds(&self) -> bool {
        self.ftp_watts().is_some()
    }

    pub fn has_heart_rate_thresholds(&self) -> bool {
        self.measured_max_hr().is_some() || self.age.is_some()
    }
}

/// Athlete profile fields a metric can depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Age,
    Weight,
    Ftp,
    MaxHr,
}

impl ProfileField {
    pub fn name(&self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::Weight => "weight",
            ProfileField::Ftp => "ftp",
            ProfileField::MaxHr => "max_hr",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProfileField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "age" => Ok(ProfileField::Age),
            "weight" => Ok(ProfileField::Weight),
            "ftp" => Ok(ProfileField::Ftp),
            "max_hr" => Ok(ProfileField::MaxHr),
            _ => Err(format!("Unknown profile field: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_channel_round_trip_names() {
        for channel in Channel::ALL {
            assert_eq!(channel.name().parse::<Channel>().unwrap(), channel);
        }
        assert!("watts".parse::<Channel>().is_err());
    }

    #[test]
    fn test_channel_serialization() {
        let json = serde_json::to_string(&Channel::HeartRate).unwrap();
        assert_eq!(json, "\"heart_rate\"");
    }

    #[test]
    fn test_sample_builder_and_lookup() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let sample = Sample::new(ts)
            .with(Channel::HeartRate, 142.0)
            .with(Channel::Power, 0.0);

        assert_eq!(sample.value(Channel::HeartRate), Some(142.0));
        // Zero is a reading, not an absence
        assert_eq!(sample.value(Channel::Power), Some(0.0));
        assert_eq!(sample.value(Channel::Speed), None);
    }

    #[test]
    fn test_lap_duration() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let lap = Lap::new(0, start, start + chrono::Duration::seconds(600));
        assert_eq!(lap.duration_seconds(), 600.0);
    }

    #[test]
    fn test_profile_threshold_checks() {
        let mut profile = AthleteProfile::default();
        assert!(!profile.has_power_thresholds());
        assert!(!profile.has_heart_rate_thresholds());

        profile.age = Some(40);
        assert!(profile.has_heart_rate_thresholds());
        profile.ftp = Some(0);
        assert!(!profile.has_power_thresholds());
        profile.ftp = Some(250);
        assert!(profile.has_power_thresholds());

        profile.weight = Some(0.0);
        assert_eq!(profile.weight_kg(), None);
        profile.weight = Some(72.5);
        assert_eq!(profile.weight_kg(), Some(72.5));
    }
}
