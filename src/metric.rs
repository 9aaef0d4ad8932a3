//! Per-metric availability.
//!
//! Every value in an [`ActivityReport`](crate::report::ActivityReport) is a
//! [`Metric`]: either a computed value or an explicit [`Unavailable`] marker
//! naming the dependency that was missing.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::models::{Channel, ProfileField};

/// Reason a metric could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unavailable {
    /// Not enough samples (or readings) in the analysed range
    InsufficientData,
    /// A required signal channel has no readings
    MissingChannel(Channel),
    /// A required athlete profile field is absent
    MissingProfile(ProfileField),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::InsufficientData => f.write_str("insufficient data"),
            Unavailable::MissingChannel(channel) => write!(f, "missing {} channel", channel),
            Unavailable::MissingProfile(field) => write!(f, "missing {}", field),
        }
    }
}

impl FromStr for Unavailable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "insufficient data" {
            return Ok(Unavailable::InsufficientData);
        }
        let rest = s
            .strip_prefix("missing ")
            .ok_or_else(|| format!("Invalid unavailable reason: {}", s))?;
        match rest.strip_suffix(" channel") {
            Some(channel) => Ok(Unavailable::MissingChannel(channel.parse()?)),
            None => Ok(Unavailable::MissingProfile(rest.parse()?)),
        }
    }
}

impl Serialize for Unavailable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Unavailable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A computed metric or the reason it is missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Metric<T> {
    Available { value: T },
    Unavailable { reason: Unavailable },
}

impl<T> Metric<T> {
    pub fn available(value: T) -> Self {
        Metric::Available { value }
    }

    pub fn unavailable(reason: Unavailable) -> Self {
        Metric::Unavailable { reason }
    }

    pub fn insufficient() -> Self {
        Metric::Unavailable {
            reason: Unavailable::InsufficientData,
        }
    }

    pub fn from_option(value: Option<T>, reason: Unavailable) -> Self {
        match value {
            Some(value) => Metric::available(value),
            None => Metric::unavailable(reason),
        }
    }

    pub fn from_result(result: Result<T, Unavailable>) -> Self {
        match result {
            Ok(value) => Metric::available(value),
            Err(reason) => Metric::unavailable(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Available { value } => Some(value),
            Metric::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<Unavailable> {
        match self {
            Metric::Available { .. } => None,
            Metric::Unavailable { reason } => Some(*reason),
        }
    }

    pub fn as_result(&self) -> Result<&T, Unavailable> {
        match self {
            Metric::Available { value } => Ok(value),
            Metric::Unavailable { reason } => Err(*reason),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Metric<U> {
        match self {
            Metric::Available { value } => Metric::available(f(value)),
            Metric::Unavailable { reason } => Metric::unavailable(reason),
        }
    }
}

impl<T: Copy> Metric<T> {
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

impl<T> From<Result<T, Unavailable>> for Metric<T> {
    fn from(result: Result<T, Unavailable>) -> Self {
        Metric::from_result(result)
    }
}

/// Rejects zero or non-finite denominators and non-finite results
pub(crate) fn ratio(numerator: f64, denominator: f64) -> Result<f64, Unavailable> {
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(Unavailable::InsufficientData);
    }
    let value = numerator / denominator;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Unavailable::InsufficientData)
    }
}
