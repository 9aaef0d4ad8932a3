//! Descriptive statistics over channel readings

use statrs::statistics::Statistics;

use crate::metric::{ratio, Unavailable};

/// Summary of one channel's readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; needs at least two readings
    pub std_dev: Option<f64>,
}

impl ChannelStats {
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: Iterator<Item = f64> + Clone,
    {
        let count = values.clone().count();
        if count == 0 {
            return None;
        }

        let mean: f64 = Statistics::mean(values.clone());
        let std_dev = if count >= 2 {
            Some(Statistics::std_dev(values.clone()))
        } else {
            None
        };
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

        Some(Self {
            count,
            mean,
            min,
            max,
            std_dev,
        })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Standard deviation divided by the mean
    pub fn coefficient_of_variation(&self) -> Result<f64, Unavailable> {
        let std_dev = self.std_dev.ok_or(Unavailable::InsufficientData)?;
        ratio(std_dev, self.mean)
    }
}

/// Arithmetic mean, `None` when there are no readings
pub fn mean<I>(values: I) -> Option<f64>
where
    I: Iterator<Item = f64> + Clone,
{
    if values.clone().next().is_none() {
        None
    } else {
        Some(Statistics::mean(values))
    }
}
