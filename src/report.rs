//! Immutable output of one analysis pass

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::basic::BasicMetrics;
use crate::efficiency::EfficiencyAnalysis;
use crate::environment::EnvironmentAnalysis;
use crate::heart_rate::HeartRateAnalysis;
use crate::insights::PerformanceInsights;
use crate::metric::Metric;
use crate::models::{Channel, Lap};
use crate::pace::PaceAnalysis;
use crate::power::PowerAnalysis;
use crate::series::SampleSeries;
use crate::zones::ZoneDistribution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAnalysis {
    pub heart_rate: Metric<ZoneDistribution>,
    pub power: Metric<ZoneDistribution>,
}

/// Every metric computed over one analysed range (session or lap)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub basic: BasicMetrics,
    pub heart_rate: HeartRateAnalysis,
    pub power: PowerAnalysis,
    pub pace: PaceAnalysis,
    pub zones: ZoneAnalysis,
    pub efficiency: EfficiencyAnalysis,
    pub environment: EnvironmentAnalysis,
    pub insights: PerformanceInsights,
}

impl WindowMetrics {
    /// `(available, total)` metric counts
    pub fn availability(&self) -> (usize, usize) {
        let mut map = BTreeMap::new();
        if let Ok(value) = serde_json::to_value(self) {
            flatten_metrics(&value, "", &mut map);
        }
        let available = map
            .values()
            .filter(|metric| metric["status"] == "available")
            .count();
        (available, map.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapReport {
    pub index: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sample_count: usize,
    pub metrics: WindowMetrics,
}

impl LapReport {
    pub(crate) fn new(lap: &Lap, sample_count: usize, metrics: WindowMetrics) -> Self {
        Self {
            index: lap.index,
            start: lap.start,
            end: lap.end,
            sample_count,
            metrics,
        }
    }
}

/// Session metrics plus one [`LapReport`] per lap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    sample_count: usize,
    channels: Vec<Channel>,
    overall: WindowMetrics,
    laps: Vec<LapReport>,
}

impl ActivityReport {
    pub(crate) fn assemble(series: &SampleSeries, overall: WindowMetrics, laps: Vec<LapReport>) -> Self {
        let channels = Channel::ALL
            .into_iter()
            .filter(|&channel| series.has_channel(channel))
            .collect();

        Self {
            start_time: series.start_time(),
            end_time: series.end_time(),
            sample_count: series.len(),
            channels,
            overall,
            laps,
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Channels with at least one reading in the session
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn overall(&self) -> &WindowMetrics {
        &self.overall
    }

    pub fn laps(&self) -> &[LapReport] {
        &self.laps
    }

    pub fn lap(&self, index: u32) -> Option<&LapReport> {
        self.laps.iter().find(|lap| lap.index == index)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Flat `metric name -> {status, value | reason}` mapping.
    ///
    /// Session metrics are keyed by section (`power.normalized_power`), lap
    /// metrics by lap index (`laps.2.power.normalized_power`).
    pub fn metric_map(&self) -> serde_json::Result<BTreeMap<String, Value>> {
        let mut map = BTreeMap::new();
        flatten_metrics(&serde_json::to_value(&self.overall)?, "", &mut map);
        for lap in &self.laps {
            let prefix = format!("laps.{}", lap.index);
            flatten_metrics(&serde_json::to_value(&lap.metrics)?, &prefix, &mut map);
        }
        Ok(map)
    }
}

/// Collect every object carrying a `status` key under its dotted path
fn flatten_metrics(value: &Value, path: &str, out: &mut BTreeMap<String, Value>) {
    let Value::Object(fields) = value else {
        return;
    };
    if fields.contains_key("status") {
        out.insert(path.to_string(), value.clone());
        return;
    }
    for (key, child) in fields {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        flatten_metrics(child, &child_path, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_metrics() {
        let value = json!({
            "power": {
                "normalized_power": {"status": "available", "value": 201.5},
                "intensity_factor": {"status": "unavailable", "reason": "missing ftp"}
            },
            "zones": {
                "heart_rate": {"status": "available", "value": {"zones": [], "total_seconds": 0.0}}
            }
        });
        let mut map = BTreeMap::new();
        flatten_metrics(&value, "", &mut map);

        assert_eq!(map.len(), 3);
        assert_eq!(map["power.normalized_power"]["value"], 201.5);
        assert_eq!(map["power.intensity_factor"]["reason"], "missing ftp");
        // Objects inside a metric value are not split further
        assert!(map.contains_key("zones.heart_rate"));
    }
}
