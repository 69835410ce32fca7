use crate::model::is_tracked_metric;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied analysis options. Never mutated by the engine; echoed back
/// on the results record so consumers know what produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Minimum nights a medication must appear on to be analyzed at all.
    pub min_sample_size: usize,
    /// Raw-p threshold for `is_significant`.
    pub significance_level: f64,
    /// Bedtime-relative attribution window, hours before bedtime.
    pub medication_window_hours_before: f64,
    /// Bedtime-relative attribution window, hours after bedtime.
    pub medication_window_hours_after: f64,
    pub analyze_lags: bool,
    pub max_lag_days: usize,
    pub analyze_dose_response: bool,
    /// Reserved wire-compatible toggle; timing analysis is not part of this
    /// engine.
    pub analyze_timing: bool,
    /// When set, restricts analysis to the named metric keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_filter: Option<Vec<String>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_sample_size: 10,
            significance_level: 0.05,
            medication_window_hours_before: 6.0,
            medication_window_hours_after: 2.0,
            analyze_lags: true,
            max_lag_days: 3,
            analyze_dose_response: true,
            analyze_timing: true,
            metric_filter: None,
        }
    }
}

impl AnalysisConfig {
    /// Rejects configurations before a run starts. Degenerate statistics are
    /// handled downstream with neutral values; a bad config is the one
    /// synchronous-reject condition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_sample_size == 0 {
            return Err(ConfigError::ZeroSampleFloor);
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigError::SignificanceOutOfRange(
                self.significance_level,
            ));
        }
        if self.medication_window_hours_before < 0.0 {
            return Err(ConfigError::NegativeWindowHours(
                self.medication_window_hours_before,
            ));
        }
        if self.medication_window_hours_after < 0.0 {
            return Err(ConfigError::NegativeWindowHours(
                self.medication_window_hours_after,
            ));
        }
        if let Some(filter) = &self.metric_filter {
            for key in filter {
                if !is_tracked_metric(key) {
                    return Err(ConfigError::UnknownMetric(key.clone()));
                }
            }
        }
        Ok(())
    }

    /// Metric keys this run analyzes, in canonical order.
    pub fn tracked_metrics(&self) -> Vec<&str> {
        match &self.metric_filter {
            Some(filter) => crate::model::TRACKED_METRICS
                .iter()
                .copied()
                .filter(|key| filter.iter().any(|f| f == key))
                .collect(),
            None => crate::model::TRACKED_METRICS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroSampleFloor,
    SignificanceOutOfRange(f64),
    NegativeWindowHours(f64),
    UnknownMetric(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSampleFloor => {
                write!(f, "minSampleSize must be at least 1")
            }
            ConfigError::SignificanceOutOfRange(v) => {
                write!(f, "significanceLevel must be in (0, 1), got {v}")
            }
            ConfigError::NegativeWindowHours(v) => {
                write!(f, "medication window hours must be non-negative, got {v}")
            }
            ConfigError::UnknownMetric(key) => {
                write!(f, "unrecognized metric key in metricFilter: {key}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
