use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical sleep-metric keys produced by the device ingester.
///
/// Keys are camelCase strings because they travel as JSON map keys shared
/// with the ingestion and presentation layers.
pub const TRACKED_METRICS: &[&str] = &[
    "totalSleepMinutes",
    "deepSleepMinutes",
    "remSleepMinutes",
    "lightSleepMinutes",
    "sleepEfficiency",
    "latencyMinutes",
    "avgHrv",
    "avgHeartRate",
    "lowestHeartRate",
    "restlessPeriods",
    "sleepScore",
    "deepSleepPercent",
    "remSleepPercent",
];

pub fn is_tracked_metric(key: &str) -> bool {
    TRACKED_METRICS.contains(&key)
}

/// Drug classification injected by the external importer. The engine only
/// branches on `Stimulant` (daytime-dose attribution), but the full set is
/// carried through to results for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugClass {
    SleepAid,
    Stimulant,
    BetaBlocker,
    Antipsychotic,
    Anxiolytic,
    Antidepressant,
    Supplement,
    Other,
}

/// One recorded instance of taking a medication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseEvent {
    pub date: NaiveDate,
    /// Local clock time the dose was logged at.
    pub time: NaiveTime,
    /// Normalized medication name (importer guarantees casing/aliases).
    pub name: String,
    pub drug_class: DrugClass,
    pub quantity: f64,
    /// Dose per unit, in mg.
    pub dose_mg: f64,
    /// quantity * dose_mg, precomputed by the importer.
    pub total_mg: f64,
}

/// One night of unit-normalized sleep metrics keyed by ISO date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightlyMetricRecord {
    pub date: NaiveDate,
    /// Actual bedtime when the device reports one. Used for bedtime-relative
    /// dose attribution; absent means the fixed hour-of-day cutoff applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedtime: Option<NaiveDateTime>,
    /// Absent metrics are simply missing from the map.
    pub metrics: BTreeMap<String, f64>,
}

/// Per-night aggregate for a single medication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationNight {
    pub drug_class: DrugClass,
    pub total_mg: f64,
    pub quantity: f64,
    pub times: Vec<NaiveTime>,
}

/// All medication aggregates attributed to one sleep night.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepNightWindow {
    pub date: NaiveDate,
    pub medications: BTreeMap<String, MedicationNight>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationDose {
    pub taken: bool,
    pub total_mg: f64,
    pub quantity: f64,
}

/// One night's joined medication totals and sleep metrics. Only built for
/// dates that have sleep data; iteration order is deterministic by design.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedDataPoint {
    pub date: NaiveDate,
    pub medications: BTreeMap<String, MedicationDose>,
    pub metrics: BTreeMap<String, f64>,
}

impl AlignedDataPoint {
    pub fn took(&self, medication: &str) -> bool {
        self.medications
            .get(medication)
            .map(|m| m.taken)
            .unwrap_or(false)
    }

    /// Dose in mg for the night; absence is a true zero.
    pub fn dose_mg(&self, medication: &str) -> f64 {
        self.medications
            .get(medication)
            .map(|m| m.total_mg)
            .unwrap_or(0.0)
    }
}
