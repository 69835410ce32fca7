//! Attribution of irregularly timed dose events to the sleep night they
//! plausibly affect, and the join of those attributions with nightly sleep
//! metrics.

use crate::config::AnalysisConfig;
use crate::model::{
    AlignedDataPoint, DoseEvent, DrugClass, MedicationDose, MedicationNight,
    NightlyMetricRecord, SleepNightWindow,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::collections::BTreeMap;

/// Fixed fallback cutoffs: doses before 6 a.m. belong to the previous night,
/// non-stimulant doses between 6 a.m. and 6 p.m. are unrelated daytime doses.
const MORNING_CUTOFF_HOUR: u32 = 6;
const EVENING_CUTOFF_HOUR: u32 = 18;

/// Groups dose events into per-date medication aggregates using the fixed
/// hour-of-day attribution rule only.
pub fn group_by_sleep_night(
    events: &[DoseEvent],
    config: &AnalysisConfig,
) -> BTreeMap<NaiveDate, SleepNightWindow> {
    group_by_sleep_night_with_bedtimes(events, &BTreeMap::new(), config)
}

/// Groups dose events into per-date medication aggregates.
///
/// When a night's actual bedtime is known, a dose falling inside
/// `[bedtime - windowBefore, bedtime + windowAfter]` attributes to that
/// night regardless of its clock hour. Doses outside every known bedtime
/// window fall back to the fixed cutoff rule. Each event contributes to at
/// most one window or is dropped.
pub fn group_by_sleep_night_with_bedtimes(
    events: &[DoseEvent],
    bedtimes: &BTreeMap<NaiveDate, NaiveDateTime>,
    config: &AnalysisConfig,
) -> BTreeMap<NaiveDate, SleepNightWindow> {
    let mut windows: BTreeMap<NaiveDate, SleepNightWindow> = BTreeMap::new();
    let mut dropped: usize = 0;

    for event in events {
        let night = match attribute_night(event, bedtimes, config) {
            Some(date) => date,
            None => {
                dropped += 1;
                continue;
            }
        };

        let window = windows.entry(night).or_insert_with(|| SleepNightWindow {
            date: night,
            medications: BTreeMap::new(),
        });
        let aggregate = window
            .medications
            .entry(event.name.clone())
            .or_insert_with(|| MedicationNight {
                drug_class: event.drug_class,
                total_mg: 0.0,
                quantity: 0.0,
                times: Vec::new(),
            });
        aggregate.total_mg += event.total_mg;
        aggregate.quantity += event.quantity;
        aggregate.times.push(event.time);
    }

    if dropped > 0 {
        tracing::debug!(
            dropped,
            total = events.len(),
            "daytime doses excluded from night attribution"
        );
    }
    windows
}

fn attribute_night(
    event: &DoseEvent,
    bedtimes: &BTreeMap<NaiveDate, NaiveDateTime>,
    config: &AnalysisConfig,
) -> Option<NaiveDate> {
    let timestamp = event.date.and_time(event.time);

    // Bedtime-relative attribution. A night's bedtime can sit late on the
    // night's own date or past midnight, so the event's neighbors are the
    // only candidate nights.
    let before = hours_duration(config.medication_window_hours_before);
    let after = hours_duration(config.medication_window_hours_after);
    for offset in [-1i64, 0, 1] {
        let night = event.date + Duration::days(offset);
        if let Some(&bedtime) = bedtimes.get(&night) {
            if timestamp >= bedtime - before && timestamp <= bedtime + after {
                return Some(night);
            }
        }
    }

    // Fixed cutoff fallback.
    let hour = event.time.hour();
    if hour < MORNING_CUTOFF_HOUR {
        Some(event.date - Duration::days(1))
    } else if hour < EVENING_CUTOFF_HOUR && event.drug_class != DrugClass::Stimulant {
        None
    } else {
        Some(event.date)
    }
}

fn hours_duration(hours: f64) -> Duration {
    Duration::seconds((hours * 3600.0).round() as i64)
}

/// Joins night windows with nightly metric records. Sleep data is mandatory:
/// one point per date present in the metric records, ascending by date;
/// nights without medication data carry an empty medication map.
pub fn align(
    windows: &BTreeMap<NaiveDate, SleepNightWindow>,
    records: &[NightlyMetricRecord],
) -> Vec<AlignedDataPoint> {
    let mut by_date: BTreeMap<NaiveDate, &NightlyMetricRecord> = BTreeMap::new();
    for record in records {
        by_date.insert(record.date, record);
    }

    by_date
        .into_iter()
        .map(|(date, record)| {
            let medications = windows
                .get(&date)
                .map(|window| {
                    window
                        .medications
                        .iter()
                        .map(|(name, night)| {
                            (
                                name.clone(),
                                MedicationDose {
                                    taken: true,
                                    total_mg: night.total_mg,
                                    quantity: night.quantity,
                                },
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
            AlignedDataPoint {
                date,
                medications,
                metrics: record.metrics.clone(),
            }
        })
        .collect()
}

/// Per-date bedtimes extracted from the metric records, for bedtime-relative
/// attribution.
pub fn bedtimes_by_date(records: &[NightlyMetricRecord]) -> BTreeMap<NaiveDate, NaiveDateTime> {
    records
        .iter()
        .filter_map(|record| record.bedtime.map(|bedtime| (record.date, bedtime)))
        .collect()
}
