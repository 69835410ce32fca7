//! Runs the full medication x metric correlation analysis over aligned data.

use crate::config::AnalysisConfig;
use crate::engine::types::{
    AnalysisResults, CorrelationResult, Direction, MedicationAnalysis,
};
use crate::engine::{aligner, dose_response, interaction, lag};
use crate::error::{EngineError, EngineResult};
use crate::model::{AlignedDataPoint, DoseEvent, DrugClass, NightlyMetricRecord};
use crate::stats::correlation::{pearson, spearman};
use crate::stats::descriptive::mean;
use crate::stats::effect_size::{cohens_d, EffectSizeClass};
use crate::stats::fdr::bh_q_values;
use crate::stats::significance::{confidence_interval, p_value};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Pairs with fewer aligned points than this produce no result, regardless
/// of the configured medication occurrence floor.
const MIN_PAIR_POINTS: usize = 10;

const CONFIDENCE_LEVEL: f64 = 0.95;
const HIGHLY_SIGNIFICANT_P: f64 = 0.01;
const TOP_LIST_SIZE: usize = 10;

/// Builds the aligned-data feed without running any correlation analysis.
/// This is the sequence handed to the external ML analysis service.
pub fn aligned_points(
    events: &[DoseEvent],
    records: &[NightlyMetricRecord],
    config: &AnalysisConfig,
) -> EngineResult<Vec<AlignedDataPoint>> {
    config.validate()?;
    let bedtimes = aligner::bedtimes_by_date(records);
    let windows = aligner::group_by_sleep_night_with_bedtimes(events, &bedtimes, config);
    Ok(aligner::align(&windows, records))
}

/// Full analysis run. Pure and deterministic: identical inputs and config
/// produce bit-identical results. Cancellation is checked between medication
/// iterations, never mid-vector.
pub fn run_analysis(
    events: &[DoseEvent],
    records: &[NightlyMetricRecord],
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> EngineResult<AnalysisResults> {
    config.validate()?;

    let align_started = Instant::now();
    let bedtimes = aligner::bedtimes_by_date(records);
    let windows = aligner::group_by_sleep_night_with_bedtimes(events, &bedtimes, config);
    let points = aligner::align(&windows, records);
    tracing::info!(
        phase = "align",
        duration_ms = align_started.elapsed().as_millis() as u64,
        nights = points.len(),
        dose_events = events.len(),
        "aligned dose events with nightly metrics"
    );

    // Occurrence counts and drug classes over aligned data. Medications
    // below the floor are excluded entirely, not merely filtered from
    // output.
    let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
    for point in &points {
        for (name, dose) in &point.medications {
            if dose.taken {
                *occurrences.entry(name.as_str()).or_default() += 1;
            }
        }
    }
    let mut classes: BTreeMap<&str, DrugClass> = BTreeMap::new();
    for window in windows.values() {
        for (name, night) in &window.medications {
            classes.entry(name.as_str()).or_insert(night.drug_class);
        }
    }
    let total_medications = occurrences.len();
    let retained: Vec<&str> = occurrences
        .iter()
        .filter(|(_, &count)| count >= config.min_sample_size)
        .map(|(&name, _)| name)
        .collect();

    let metrics = config.tracked_metrics();
    let correlate_started = Instant::now();
    let mut analyses: Vec<MedicationAnalysis> = Vec::new();
    for medication in &retained {
        if cancel.is_cancelled() {
            return Err(EngineError::Canceled);
        }
        let drug_class = classes
            .get(medication)
            .copied()
            .unwrap_or(DrugClass::Other);
        let mut results: Vec<CorrelationResult> = Vec::new();
        for metric in &metrics {
            if let Some(result) =
                analyze_pair(&points, medication, drug_class, metric, config)
            {
                results.push(result);
            }
        }
        let significant: Vec<CorrelationResult> = results
            .iter()
            .filter(|r| r.is_significant)
            .cloned()
            .collect();
        analyses.push(MedicationAnalysis {
            medication: medication.to_string(),
            drug_class,
            occurrence_count: occurrences[*medication],
            results,
            significant,
        });
    }
    tracing::info!(
        phase = "correlate",
        duration_ms = correlate_started.elapsed().as_millis() as u64,
        medications = analyses.len(),
        metrics = metrics.len(),
        "correlation pass complete"
    );

    attach_q_values(&mut analyses);

    let mut significant: Vec<CorrelationResult> = analyses
        .iter()
        .flat_map(|a| a.significant.iter().cloned())
        .collect();
    significant.sort_by(|a, b| {
        b.pearson_r
            .abs()
            .total_cmp(&a.pearson_r.abs())
            .then(a.p_value.total_cmp(&b.p_value))
    });
    let top_positive: Vec<CorrelationResult> = significant
        .iter()
        .filter(|r| r.pearson_r > 0.0)
        .take(TOP_LIST_SIZE)
        .cloned()
        .collect();
    let top_negative: Vec<CorrelationResult> = significant
        .iter()
        .filter(|r| r.pearson_r < 0.0)
        .take(TOP_LIST_SIZE)
        .cloned()
        .collect();

    if cancel.is_cancelled() {
        return Err(EngineError::Canceled);
    }
    let interactions_started = Instant::now();
    let interactions = interaction::detect(&points, config);
    tracing::info!(
        phase = "interactions",
        duration_ms = interactions_started.elapsed().as_millis() as u64,
        pairs_reported = interactions.len(),
        "interaction pass complete"
    );

    Ok(AnalysisResults {
        total_nights: points.len(),
        total_medications,
        analyzed_medications: analyses.len(),
        medications: analyses,
        significant,
        top_positive,
        top_negative,
        interactions,
        config: config.clone(),
    })
}

/// One medication x metric test over all aligned points carrying the metric.
/// Nights without the medication contribute a true-zero dose.
fn analyze_pair(
    points: &[AlignedDataPoint],
    medication: &str,
    drug_class: DrugClass,
    metric: &str,
    config: &AnalysisConfig,
) -> Option<CorrelationResult> {
    let mut doses: Vec<f64> = Vec::new();
    let mut outcomes: Vec<f64> = Vec::new();
    for point in points {
        let Some(&value) = point.metrics.get(metric) else {
            continue;
        };
        doses.push(point.dose_mg(medication));
        outcomes.push(value);
    }
    if doses.len() < MIN_PAIR_POINTS {
        tracing::debug!(
            medication,
            metric,
            n = doses.len(),
            "pair skipped below sample floor"
        );
        return None;
    }

    let n = doses.len();
    let pearson_r = pearson(&doses, &outcomes);
    let spearman_rho = spearman(&doses, &outcomes);
    let p = p_value(pearson_r, n);
    let (ci_low, ci_high) = confidence_interval(pearson_r, n, CONFIDENCE_LEVEL);

    let with_med: Vec<f64> = doses
        .iter()
        .zip(outcomes.iter())
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, o)| *o)
        .collect();
    let without_med: Vec<f64> = doses
        .iter()
        .zip(outcomes.iter())
        .filter(|(d, _)| **d == 0.0)
        .map(|(_, o)| *o)
        .collect();
    let d = cohens_d(&with_med, &without_med);
    let mean_with = mean(&with_med);
    let mean_without = mean(&without_med);
    let mean_difference = mean_with - mean_without;
    let percent_change = if mean_without == 0.0 {
        0.0
    } else {
        mean_difference / mean_without * 100.0
    };

    let is_significant = p < config.significance_level;
    let mut result = CorrelationResult {
        medication: medication.to_string(),
        drug_class,
        metric: metric.to_string(),
        pearson_r,
        spearman_rho,
        p_value: p,
        q_value: None,
        is_significant,
        is_highly_significant: p < HIGHLY_SIGNIFICANT_P,
        cohens_d: d,
        effect_size: EffectSizeClass::from_d(d),
        ci_low,
        ci_high,
        sample_size: n,
        nights_with: with_med.len(),
        nights_without: without_med.len(),
        direction: Direction::from_r(pearson_r),
        mean_with,
        mean_without,
        mean_difference,
        percent_change,
        dose_response: None,
        lag: None,
    };

    if is_significant {
        if config.analyze_dose_response {
            result.dose_response = dose_response::analyze(&doses, &outcomes);
        }
        if config.analyze_lags {
            result.lag = lag::analyze(&doses, &outcomes, config.max_lag_days);
        }
    }
    Some(result)
}

/// Benjamini-Hochberg q-values across every emitted pair in the run.
/// Significance flags stay raw-p based; q-values let consumers filter at an
/// FDR level instead.
fn attach_q_values(analyses: &mut [MedicationAnalysis]) {
    let mut raw: Vec<(usize, f64)> = Vec::new();
    let mut index = 0usize;
    for analysis in analyses.iter() {
        for result in &analysis.results {
            raw.push((index, result.p_value));
            index += 1;
        }
    }
    let q_by_index: BTreeMap<usize, f64> = bh_q_values(&raw).into_iter().collect();

    let mut index = 0usize;
    for analysis in analyses.iter_mut() {
        for result in analysis.results.iter_mut() {
            result.q_value = q_by_index.get(&index).copied();
            index += 1;
        }
        // The significant subset holds clones; refresh them.
        let refreshed: Vec<CorrelationResult> = analysis
            .results
            .iter()
            .filter(|r| r.is_significant)
            .cloned()
            .collect();
        analysis.significant = refreshed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DrugClass;
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::BTreeMap;

    fn day(i: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn dose_event(date: NaiveDate, name: &str, mg: f64) -> DoseEvent {
        DoseEvent {
            date,
            time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            name: name.to_string(),
            drug_class: DrugClass::SleepAid,
            quantity: 1.0,
            dose_mg: mg,
            total_mg: mg,
        }
    }

    fn sleep_record(date: NaiveDate, minutes: f64) -> NightlyMetricRecord {
        NightlyMetricRecord {
            date,
            bedtime: None,
            metrics: BTreeMap::from([("totalSleepMinutes".to_string(), minutes)]),
        }
    }

    /// 30 nights where DrugX total mg is (near-)perfectly anti-correlated
    /// with total sleep minutes. A tiny alternating wobble keeps |r| just
    /// under 1 so the p-value machinery engages instead of the |r| >= 1
    /// degenerate path.
    fn anticorrelated_fixture() -> (Vec<DoseEvent>, Vec<NightlyMetricRecord>) {
        let mut events = Vec::new();
        let mut records = Vec::new();
        for i in 0..30u32 {
            let mg = ((i % 3) + 1) as f64 * 10.0;
            let wobble = if i % 2 == 0 { 0.5 } else { -0.5 };
            events.push(dose_event(day(i), "DrugX", mg));
            records.push(sleep_record(day(i), 500.0 - 4.0 * mg + wobble));
        }
        (events, records)
    }

    #[test]
    fn engineered_anticorrelation_is_detected() {
        let (events, records) = anticorrelated_fixture();
        let results = run_analysis(
            &events,
            &records,
            &AnalysisConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(results.total_nights, 30);
        assert_eq!(results.analyzed_medications, 1);
        let analysis = &results.medications[0];
        assert_eq!(analysis.medication, "DrugX");
        assert_eq!(analysis.occurrence_count, 30);

        let result = analysis
            .results
            .iter()
            .find(|r| r.metric == "totalSleepMinutes")
            .unwrap();
        assert!(result.pearson_r < -0.99, "r = {}", result.pearson_r);
        assert!(result.is_significant);
        assert!(result.is_highly_significant);
        assert_eq!(result.direction, Direction::Negative);
        assert!(result.spearman_rho < -0.9);
        assert!(result.ci_low <= result.pearson_r && result.pearson_r <= result.ci_high);
        // Every night has the medication, so the without-group is empty.
        assert_eq!(result.nights_without, 0);
        assert_eq!(result.cohens_d, 0.0);
        assert_eq!(result.percent_change, 0.0);
        // Significant pair gets dose-response and lag attachments.
        assert!(result.dose_response.is_some());
        assert!(result.lag.is_some());
        assert!(result.q_value.is_some());

        assert_eq!(results.significant.len(), 1);
        assert!(results.top_positive.is_empty());
        assert_eq!(results.top_negative.len(), 1);
    }

    #[test]
    fn runs_are_bit_identical() {
        let (events, records) = anticorrelated_fixture();
        let config = AnalysisConfig::default();
        let token = CancellationToken::new();
        let first = run_analysis(&events, &records, &config, &token).unwrap();
        let second = run_analysis(&events, &records, &config, &token).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn medications_below_occurrence_floor_are_excluded_entirely() {
        let (mut events, records) = anticorrelated_fixture();
        // RareDrug appears on 3 nights only.
        for i in 0..3u32 {
            events.push(dose_event(day(i), "RareDrug", 5.0));
        }
        let results = run_analysis(
            &events,
            &records,
            &AnalysisConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(results.total_medications, 2);
        assert_eq!(results.analyzed_medications, 1);
        assert!(results
            .medications
            .iter()
            .all(|m| m.medication != "RareDrug"));
    }

    #[test]
    fn cancellation_is_observed() {
        let (events, records) = anticorrelated_fixture();
        let token = CancellationToken::new();
        token.cancel();
        let err = run_analysis(&events, &records, &AnalysisConfig::default(), &token)
            .unwrap_err();
        assert!(matches!(err, EngineError::Canceled));
    }

    #[test]
    fn invalid_config_rejects_before_running() {
        let (events, records) = anticorrelated_fixture();
        let config = AnalysisConfig {
            significance_level: 1.5,
            ..AnalysisConfig::default()
        };
        let err = run_analysis(&events, &records, &config, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn aligned_points_feed_matches_align_semantics() {
        let (events, records) = anticorrelated_fixture();
        let points =
            aligned_points(&events, &records, &AnalysisConfig::default()).unwrap();
        assert_eq!(points.len(), 30);
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        assert!(points.iter().all(|p| p.took("DrugX")));
    }

    #[test]
    fn pairs_below_ten_points_emit_no_result() {
        // 9 nights of sleep data: medication clears the occurrence floor of
        // 5 but the pair floor of 10 points cannot be met.
        let mut events = Vec::new();
        let mut records = Vec::new();
        for i in 0..9u32 {
            events.push(dose_event(day(i), "DrugY", 10.0 + i as f64));
            records.push(sleep_record(day(i), 400.0 - i as f64));
        }
        let config = AnalysisConfig {
            min_sample_size: 5,
            ..AnalysisConfig::default()
        };
        let results =
            run_analysis(&events, &records, &config, &CancellationToken::new()).unwrap();
        assert_eq!(results.analyzed_medications, 1);
        assert!(results.medications[0].results.is_empty());
    }
}
