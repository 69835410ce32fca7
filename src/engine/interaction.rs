//! Non-additive (synergistic/antagonistic) effects between medication pairs.
//!
//! For each unordered pair the aligned points split into four disjoint
//! groups by (took A, took B). The interaction effect is how far the
//! both-taken group's mean sits from the additive expectation
//! `baseline + effectA + effectB`.

use crate::config::AnalysisConfig;
use crate::engine::types::{InteractionKind, InteractionResult};
use crate::model::AlignedDataPoint;
use crate::stats::descriptive::{mean, variance};
use crate::stats::significance::t_cdf;
use std::collections::BTreeSet;

/// Non-additivity threshold: the interaction must exceed 10% of the additive
/// expectation's magnitude to be reported.
const NON_ADDITIVE_RATIO: f64 = 0.1;

pub fn detect(points: &[AlignedDataPoint], config: &AnalysisConfig) -> Vec<InteractionResult> {
    let medications: Vec<String> = points
        .iter()
        .flat_map(|p| p.medications.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let metrics = config.tracked_metrics();
    let mut results = Vec::new();
    for (idx, med_a) in medications.iter().enumerate() {
        for med_b in &medications[idx + 1..] {
            for &metric in &metrics {
                if let Some(result) = analyze_pair(points, med_a, med_b, metric, config) {
                    results.push(result);
                }
            }
        }
    }
    results
}

fn analyze_pair(
    points: &[AlignedDataPoint],
    med_a: &str,
    med_b: &str,
    metric: &str,
    config: &AnalysisConfig,
) -> Option<InteractionResult> {
    let mut both: Vec<f64> = Vec::new();
    let mut only_a: Vec<f64> = Vec::new();
    let mut only_b: Vec<f64> = Vec::new();
    let mut neither: Vec<f64> = Vec::new();

    for point in points {
        let Some(&value) = point.metrics.get(metric) else {
            continue;
        };
        match (point.took(med_a), point.took(med_b)) {
            (true, true) => both.push(value),
            (true, false) => only_a.push(value),
            (false, true) => only_b.push(value),
            (false, false) => neither.push(value),
        }
    }

    if both.len() < config.min_sample_size || neither.len() < config.min_sample_size {
        return None;
    }

    let baseline = mean(&neither);
    // Empty single-medication groups carry no measurable solo effect.
    let effect_a = if only_a.is_empty() {
        0.0
    } else {
        mean(&only_a) - baseline
    };
    let effect_b = if only_b.is_empty() {
        0.0
    } else {
        mean(&only_b) - baseline
    };
    let combined_effect = mean(&both) - baseline;
    let additive = effect_a + effect_b;
    let interaction_effect = combined_effect - additive;

    if interaction_effect.abs() <= NON_ADDITIVE_RATIO * additive.abs() {
        return None;
    }
    let kind = if interaction_effect > 0.0 {
        InteractionKind::Synergistic
    } else {
        InteractionKind::Antagonistic
    };

    let p = welch_p_value(&both, &neither, additive);
    Some(InteractionResult {
        medication_a: med_a.to_string(),
        medication_b: med_b.to_string(),
        metric: metric.to_string(),
        baseline,
        effect_a,
        effect_b,
        combined_effect,
        interaction_effect,
        kind,
        p_value: p,
        is_significant: p < config.significance_level,
        nights_both: both.len(),
        nights_neither: neither.len(),
    })
}

/// Welch's t-test of the both-taken group against the neither-taken group
/// shifted by the additive expectation. The numerator is exactly the
/// interaction effect; Welch-Satterthwaite supplies the degrees of freedom.
fn welch_p_value(both: &[f64], neither: &[f64], additive: f64) -> f64 {
    let n_b = both.len() as f64;
    let n_n = neither.len() as f64;
    let var_b = variance(both) / n_b;
    let var_n = variance(neither) / n_n;
    let se = (var_b + var_n).sqrt();
    if se <= 0.0 || !se.is_finite() {
        return 1.0;
    }
    let t = (mean(both) - (mean(neither) + additive)) / se;
    let df = (var_b + var_n).powi(2)
        / (var_b.powi(2) / (n_b - 1.0) + var_n.powi(2) / (n_n - 1.0));
    if !df.is_finite() || df <= 0.0 {
        return 1.0;
    }
    (2.0 * (1.0 - t_cdf(t.abs(), df))).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MedicationDose;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn point(day: u32, meds: &[&str], score: f64) -> AlignedDataPoint {
        let medications: BTreeMap<String, MedicationDose> = meds
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    MedicationDose {
                        taken: true,
                        total_mg: 10.0,
                        quantity: 1.0,
                    },
                )
            })
            .collect();
        AlignedDataPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day as i64),
            medications,
            metrics: BTreeMap::from([("sleepScore".to_string(), score)]),
        }
    }

    fn config_with_floor(min_sample_size: usize) -> AnalysisConfig {
        AnalysisConfig {
            min_sample_size,
            metric_filter: Some(vec!["sleepScore".to_string()]),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn synergistic_pair_is_detected_and_significant() {
        // Solo effects +5 each over a baseline of 60, but together +30:
        // far beyond additive.
        let mut points = Vec::new();
        let mut day = 0;
        for i in 0..12 {
            points.push(point(day, &[], 60.0 + (i % 3) as f64));
            day += 1;
        }
        for i in 0..6 {
            points.push(point(day, &["ashwagandha"], 65.0 + (i % 3) as f64));
            day += 1;
        }
        for i in 0..6 {
            points.push(point(day, &["magnesium"], 65.0 + (i % 3) as f64));
            day += 1;
        }
        for i in 0..12 {
            points.push(point(day, &["ashwagandha", "magnesium"], 90.0 + (i % 3) as f64));
            day += 1;
        }

        let results = detect(&points, &config_with_floor(10));
        assert_eq!(results.len(), 1);
        let interaction = &results[0];
        assert_eq!(interaction.kind, InteractionKind::Synergistic);
        assert!(interaction.interaction_effect > 15.0);
        assert!(interaction.p_value < 0.05);
        assert!(interaction.is_significant);
        assert_eq!(interaction.medication_a, "ashwagandha");
        assert_eq!(interaction.medication_b, "magnesium");
    }

    #[test]
    fn antagonistic_pair_has_negative_interaction() {
        let mut points = Vec::new();
        let mut day = 0;
        for i in 0..10 {
            points.push(point(day, &[], 60.0 + (i % 2) as f64));
            day += 1;
        }
        for i in 0..5 {
            points.push(point(day, &["a"], 70.0 + (i % 2) as f64));
            day += 1;
        }
        for i in 0..5 {
            points.push(point(day, &["b"], 70.0 + (i % 2) as f64));
            day += 1;
        }
        // Together: barely above baseline, far below the additive +20.
        for i in 0..10 {
            points.push(point(day, &["a", "b"], 62.0 + (i % 2) as f64));
            day += 1;
        }

        let results = detect(&points, &config_with_floor(10));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, InteractionKind::Antagonistic);
        assert!(results[0].interaction_effect < 0.0);
    }

    #[test]
    fn additive_pairs_are_not_reported() {
        let mut points = Vec::new();
        let mut day = 0;
        for i in 0..10 {
            points.push(point(day, &[], 60.0 + (i % 2) as f64));
            day += 1;
        }
        for i in 0..5 {
            points.push(point(day, &["a"], 65.0 + (i % 2) as f64));
            day += 1;
        }
        for i in 0..5 {
            points.push(point(day, &["b"], 70.0 + (i % 2) as f64));
            day += 1;
        }
        // Combined sits exactly on the additive expectation (+15).
        for i in 0..10 {
            points.push(point(day, &["a", "b"], 75.0 + (i % 2) as f64));
            day += 1;
        }

        let results = detect(&points, &config_with_floor(10));
        assert!(results.is_empty());
    }

    #[test]
    fn small_groups_are_skipped() {
        let mut points = Vec::new();
        for day in 0..4 {
            points.push(point(day, &[], 60.0));
        }
        for day in 4..8 {
            points.push(point(day, &["a", "b"], 90.0));
        }
        assert!(detect(&points, &config_with_floor(10)).is_empty());
    }
}
