//! Shape of the dose -> outcome relationship for one medication/metric pair.

use crate::engine::types::{DoseLevel, DoseResponsePattern, DoseResponseResult};
use crate::stats::correlation::pearson;
use crate::stats::descriptive::mean;
use crate::stats::significance::p_value;

/// Characterizes how the outcome moves across distinct positive dose levels.
/// Returns `None` when no positive doses exist.
pub fn analyze(doses: &[f64], outcomes: &[f64]) -> Option<DoseResponseResult> {
    let positive: Vec<(f64, f64)> = doses
        .iter()
        .zip(outcomes.iter())
        .filter(|(d, _)| **d > 0.0)
        .map(|(d, o)| (*d, *o))
        .collect();
    if positive.is_empty() {
        return None;
    }

    let mut level_values: Vec<f64> = positive.iter().map(|(d, _)| *d).collect();
    level_values.sort_by(|a, b| a.total_cmp(b));
    level_values.dedup();

    let levels: Vec<DoseLevel> = level_values
        .iter()
        .map(|&level| {
            let outcomes_at_level: Vec<f64> = positive
                .iter()
                .filter(|(d, _)| *d == level)
                .map(|(_, o)| *o)
                .collect();
            DoseLevel {
                dose_mg: level,
                mean_outcome: mean(&outcomes_at_level),
                nights: outcomes_at_level.len(),
            }
        })
        .collect();

    let dose_vec: Vec<f64> = positive.iter().map(|(d, _)| *d).collect();
    let outcome_vec: Vec<f64> = positive.iter().map(|(_, o)| *o).collect();
    let dose_correlation = pearson(&dose_vec, &outcome_vec);
    let p = p_value(dose_correlation, dose_vec.len());

    let (pattern, optimal_dose) = classify(&levels, dose_correlation, p);

    Some(DoseResponseResult {
        levels,
        dose_correlation,
        p_value: p,
        pattern,
        optimal_dose,
    })
}

fn classify(
    levels: &[DoseLevel],
    dose_correlation: f64,
    p: f64,
) -> (DoseResponsePattern, Option<f64>) {
    if dose_correlation.abs() <= 0.3 || p >= 0.05 {
        return (DoseResponsePattern::None, None);
    }
    if levels.len() < 3 {
        return (DoseResponsePattern::Linear, None);
    }

    let mid = levels.len() / 2;
    let lower: Vec<f64> = levels[..mid].iter().map(|l| l.mean_outcome).collect();
    let upper: Vec<f64> = levels[mid + 1..].iter().map(|l| l.mean_outcome).collect();
    let lower_mean = mean(&lower);
    let middle_mean = levels[mid].mean_outcome;
    let upper_mean = mean(&upper);

    if middle_mean > lower_mean && middle_mean > upper_mean {
        let optimal = levels
            .iter()
            .max_by(|a, b| a.mean_outcome.total_cmp(&b.mean_outcome))
            .map(|l| l.dose_mg);
        (DoseResponsePattern::InvertedU, optimal)
    } else if middle_mean < lower_mean && middle_mean < upper_mean {
        (DoseResponsePattern::Quadratic, None)
    } else {
        (DoseResponsePattern::Linear, None)
    }
}
