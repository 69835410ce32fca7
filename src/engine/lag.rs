//! Day-offset search: at which lag is a medication's effect on a metric
//! strongest?
//!
//! Lags are sequence-position offsets over the ascending sequence of dates
//! that carry metric data, not calendar-day offsets; gaps in the record
//! shift the effective offset accordingly.

use crate::engine::types::{LagPoint, LagResult};
use crate::stats::correlation::pearson;
use crate::stats::significance::p_value;

/// Minimum paired points a lag must have to be scored at all.
const MIN_PAIRS_PER_LAG: usize = 10;

/// `medication` and `metric` are parallel vectors aligned to the sorted
/// metric-date sequence. Returns `None` when no lag reaches the pair floor.
pub fn analyze(medication: &[f64], metric: &[f64], max_lag: usize) -> Option<LagResult> {
    if medication.len() != metric.len() {
        return None;
    }

    let mut lags: Vec<LagPoint> = Vec::new();
    for lag in 0..=max_lag {
        if lag >= metric.len() {
            break;
        }
        let n = metric.len() - lag;
        if n < MIN_PAIRS_PER_LAG {
            continue;
        }
        let med_slice = &medication[..n];
        let metric_slice = &metric[lag..];
        let r = pearson(med_slice, metric_slice);
        lags.push(LagPoint {
            lag_days: lag,
            r,
            p_value: p_value(r, n),
            sample_size: n,
        });
    }

    let best = lags
        .iter()
        .max_by(|a, b| match a.r.abs().total_cmp(&b.r.abs()) {
            // First lag wins ties: prefer the earlier entry.
            std::cmp::Ordering::Equal => b.lag_days.cmp(&a.lag_days),
            ordering => ordering,
        })?;

    Some(LagResult {
        optimal_lag: best.lag_days,
        optimal_r: best.r,
        lags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_lengths_yield_none() {
        assert!(analyze(&[1.0; 12], &[1.0; 11], 2).is_none());
    }

    #[test]
    fn too_few_points_yield_none() {
        assert!(analyze(&[1.0; 5], &[1.0; 5], 2).is_none());
    }

    #[test]
    fn detects_one_day_shifted_effect() {
        // metric[i] tracks medication[i - 1] exactly.
        let medication: Vec<f64> =
            [3.0, 7.0, 1.0, 9.0, 4.0, 8.0, 2.0, 6.0, 5.0, 10.0, 3.5, 7.5, 1.5, 9.5, 4.5]
                .to_vec();
        let mut metric = vec![0.0];
        metric.extend(medication[..medication.len() - 1].iter().copied());
        let result = analyze(&medication, &metric, 3).unwrap();
        assert_eq!(result.optimal_lag, 1);
        assert!(result.optimal_r > 0.999);
        // Lag 0 was scored too, just weaker.
        assert!(result.lags.iter().any(|l| l.lag_days == 0));
    }

    #[test]
    fn same_night_effect_prefers_lag_zero() {
        let medication: Vec<f64> = (0..15).map(|i| (i % 5) as f64).collect();
        let metric: Vec<f64> = medication.iter().map(|v| v * 2.0 + 1.0).collect();
        let result = analyze(&medication, &metric, 3).unwrap();
        assert_eq!(result.optimal_lag, 0);
    }

    #[test]
    fn short_lags_are_skipped_once_pairs_fall_below_floor() {
        // 11 points: lag 0 has 11 pairs, lag 1 has 10, lag 2 would have 9.
        let medication: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let metric: Vec<f64> = (0..11).map(|i| (i * i) as f64).collect();
        let result = analyze(&medication, &metric, 3).unwrap();
        assert_eq!(result.lags.len(), 2);
        assert!(result.lags.iter().all(|l| l.sample_size >= 10));
    }
}
