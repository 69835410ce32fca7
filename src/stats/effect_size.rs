//! Cohen's d standardized mean difference between two groups.

use crate::stats::descriptive::{mean, variance};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSizeClass {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSizeClass {
    /// Conventional thresholds on |d|: 0.2 / 0.5 / 0.8.
    pub fn from_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            EffectSizeClass::Negligible
        } else if d < 0.5 {
            EffectSizeClass::Small
        } else if d < 0.8 {
            EffectSizeClass::Medium
        } else {
            EffectSizeClass::Large
        }
    }
}

/// Pooled-standard-deviation effect size. Returns 0.0 when either group is
/// empty or the pooled SD is 0 (identical constant groups carry no signal).
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let n_a = a.len() as f64;
    let n_b = b.len() as f64;
    let df = n_a + n_b - 2.0;
    if df <= 0.0 {
        return 0.0;
    }
    let pooled_variance = ((n_a - 1.0) * variance(a) + (n_b - 1.0) * variance(b)) / df;
    let pooled_sd = pooled_variance.sqrt();
    if pooled_sd <= 0.0 || !pooled_sd.is_finite() {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled_sd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_groups_have_zero_d() {
        let a = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(cohens_d(&a, &a), 0.0);
    }

    #[test]
    fn empty_group_yields_zero() {
        assert_eq!(cohens_d(&[], &[1.0, 2.0]), 0.0);
        assert_eq!(cohens_d(&[1.0, 2.0], &[]), 0.0);
    }

    #[test]
    fn zero_pooled_sd_yields_zero() {
        assert_eq!(cohens_d(&[2.0, 2.0, 2.0], &[5.0, 5.0]), 0.0);
    }

    #[test]
    fn separated_groups_have_large_d() {
        let a = [10.0, 11.0, 12.0, 10.5, 11.5];
        let b = [1.0, 2.0, 1.5, 2.5, 1.2];
        assert!(cohens_d(&a, &b) > 0.8);
        assert!(cohens_d(&b, &a) < -0.8);
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(EffectSizeClass::from_d(0.15), EffectSizeClass::Negligible);
        assert_eq!(EffectSizeClass::from_d(0.35), EffectSizeClass::Small);
        assert_eq!(EffectSizeClass::from_d(0.65), EffectSizeClass::Medium);
        assert_eq!(EffectSizeClass::from_d(1.2), EffectSizeClass::Large);
        assert_eq!(EffectSizeClass::from_d(-0.65), EffectSizeClass::Medium);
        // Boundary values land in the upper class.
        assert_eq!(EffectSizeClass::from_d(0.2), EffectSizeClass::Small);
        assert_eq!(EffectSizeClass::from_d(0.8), EffectSizeClass::Large);
    }
}
