//! Pearson and Spearman correlation coefficients.
//!
//! Callers filter missing values beforehand; these routines only validate
//! lengths. Degenerate inputs (short vectors, zero variance) resolve to 0.0.

/// 1-based ranks with tie-averaging: each run of equal values receives the
/// arithmetic mean of the rank positions it occupies.
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut out = vec![0.0; values.len()];
    let mut i = 0;
    while i < indices.len() {
        let start = i;
        let value = values[indices[i]];
        i += 1;
        while i < indices.len() && values[indices[i]] == value {
            i += 1;
        }
        let avg_rank = (start + i - 1) as f64 / 2.0 + 1.0;
        for idx in &indices[start..i] {
            out[*idx] = avg_rank;
        }
    }
    out
}

/// Sample Pearson correlation coefficient, clamped to [-1, 1].
///
/// Returns 0.0 for mismatched lengths, n < 3, or zero variance in either
/// vector.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 3 {
        return 0.0;
    }
    let n = x.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    let mut sum_xy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        sum_x += xi;
        sum_y += yi;
        sum_x2 += xi * xi;
        sum_y2 += yi * yi;
        sum_xy += xi * yi;
    }
    let denom_x = n * sum_x2 - sum_x * sum_x;
    let denom_y = n * sum_y2 - sum_y * sum_y;
    let denom = (denom_x * denom_y).sqrt();
    if denom <= 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let r = (n * sum_xy - sum_x * sum_y) / denom;
    r.clamp(-1.0, 1.0)
}

/// Spearman rank correlation: Pearson over tie-averaged ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 3 {
        return 0.0;
    }
    pearson(&ranks(x), &ranks(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_vectors_yield_zero() {
        assert_eq!(pearson(&[1.0, 2.0], &[2.0, 4.0]), 0.0);
        assert_eq!(pearson(&[], &[]), 0.0);
        assert_eq!(spearman(&[1.0, 2.0], &[2.0, 4.0]), 0.0);
    }

    #[test]
    fn mismatched_lengths_yield_zero() {
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn self_correlation_is_one() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((pearson(&x, &x) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_yields_zero() {
        let x = [3.0, 3.0, 3.0, 3.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(pearson(&x, &y), 0.0);
    }

    #[test]
    fn ranks_average_ties() {
        // [10, 20, 20, 30] -> [1, 2.5, 2.5, 4]
        assert_eq!(ranks(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn ranks_of_empty_is_empty() {
        assert!(ranks(&[]).is_empty());
    }

    #[test]
    fn spearman_invariant_under_monotonic_transform() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
        let base = spearman(&x, &y);
        // exp() is strictly increasing, so ranks are unchanged.
        let x_exp: Vec<f64> = x.iter().map(|v| v.exp()).collect();
        let y_cube: Vec<f64> = y.iter().map(|v| v * v * v).collect();
        assert!((spearman(&x_exp, &y) - base).abs() < 1e-12);
        assert!((spearman(&x, &y_cube) - base).abs() < 1e-12);
    }

    #[test]
    fn spearman_perfect_monotone_is_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [10.0, 100.0, 1000.0, 10000.0];
        assert!((spearman(&x, &y) - 1.0).abs() < 1e-12);
    }
}
