//! Benjamini–Hochberg false-discovery-rate adjustment.
//!
//! Every medication × metric pair is tested at the nominal level, so with
//! M x K pairs roughly 0.05 * M * K false positives are expected by chance.
//! Significance flags stay raw-p based; q-values are attached to every
//! result so consumers can filter at an FDR level instead.

/// BH-adjusted q-values for `(key, p)` pairs. Non-finite or out-of-range
/// p-values are dropped. Output order follows ascending p.
pub fn bh_q_values(pairs: &[(usize, f64)]) -> Vec<(usize, f64)> {
    let mut sorted: Vec<(usize, f64)> = pairs
        .iter()
        .copied()
        .filter(|(_, p)| p.is_finite() && (0.0..=1.0).contains(p))
        .collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    let m = sorted.len() as f64;
    let mut q: Vec<(usize, f64)> = sorted
        .iter()
        .enumerate()
        .map(|(idx, &(key, p))| (key, (p * m / (idx + 1) as f64).clamp(0.0, 1.0)))
        .collect();

    // Step-up: make q monotone non-decreasing in p from the largest down.
    for idx in (0..q.len().saturating_sub(1)).rev() {
        if q[idx].1 > q[idx + 1].1 {
            q[idx].1 = q[idx + 1].1;
        }
    }
    q
}
