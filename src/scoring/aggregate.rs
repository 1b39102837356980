//! Optimistic weighted mean over raw scores.
//!
//! Weight per sample is `1 / (s + 0.1)`: a low (human-like or unique) score from any
//! source pulls the aggregate down harder than a high score pulls it up. This is the
//! single place to change if a different weighting policy is wanted.

/// Offset keeping the weight finite for a score of exactly zero.
pub const WEIGHT_OFFSET: f64 = 0.1;

#[inline]
pub fn weight_for(score: f64) -> f64 {
    1.0 / (score + WEIGHT_OFFSET)
}

/// `Σ(sᵢ·wᵢ) / Σ(wᵢ)` over `values`, falling back to the plain mean when the total
/// weight is not a usable positive number. Non-finite values are ignored; `None`
/// when nothing is left.
///
/// Result is clamped to `[0,1]` and lies within `[min(values), max(values)]`.
pub fn weighted_mean(values: &[f64]) -> Option<f64> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }
    let values = values.as_slice();

    let mut total_weight = 0.0;
    let mut weighted_sum = 0.0;
    for &s in values {
        let w = weight_for(s);
        total_weight += w;
        weighted_sum += s * w;
    }

    let out = if total_weight > 0.0 && total_weight.is_finite() && weighted_sum.is_finite() {
        weighted_sum / total_weight
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    };

    // Floating-point rounding can step a hair outside the sample range.
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    Some(out.clamp(lo, hi).clamp(0.0, 1.0))
}
