//! Vector math for scoring candidates.

/// Decimal places kept in the presented score.
pub const SCORE_DECIMALS: i32 = 3;

/// Sum of squares, accumulated in f64.
pub fn squared_magnitude(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x) * f64::from(x)).sum()
}

pub fn is_zero_vector(v: &[f32]) -> bool {
    squared_magnitude(v) == 0.0
}

/// Cosine similarity `dot(a,b) / (|a| * |b|)`.
///
/// Returns `None` when the lengths differ or either vector has zero
/// magnitude. The result is clamped to `[-1, 1]` so accumulated rounding
/// never leaks outside the range.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();
    let norm_a = squared_magnitude(a);
    let norm_b = squared_magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some((dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0))
}

/// Presentation rounding; never used as a sort key.
pub fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (score * factor).round() / factor
}
