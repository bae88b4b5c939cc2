//! Cosine similarity over raw `f32` vectors.

/// Cosine similarity of `a` and `b`. Returns `0.0` if either vector has zero magnitude,
/// rather than dividing by zero; callers are expected to have already validated that
/// `a.len() == b.len()`.
#[must_use]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Min-max normalize `scores` into `[0, 1]`. A constant input normalizes to all `1.0`
/// rather than `NaN`, so it contributes fully rather than vanishing in a hybrid blend.
#[must_use]
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let Some(min) = scores.iter().copied().fold(None, |acc: Option<f32>, x| {
        Some(acc.map_or(x, |m| m.min(x)))
    }) else {
        return Vec::new();
    };
    let max = scores.iter().copied().fold(min, f32::max);
    let range = max - min;
    if range == 0.0 {
        return vec![1.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / range).collect()
}
