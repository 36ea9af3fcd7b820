use ndarray::Array1;
use std::cmp::Ordering;

pub(crate) fn normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn normalize_l1(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|x| x.abs()).sum();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// `ln(sigmoid(x))`, finite for every finite `x`.
pub(crate) fn log_sigmoid(x: f32) -> f32 {
    // -softplus(-x)
    x.min(0.0) - (-x.abs()).exp().ln_1p()
}

/// Numerically stable softmax; shifts by the max logit before exponentiating.
pub(crate) fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.mapv(|z| (z - max).exp());
    let sum = exps.sum();
    exps / sum
}

/// Returns up to `k` indices ordered by descending score.
///
/// Equal scores keep ascending index order, so the selection is deterministic.
pub(crate) fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    indices.truncate(k);
    indices
}
