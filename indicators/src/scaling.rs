//! Decay weights and weighted averages.

/// `weight[n] = (1 - 2/length)^n` for `n` in `0..length`.
pub fn exponential(length: usize) -> Vec<f64> {
    let decay = 1.0 - 2.0 / length as f64;
    (0..length).map(|n| decay.powi(n as i32)).collect()
}

/// `weight[n] = 1 - n * 2/length` for `n` in `0..length`.
pub fn linear(length: usize) -> Vec<f64> {
    let step = 2.0 / length as f64;
    (0..length).map(|n| 1.0 - n as f64 * step).collect()
}

/// `Σ(v·w) / Σw` over the common prefix of `values` and `weights`.
/// Empty `values` give `0.0`.
pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len().min(weights.len());
    let (dot, total) = values[..n]
        .iter()
        .zip(&weights[..n])
        .fold((0.0, 0.0), |(dot, total), (v, w)| (dot + v * w, total + w));
    dot / total
}

/// Plain mean of component scores, each weighted `1/len`.
pub fn equal_weight_mean(values: &[f64]) -> f64 {
    let weights = vec![1.0 / values.len() as f64; values.len()];
    weighted_average(values, &weights)
}
