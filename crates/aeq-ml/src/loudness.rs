//! RMS loudness matching

/// Root-mean-square level; 0 for an empty slice
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Gain that brings `output` to the level of `reference`
///
/// `eps` keeps the ratio finite for silent output; silent reference and
/// silent output give unity gain.
pub fn loudness_gain(reference: &[f32], output: &[f32], eps: f32) -> f32 {
    (rms(reference) + eps) / (rms(output) + eps)
}

/// `output` rescaled to the RMS of `reference`, same length
pub fn match_loudness_rms(reference: &[f32], output: &[f32], eps: f32) -> Vec<f32> {
    let gain = loudness_gain(reference, output, eps);
    output.iter().map(|s| s * gain).collect()
}

/// In-place variant; returns the applied gain
pub fn apply_loudness_match(reference: &[f32], output: &mut [f32], eps: f32) -> f32 {
    let gain = loudness_gain(reference, output, eps);
    output.iter_mut().for_each(|s| *s *= gain);
    gain
}
