//! Slaney mel scale and triangular filterbank
//!
//! Weights follow the Auditory Toolbox construction: filter edges are
//! evenly spaced on the Slaney mel scale between 0 Hz and Nyquist, ramps
//! are evaluated at the exact FFT bin frequencies, and every filter is
//! scaled to unit area (`2 / bandwidth`).

use ndarray::Array2;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Hz → Slaney mel (linear below 1 kHz, logarithmic above)
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Slaney mel → Hz
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Mel weighting matrix `[n_mels × (n_fft/2 + 1)]` spanning 0 Hz … sample_rate/2
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f64> {
    let n_bins = n_fft / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;

    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let mel_max = hz_to_mel(nyquist);
    let edges: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut weights = Array2::<f64>::zeros((n_mels, n_bins));

    for m in 0..n_mels {
        let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
        let rise = center - lo;
        let fall = hi - center;
        let area_norm = 2.0 / (hi - lo);

        for (k, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - lo) / rise;
            let upper = (hi - freq) / fall;
            let w = lower.min(upper).max(0.0);
            weights[[m, k]] = w * area_norm;
        }
    }

    weights
}
