//! Centered short-time Fourier transform with overlap-add inverse

use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::error::{MlError, MlResult};

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}

/// STFT / ISTFT pair sharing one window and hop.
///
/// Frames are centered: frame `t` covers samples
/// `t * hop - n_fft / 2 .. t * hop + n_fft / 2`, with zeros outside the signal.
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    fft_forward: Arc<dyn RealToComplex<f32>>,
    fft_inverse: Arc<dyn ComplexToReal<f32>>,
    window: Vec<f32>,
}

impl Stft {
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let mut planner = RealFftPlanner::new();
        let fft_forward = planner.plan_fft_forward(n_fft);
        let fft_inverse = planner.plan_fft_inverse(n_fft);

        Self {
            n_fft,
            hop_length,
            fft_forward,
            fft_inverse,
            window: hann_window(n_fft),
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Complex spectrum `[n_bins × n_frames]` of `signal`
    pub fn analyze(&self, signal: &[f32], n_frames: usize) -> MlResult<Array2<Complex32>> {
        let n_fft = self.n_fft;
        let pad = (n_fft / 2) as isize;

        let mut spectrum = Array2::<Complex32>::zeros((self.n_bins(), n_frames));
        let mut frame = self.fft_forward.make_input_vec();
        let mut output = self.fft_forward.make_output_vec();
        let mut scratch = self.fft_forward.make_scratch_vec();

        for t in 0..n_frames {
            let start = (t * self.hop_length) as isize - pad;

            for (i, slot) in frame.iter_mut().enumerate() {
                let idx = start + i as isize;
                *slot = if idx >= 0 && (idx as usize) < signal.len() {
                    signal[idx as usize] * self.window[i]
                } else {
                    0.0
                };
            }

            self.fft_forward
                .process_with_scratch(&mut frame, &mut output, &mut scratch)
                .map_err(|e| MlError::ProcessingFailed(format!("FFT failed: {}", e)))?;

            for (dst, &src) in spectrum.column_mut(t).iter_mut().zip(output.iter()) {
                *dst = src;
            }
        }

        Ok(spectrum)
    }

    /// Overlap-add inverse, trimmed of the centre padding and fixed to `length` samples
    pub fn synthesize(&self, spectrum: &Array2<Complex32>, length: usize) -> MlResult<Vec<f32>> {
        let n_fft = self.n_fft;
        let hop = self.hop_length;
        let (n_bins, n_frames) = spectrum.dim();

        if n_bins != self.n_bins() {
            return Err(MlError::InvalidInputShape {
                expected: format!("{} frequency bins", self.n_bins()),
                got: format!("{}", n_bins),
            });
        }
        if n_frames == 0 {
            return Ok(vec![0.0; length]);
        }

        let ola_len = n_fft + hop * (n_frames - 1);
        let mut output = vec![0.0f32; ola_len];
        let mut window_sum = vec![0.0f32; ola_len];

        let mut input_buffer = self.fft_inverse.make_input_vec();
        let mut output_buffer = self.fft_inverse.make_output_vec();
        let mut scratch = self.fft_inverse.make_scratch_vec();
        let norm = 1.0 / n_fft as f32;

        for t in 0..n_frames {
            for (dst, &src) in input_buffer.iter_mut().zip(spectrum.column(t).iter()) {
                *dst = src;
            }
            // DC and Nyquist must be real for a real-valued inverse
            input_buffer[0].im = 0.0;
            input_buffer[n_bins - 1].im = 0.0;

            self.fft_inverse
                .process_with_scratch(&mut input_buffer, &mut output_buffer, &mut scratch)
                .map_err(|e| MlError::ProcessingFailed(format!("IFFT failed: {}", e)))?;

            let start = t * hop;
            for (i, &sample) in output_buffer.iter().enumerate() {
                output[start + i] += sample * norm * self.window[i];
                window_sum[start + i] += self.window[i] * self.window[i];
            }
        }

        for (sample, &sum) in output.iter_mut().zip(window_sum.iter()) {
            if sum > f32::MIN_POSITIVE {
                *sample /= sum;
            }
        }

        let offset = n_fft / 2;
        Ok((0..length)
            .map(|i| output.get(offset + i).copied().unwrap_or(0.0))
            .collect())
    }
}
