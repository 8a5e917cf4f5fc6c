//! Griffin-Lim phase reconstruction (fast variant with momentum)
//!
//! Alternates ISTFT and STFT, keeping the target magnitude and taking the
//! phase of the re-analysed signal each round. Fewer rounds lower the
//! fidelity but the output is always a valid, finite waveform.

use std::f32::consts::TAU;

use ndarray::{Array2, Zip};
use num_complex::Complex32;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::stft::Stft;
use crate::config::PhaseConfig;
use crate::error::{MlError, MlResult};

/// Magnitude-only → waveform
pub struct GriffinLim {
    stft: Stft,
    config: PhaseConfig,
}

impl GriffinLim {
    pub fn new(n_fft: usize, hop_length: usize, config: PhaseConfig) -> Self {
        Self {
            stft: Stft::new(n_fft, hop_length),
            config,
        }
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    /// Reconstruct `length` samples whose STFT magnitude approximates `magnitude`
    pub fn reconstruct(&self, magnitude: &Array2<f32>, length: usize) -> MlResult<Vec<f32>> {
        let (n_bins, n_frames) = magnitude.dim();
        if n_bins != self.stft.n_bins() {
            return Err(MlError::InvalidInputShape {
                expected: format!("{} frequency bins", self.stft.n_bins()),
                got: format!("{}", n_bins),
            });
        }
        if n_frames == 0 {
            return Ok(vec![0.0; length]);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut angles = Array2::from_shape_simple_fn((n_bins, n_frames), || {
            Complex32::from_polar(1.0, TAU * rng.random::<f32>())
        });

        // Intermediate signals span exactly the frame grid
        let inner_len = self.stft.hop_length() * (n_frames - 1);
        let momentum = self.config.momentum / (1.0 + self.config.momentum);
        let target_norm = frobenius(magnitude);

        let mut rebuilt = Array2::<Complex32>::zeros((n_bins, n_frames));
        let mut last_error: Option<f32> = None;

        for iteration in 0..self.config.iterations {
            let inverse = self.stft.synthesize(&with_magnitude(magnitude, &angles), inner_len)?;
            let previous = std::mem::replace(&mut rebuilt, self.stft.analyze(&inverse, n_frames)?);

            Zip::from(&mut angles)
                .and(&rebuilt)
                .and(&previous)
                .for_each(|angle, &current, &prev| {
                    let v = current - prev * momentum;
                    *angle = v / (v.norm() + 1e-16);
                });

            if let Some(tolerance) = self.config.tolerance {
                let error = spectral_convergence(magnitude, &rebuilt, target_norm);
                if let Some(last) = last_error {
                    if (last - error).abs() < tolerance {
                        log::debug!(
                            "Griffin-Lim converged after {} rounds (error {:.5})",
                            iteration + 1,
                            error
                        );
                        break;
                    }
                }
                last_error = Some(error);
            }
        }

        self.stft.synthesize(&with_magnitude(magnitude, &angles), length)
    }
}

fn with_magnitude(magnitude: &Array2<f32>, angles: &Array2<Complex32>) -> Array2<Complex32> {
    Zip::from(magnitude)
        .and(angles)
        .map_collect(|&m, &a| a * m)
}

fn frobenius(values: &Array2<f32>) -> f32 {
    values.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// ‖ |rebuilt| − target ‖ / ‖ target ‖
fn spectral_convergence(
    target: &Array2<f32>,
    rebuilt: &Array2<Complex32>,
    target_norm: f32,
) -> f32 {
    let diff: f32 = Zip::from(target)
        .and(rebuilt)
        .fold(0.0, |acc, &t, &r| {
            let d = r.norm() - t;
            acc + d * d
        });
    diff.sqrt() / target_norm.max(f32::EPSILON)
}
