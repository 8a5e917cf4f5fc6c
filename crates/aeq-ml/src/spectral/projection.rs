//! Pseudo-inverse of the mel filterbank
//!
//! Maps mel power back to linear-frequency power. The filterbank has far
//! fewer rows than columns, so this is a least-squares approximation and the
//! result may contain small negative values.

use nalgebra::DMatrix;
use ndarray::Array2;

use super::mel::mel_filterbank;
use crate::error::{MlError, MlResult};

/// Relative singular value cutoff (matches LAPACK-style pinv defaults)
const PINV_RCOND: f64 = 1e-15;

/// Immutable `[n_bins × n_mels]` projection matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MelProjection {
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    matrix: Array2<f32>,
}

impl MelProjection {
    /// Compute the Moore-Penrose pseudo-inverse of the f32 mel filterbank
    pub fn compute(sample_rate: u32, n_fft: usize, n_mels: usize) -> MlResult<Self> {
        // Invert exactly the weights the forward transform applies
        let basis = mel_filterbank(sample_rate, n_fft, n_mels).mapv(|w| w as f32 as f64);
        let (rows, cols) = basis.dim();

        let svd = DMatrix::<f64>::from_fn(rows, cols, |r, c| basis[[r, c]]).svd(true, true);
        let cutoff = svd.singular_values.max() * PINV_RCOND;
        let pinv = svd
            .pseudo_inverse(cutoff)
            .map_err(|e| MlError::ProcessingFailed(format!("Pseudo-inverse failed: {}", e)))?;

        let matrix =
            Array2::from_shape_fn((pinv.nrows(), pinv.ncols()), |(r, c)| pinv[(r, c)] as f32);

        Self::from_matrix(matrix, sample_rate, n_fft, n_mels)
    }

    /// Wrap a precomputed matrix, rejecting one whose shape does not fit the parameters
    pub fn from_matrix(
        matrix: Array2<f32>,
        sample_rate: u32,
        n_fft: usize,
        n_mels: usize,
    ) -> MlResult<Self> {
        let expected = (n_fft / 2 + 1, n_mels);
        if matrix.dim() != expected {
            return Err(MlError::InvalidProjection {
                expected: format!("{:?}", expected),
                got: format!("{:?}", matrix.dim()),
            });
        }

        Ok(Self {
            sample_rate,
            n_fft,
            n_mels,
            matrix,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    pub fn matrix(&self) -> &Array2<f32> {
        &self.matrix
    }

    /// Linear power `[n_bins × frames]` from mel power `[n_mels × frames]`
    pub fn apply(&self, mel_power: &Array2<f32>) -> MlResult<Array2<f32>> {
        if mel_power.nrows() != self.n_mels {
            return Err(MlError::InvalidInputShape {
                expected: format!("{} mel bins", self.n_mels),
                got: format!("{}", mel_power.nrows()),
            });
        }
        Ok(self.matrix.dot(mel_power))
    }
}
