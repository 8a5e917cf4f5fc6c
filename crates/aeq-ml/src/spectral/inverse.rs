//! Mel dB spectrogram → waveform

use std::sync::Arc;

use ndarray::Array2;

use super::griffin_lim::GriffinLim;
use super::projection::MelProjection;
use super::scale::db_to_power;
use crate::config::{PhaseConfig, SpectralParams};
use crate::error::{MlError, MlResult};

/// Inverse transform for one chunk
pub struct MelSynthesizer {
    params: SpectralParams,
    projection: Arc<MelProjection>,
    griffin_lim: GriffinLim,
}

impl MelSynthesizer {
    /// Fails if the projection was built for different transform parameters
    pub fn new(
        params: SpectralParams,
        projection: Arc<MelProjection>,
        phase: PhaseConfig,
    ) -> MlResult<Self> {
        params.validate()?;

        let expected = (params.n_bins(), params.n_mels);
        if projection.matrix().dim() != expected
            || projection.sample_rate() != params.sample_rate
            || projection.n_fft() != params.n_fft
        {
            return Err(MlError::InvalidProjection {
                expected: format!(
                    "{:?} for {} Hz / n_fft {}",
                    expected, params.sample_rate, params.n_fft
                ),
                got: format!(
                    "{:?} for {} Hz / n_fft {}",
                    projection.matrix().dim(),
                    projection.sample_rate(),
                    projection.n_fft()
                ),
            });
        }

        let griffin_lim = GriffinLim::new(params.n_fft, params.hop_length, phase);

        Ok(Self {
            params,
            projection,
            griffin_lim,
        })
    }

    pub fn params(&self) -> &SpectralParams {
        &self.params
    }

    /// Linear magnitude `[n_bins × frames]`; pseudo-inverse undershoot is clamped to zero
    pub fn linear_magnitude(&self, mel_db: &Array2<f32>) -> MlResult<Array2<f32>> {
        if mel_db.nrows() != self.params.n_mels {
            return Err(MlError::InvalidInputShape {
                expected: format!("{} mel bins", self.params.n_mels),
                got: format!("{}", mel_db.nrows()),
            });
        }

        let linear_power = self.projection.apply(&db_to_power(mel_db))?;
        Ok(linear_power.mapv(|p| p.max(0.0).sqrt()))
    }

    /// Reconstruct exactly `length` samples
    pub fn synthesize(&self, mel_db: &Array2<f32>, length: usize) -> MlResult<Vec<f32>> {
        let magnitude = self.linear_magnitude(mel_db)?;
        self.griffin_lim.reconstruct(&magnitude, length)
    }
}
