//! Waveform → mel dB spectrogram

use ndarray::Array2;

use super::mel::mel_filterbank;
use super::scale::power_to_db;
use super::stft::Stft;
use crate::config::SpectralParams;
use crate::error::MlResult;

/// Forward transform for one chunk
pub struct MelAnalyzer {
    params: SpectralParams,
    stft: Stft,
    /// `[n_mels × n_bins]`
    filterbank: Array2<f32>,
}

impl MelAnalyzer {
    pub fn new(params: SpectralParams) -> MlResult<Self> {
        params.validate()?;

        let stft = Stft::new(params.n_fft, params.hop_length);
        let filterbank =
            mel_filterbank(params.sample_rate, params.n_fft, params.n_mels).mapv(|w| w as f32);

        Ok(Self {
            params,
            stft,
            filterbank,
        })
    }

    pub fn params(&self) -> &SpectralParams {
        &self.params
    }

    pub fn filterbank(&self) -> &Array2<f32> {
        &self.filterbank
    }

    /// Mel power `[n_mels × frames]`
    pub fn mel_power(&self, samples: &[f32]) -> MlResult<Array2<f32>> {
        let n_frames = self.params.frame_count(samples.len());
        let spectrum = self.stft.analyze(samples, n_frames)?;
        let power = spectrum.mapv(|c| c.norm_sqr());
        Ok(self.filterbank.dot(&power))
    }

    /// Mel spectrogram in dB relative to this chunk's peak
    pub fn analyze(&self, samples: &[f32]) -> MlResult<Array2<f32>> {
        let mel = self.mel_power(samples)?;
        Ok(power_to_db(&mel, self.params.amin, self.params.top_db))
    }
}
