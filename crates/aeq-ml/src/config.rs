//! Enhancement configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{MlError, MlResult};

/// Which compute device the correction model should run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Best available accelerator, CPU fallback
    #[default]
    Auto,
    /// Always CPU
    Cpu,
    /// NVIDIA CUDA (requires the `cuda` feature)
    Cuda,
    /// Apple Metal (requires the `metal` feature)
    Metal,
}

/// STFT / mel parameters shared by the forward and inverse transforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralParams {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// FFT size (window length)
    pub n_fft: usize,

    /// Hop between frames
    pub hop_length: usize,

    /// Number of mel bins
    pub n_mels: usize,

    /// Dynamic range kept below the chunk peak, in dB (None = unlimited)
    pub top_db: Option<f32>,

    /// Power floor applied before the logarithm
    pub amin: f32,
}

impl Default for SpectralParams {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            n_fft: defaults::N_FFT,
            hop_length: defaults::HOP_LENGTH,
            n_mels: defaults::N_MELS,
            top_db: Some(80.0),
            amin: 1e-10,
        }
    }
}

impl SpectralParams {
    /// Linear frequency bins per frame
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Frames produced for a signal of `len` samples (centered, tail zero padded)
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len.div_ceil(self.hop_length)
    }

    pub fn validate(&self) -> MlResult<()> {
        if self.sample_rate == 0 {
            return Err(MlError::InvalidConfig("sample_rate must be positive".into()));
        }
        if self.n_fft < 2 || self.n_fft % 2 != 0 {
            return Err(MlError::InvalidConfig(format!(
                "n_fft must be even and >= 2, got {}",
                self.n_fft
            )));
        }
        if self.hop_length == 0 || self.hop_length > self.n_fft {
            return Err(MlError::InvalidConfig(format!(
                "hop_length must be in 1..={}, got {}",
                self.n_fft, self.hop_length
            )));
        }
        if self.n_mels == 0 {
            return Err(MlError::InvalidConfig("n_mels must be positive".into()));
        }
        if !(self.amin > 0.0) {
            return Err(MlError::InvalidConfig("amin must be positive".into()));
        }
        if let Some(top_db) = self.top_db {
            if !(top_db >= 0.0) {
                return Err(MlError::InvalidConfig("top_db must be non-negative".into()));
            }
        }
        Ok(())
    }
}

/// Griffin-Lim phase recovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Refinement rounds
    pub iterations: usize,

    /// Fast Griffin-Lim momentum (0.0 = classic Griffin-Lim)
    pub momentum: f32,

    /// Seed for the random initial phase
    pub seed: u64,

    /// Stop early once spectral convergence improves by less than this
    pub tolerance: Option<f32>,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            iterations: defaults::GRIFFIN_LIM_ITERATIONS,
            momentum: 0.99,
            seed: 0,
            tolerance: None,
        }
    }
}

/// Enhancement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Transform parameters
    pub spectral: SpectralParams,

    /// Phase reconstruction
    pub phase: PhaseConfig,

    /// Chunk duration in seconds
    pub segment_seconds: f32,

    /// Additive floor in the RMS gain ratio
    pub loudness_eps: f32,

    /// Correction weight blob (.pt / .pth / .safetensors)
    pub model_path: PathBuf,

    /// Compute device preference
    pub device: DevicePreference,

    /// Process chunks on the rayon pool
    pub parallel: bool,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            spectral: SpectralParams::default(),
            phase: PhaseConfig::default(),
            segment_seconds: defaults::SEGMENT_SECONDS,
            loudness_eps: 1e-8,
            model_path: PathBuf::from(defaults::MODEL_PATH),
            device: DevicePreference::Auto,
            parallel: false,
        }
    }
}

impl EnhanceConfig {
    /// Fewer phase rounds, chunks in parallel
    pub fn fast() -> Self {
        Self {
            phase: PhaseConfig {
                iterations: 8,
                ..Default::default()
            },
            parallel: num_cpus::get() > 1,
            ..Default::default()
        }
    }

    /// More phase rounds for cleaner transients
    pub fn quality() -> Self {
        Self {
            phase: PhaseConfig {
                iterations: 64,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> MlResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            MlError::InvalidConfig(format!("{}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the weight blob path
    pub fn with_model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.model_path = path.into();
        self
    }

    /// Set the device preference
    pub fn with_device(mut self, device: DevicePreference) -> Self {
        self.device = device;
        self
    }

    /// Samples per chunk at the configured rate
    pub fn segment_samples(&self) -> usize {
        (self.segment_seconds as f64 * self.spectral.sample_rate as f64).round() as usize
    }

    pub fn validate(&self) -> MlResult<()> {
        self.spectral.validate()?;
        if !(self.segment_seconds > 0.0) || self.segment_samples() == 0 {
            return Err(MlError::InvalidConfig(format!(
                "segment_seconds must be positive, got {}",
                self.segment_seconds
            )));
        }
        if !(0.0..1.0).contains(&self.phase.momentum) {
            return Err(MlError::InvalidConfig(format!(
                "momentum must be in [0, 1), got {}",
                self.phase.momentum
            )));
        }
        // Silent chunks divide by this floor
        if !(self.loudness_eps.is_finite() && self.loudness_eps > 0.0) {
            return Err(MlError::InvalidConfig(format!(
                "loudness_eps must be a small positive floor, got {}",
                self.loudness_eps
            )));
        }
        Ok(())
    }
}
