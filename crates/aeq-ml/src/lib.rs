//! # AutoEQ spectral enhancement core
//!
//! Timbre correction by round-tripping audio through a mel spectrogram:
//! - Forward transform (centered STFT → mel filterbank → chunk-relative dB)
//! - Residual CNN correction in the mel domain (candle)
//! - Inverse transform (mel pseudo-inverse → Griffin-Lim phase recovery)
//! - RMS loudness matching against the input chunk
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────── Enhancer ────────────────────────────────┐
//! │  waveform ─▶ 5 s chunks ─┬─▶ MelAnalyzer ─▶ CorrectionModel ─▶ MelSynth ─┤
//! │                          │                                       │        │
//! │                          └──────────── loudness match ◀──────────┘        │
//! │  chunks reassembled in original order ─▶ output waveform                 │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pseudo-inverse projection and the loaded model are the only
//! long-lived resources; both are memoized per key in [`cache`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aeq_ml::{EnhanceConfig, Enhancer};
//!
//! let config = EnhanceConfig::default().with_model_path("models/autoeq_cnn_v1.pt");
//! let enhancer = Enhancer::new(config)?;
//! let enhanced = enhancer.enhance(&samples, 44_100)?;
//! ```

pub mod cache;
pub mod correction;
pub mod loudness;
pub mod spectral;

mod chunk;
mod config;
mod error;
mod inference;
mod pipeline;

pub use chunk::{Chunk, ChunkIter, chunk_count, split_chunks};
pub use config::{DevicePreference, EnhanceConfig, PhaseConfig, SpectralParams};
pub use correction::{CorrectionModel, SpectralCorrector};
pub use error::{MlError, MlResult};
pub use inference::ComputeDevice;
pub use pipeline::Enhancer;

/// Parameters the bundled correction model was trained with
pub mod defaults {
    /// Pipeline sample rate
    pub const SAMPLE_RATE: u32 = 44_100;

    /// STFT size
    pub const N_FFT: usize = 2048;

    /// STFT hop (n_fft / 4)
    pub const HOP_LENGTH: usize = 512;

    /// Mel bins
    pub const N_MELS: usize = 128;

    /// Chunk length the model was trained on
    pub const SEGMENT_SECONDS: f32 = 5.0;

    /// Griffin-Lim rounds
    pub const GRIFFIN_LIM_ITERATIONS: usize = 16;

    /// Default weight blob location
    pub const MODEL_PATH: &str = "models/autoeq_cnn_v1.pt";
}
