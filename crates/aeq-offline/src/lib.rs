//! AutoEQ file layer
//!
//! Wraps the `aeq-ml` core with audio file I/O:
//! - Decode any symphonia-supported container to f32
//! - Down-mix to mono and resample to the pipeline rate (rubato)
//! - Write the enhanced waveform as mono WAV (hound)
//! - Read job settings from JSON ([`JobConfig`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aeq_ml::{EnhanceConfig, Enhancer};
//! use aeq_offline::{WavFormat, enhance_file};
//!
//! let enhancer = Enhancer::new(EnhanceConfig::default())?;
//! enhance_file("mix.flac".as_ref(), "mix_eq.wav".as_ref(), &enhancer, WavFormat::Pcm16)?;
//! ```

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod job;
pub mod resample;

pub use config::JobConfig;
pub use decoder::{AudioDecoder, DecodedAudio, downmix_to_mono};
pub use encoder::{WavEncoder, WavFormat};
pub use error::{OfflineError, OfflineResult};
pub use job::{JobReport, enhance_file};
pub use resample::resample;
