//! Chunked enhancement of a whole waveform

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::cache;
use crate::chunk::{chunk_count, split_chunks};
use crate::config::EnhanceConfig;
use crate::correction::SpectralCorrector;
use crate::error::{MlError, MlResult};
use crate::loudness::apply_loudness_match;
use crate::spectral::{MelAnalyzer, MelSynthesizer};

/// Mel round-trip enhancer
///
/// Holds the forward/inverse transforms and a shared corrector. Each chunk
/// is independent: analysed, corrected, resynthesised at its own length and
/// level-matched to itself before the chunks are concatenated in order.
pub struct Enhancer {
    config: EnhanceConfig,
    analyzer: MelAnalyzer,
    synthesizer: MelSynthesizer,
    corrector: Arc<dyn SpectralCorrector>,
}

impl Enhancer {
    /// Build with the model at `config.model_path` (shared across enhancers)
    pub fn new(config: EnhanceConfig) -> MlResult<Self> {
        config.validate()?;
        let model = cache::shared_model(&config.model_path, config.device)?;
        Self::with_corrector(config, model)
    }

    /// Build around an arbitrary corrector
    pub fn with_corrector(
        config: EnhanceConfig,
        corrector: Arc<dyn SpectralCorrector>,
    ) -> MlResult<Self> {
        config.validate()?;

        let analyzer = MelAnalyzer::new(config.spectral.clone())?;
        let projection = cache::shared_projection(&config.spectral)?;
        let synthesizer =
            MelSynthesizer::new(config.spectral.clone(), projection, config.phase.clone())?;

        log::debug!(
            "Enhancer ready: {} Hz, n_fft {}, hop {}, {} mels, {} phase rounds, gpu: {}",
            config.spectral.sample_rate,
            config.spectral.n_fft,
            config.spectral.hop_length,
            config.spectral.n_mels,
            config.phase.iterations,
            corrector.is_gpu_accelerated()
        );

        Ok(Self {
            config,
            analyzer,
            synthesizer,
            corrector,
        })
    }

    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    /// Run one chunk through the round trip; output length equals input length
    pub fn process_chunk(&self, samples: &[f32]) -> MlResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let mel_db = self.analyzer.analyze(samples)?;
        let corrected = self.corrector.correct(&mel_db)?;
        if corrected.dim() != mel_db.dim() {
            return Err(MlError::InvalidOutputShape {
                expected: format!("{:?}", mel_db.dim()),
                got: format!("{:?}", corrected.dim()),
            });
        }

        let mut output = self.synthesizer.synthesize(&corrected, samples.len())?;
        apply_loudness_match(samples, &mut output, self.config.loudness_eps);
        Ok(output)
    }

    /// Enhance a mono waveform at the configured sample rate
    pub fn enhance(&self, samples: &[f32], sample_rate: u32) -> MlResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let expected = self.config.spectral.sample_rate;
        if sample_rate != expected {
            return Err(MlError::InvalidSampleRate {
                expected,
                got: sample_rate,
            });
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(MlError::NonFiniteInput { index });
        }

        let segment = self.config.segment_samples();
        let chunks: Vec<_> = split_chunks(samples, segment).collect();
        debug_assert_eq!(chunks.len(), chunk_count(samples.len(), segment));

        let start = Instant::now();
        let processed: Vec<Vec<f32>> = if self.config.parallel && chunks.len() > 1 {
            chunks
                .par_iter()
                .map(|chunk| self.process_chunk(chunk.samples))
                .collect::<MlResult<Vec<_>>>()?
        } else {
            chunks
                .iter()
                .map(|chunk| {
                    log::debug!(
                        "Chunk {}/{} at {:.2}s ({} samples)",
                        chunk.index + 1,
                        chunks.len(),
                        chunk.start_seconds(sample_rate),
                        chunk.len()
                    );
                    self.process_chunk(chunk.samples)
                })
                .collect::<MlResult<Vec<_>>>()?
        };

        let mut output = Vec::with_capacity(samples.len());
        for chunk in processed {
            output.extend_from_slice(&chunk);
        }

        log::info!(
            "Enhanced {:.2}s of audio in {} chunks ({:.1} ms)",
            samples.len() as f64 / sample_rate as f64,
            chunks.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(output)
    }
}
