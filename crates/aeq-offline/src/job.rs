//! File-to-file enhancement job

use std::path::Path;
use std::time::{Duration, Instant};

use aeq_ml::Enhancer;

use crate::decoder::AudioDecoder;
use crate::encoder::{WavEncoder, WavFormat};
use crate::error::OfflineResult;
use crate::resample::resample;

/// Summary of a finished job
#[derive(Debug, Clone)]
pub struct JobReport {
    pub source_sample_rate: u32,
    pub source_channels: usize,
    /// Mono samples at the pipeline rate
    pub samples: usize,
    pub duration_seconds: f64,
    pub elapsed: Duration,
}

impl JobReport {
    /// Audio seconds processed per wall-clock second
    pub fn realtime_factor(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.duration_seconds / secs } else { f64::INFINITY }
    }
}

/// Decode `input`, enhance it and write mono WAV to `output`
///
/// Multichannel input is averaged to mono and resampled to the enhancer's
/// rate. Parent directories of `output` are created as needed.
pub fn enhance_file(
    input: &Path,
    output: &Path,
    enhancer: &Enhancer,
    format: WavFormat,
) -> OfflineResult<JobReport> {
    let start = Instant::now();
    let target_rate = enhancer.config().spectral.sample_rate;

    let decoded = AudioDecoder::decode(input)?;
    log::info!(
        "Loaded {} ({} Hz, {} ch, {:.2}s)",
        input.display(),
        decoded.sample_rate,
        decoded.channels,
        decoded.duration_seconds()
    );

    let mono = decoded.to_mono();
    let mono = if decoded.sample_rate != target_rate {
        log::info!("Resampling {} Hz -> {} Hz", decoded.sample_rate, target_rate);
        resample(&mono, decoded.sample_rate, target_rate)?
    } else {
        mono
    };

    let enhanced = enhancer.enhance(&mono, target_rate)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    WavEncoder::write(output, &enhanced, target_rate, format)?;

    let report = JobReport {
        source_sample_rate: decoded.sample_rate,
        source_channels: decoded.channels,
        samples: enhanced.len(),
        duration_seconds: enhanced.len() as f64 / target_rate as f64,
        elapsed: start.elapsed(),
    };

    log::info!(
        "Wrote {} ({:.2}s in {:.2}s, {:.1}x realtime)",
        output.display(),
        report.duration_seconds,
        report.elapsed.as_secs_f64(),
        report.realtime_factor()
    );

    Ok(report)
}
