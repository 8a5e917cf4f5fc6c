//! Sample rate conversion (rubato sinc interpolation)

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{OfflineError, OfflineResult};

const CHUNK_FRAMES: usize = 1024;

fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Resample mono audio from `from_rate` to `to_rate`
///
/// The filter delay is compensated, so the output is time-aligned with the
/// input and holds `round(len · to_rate / from_rate)` samples.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> OfflineResult<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(OfflineError::SampleRateConversion(format!(
            "invalid rates {} -> {}",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, sinc_params(), CHUNK_FRAMES, 1)
        .map_err(|e| OfflineError::SampleRateConversion(e.to_string()))?;
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected + delay + CHUNK_FRAMES);

    let mut chunks = samples.chunks_exact(CHUNK_FRAMES);
    for chunk in &mut chunks {
        let out = resampler
            .process(std::slice::from_ref(&chunk), None)
            .map_err(|e| OfflineError::SampleRateConversion(e.to_string()))?;
        output.extend_from_slice(&out[0]);
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let out = resampler
            .process_partial(Some(std::slice::from_ref(&remainder)), None)
            .map_err(|e| OfflineError::SampleRateConversion(e.to_string()))?;
        output.extend_from_slice(&out[0]);
    }

    // Flush the filter tail
    while output.len() < expected + delay {
        let out = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| OfflineError::SampleRateConversion(e.to_string()))?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected, 0.0);

    log::debug!(
        "Resampled {} -> {} Hz ({} -> {} samples)",
        from_rate,
        to_rate,
        samples.len(),
        output.len()
    );

    Ok(output)
}
