//! Enhancement Pipeline Integration Tests
//!
//! Runs whole waveforms through the chunked mel round trip.
//! Verifies:
//! - Output length equals input length for any chunking
//! - Dominant frequency survives the round trip
//! - Loudness follows the input chunk by chunk
//! - Input validation (sample rate, NaN/Inf, empty)
//! - Sequential and parallel orchestration agree

use std::sync::Arc;

use aeq_ml::loudness::rms;
use aeq_ml::{
    ComputeDevice, CorrectionModel, EnhanceConfig, Enhancer, MlError, SpectralParams, chunk_count,
};
use approx::assert_relative_eq;
use realfft::RealFftPlanner;

const SAMPLE_RATE: u32 = 44_100;

/// Generate test sine wave
fn generate_sine(samples: usize, freq: f32, sample_rate: u32, amplitude: f32) -> Vec<f32> {
    (0..samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * freq * t).sin() * amplitude
        })
        .collect()
}

/// Check signal has no NaN or Infinity
fn is_valid_signal(signal: &[f32]) -> bool {
    signal.iter().all(|&x| x.is_finite())
}

/// Frequency of the largest FFT bin
fn dominant_frequency(signal: &[f32], sample_rate: u32) -> f32 {
    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(signal.len());
    let mut input = signal.to_vec();
    let mut spectrum = fft.make_output_vec();
    fft.process(&mut input, &mut spectrum).unwrap();

    let (peak_bin, _) = spectrum
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
        .unwrap();
    peak_bin as f32 * sample_rate as f32 / signal.len() as f32
}

fn identity_enhancer(config: EnhanceConfig) -> Enhancer {
    let model = Arc::new(CorrectionModel::identity(ComputeDevice::Cpu).unwrap());
    Enhancer::with_corrector(config, model).unwrap()
}

/// Full-resolution transform, 1 s chunks
fn short_segment_config() -> EnhanceConfig {
    EnhanceConfig {
        segment_seconds: 1.0,
        ..Default::default()
    }
}

/// Reduced transform for tests that only care about orchestration
fn small_config() -> EnhanceConfig {
    EnhanceConfig {
        spectral: SpectralParams {
            sample_rate: 8000,
            n_fft: 256,
            hop_length: 64,
            n_mels: 32,
            ..Default::default()
        },
        segment_seconds: 0.5,
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LENGTH & CHUNKING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_empty_input_returns_empty() {
    let enhancer = identity_enhancer(small_config());
    assert!(enhancer.enhance(&[], 8000).unwrap().is_empty());
}

#[test]
fn test_output_length_equals_input_length() {
    let enhancer = identity_enhancer(small_config());
    let segment = enhancer.config().segment_samples();

    for len in [1, 63, segment - 1, segment, segment + 1, 3 * segment + 17] {
        let input = generate_sine(len, 300.0, 8000, 0.4);
        let output = enhancer.enhance(&input, 8000).unwrap();
        assert_eq!(output.len(), len, "length changed for {} samples", len);
        assert!(is_valid_signal(&output));
    }
}

#[test]
fn test_chunk_count() {
    let config = EnhanceConfig::default();
    let segment = config.segment_samples();
    assert_eq!(segment, 220_500);
    assert_eq!(chunk_count(441_000, segment), 2);
    assert_eq!(chunk_count(441_001, segment), 3);
    assert_eq!(chunk_count(10, segment), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNAL FIDELITY
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_sine_keeps_dominant_frequency() {
    let enhancer = identity_enhancer(short_segment_config());
    let input = generate_sine(SAMPLE_RATE as usize * 2, 440.0, SAMPLE_RATE, 0.5);
    let output = enhancer.enhance(&input, SAMPLE_RATE).unwrap();

    assert_eq!(output.len(), input.len());
    assert!(is_valid_signal(&output));

    let freq = dominant_frequency(&output, SAMPLE_RATE);
    assert!((freq - 440.0).abs() < 40.0, "dominant frequency moved to {} Hz", freq);
}

#[test]
fn test_loudness_follows_each_chunk() {
    let enhancer = identity_enhancer(small_config());
    let segment = enhancer.config().segment_samples();

    let mut input = generate_sine(segment, 500.0, 8000, 0.8);
    input.extend(generate_sine(segment, 700.0, 8000, 0.1));
    let output = enhancer.enhance(&input, 8000).unwrap();

    for (inp, out) in input.chunks(segment).zip(output.chunks(segment)) {
        assert_relative_eq!(rms(out), rms(inp), max_relative = 1e-3);
    }
}

#[test]
fn test_silence_stays_finite() {
    let enhancer = identity_enhancer(small_config());
    let output = enhancer.enhance(&vec![0.0; 6000], 8000).unwrap();
    assert_eq!(output.len(), 6000);
    assert!(is_valid_signal(&output));
    assert!(rms(&output) < 1e-3);
}

#[test]
fn test_zero_loudness_floor_is_rejected() {
    let config = EnhanceConfig {
        loudness_eps: 0.0,
        ..small_config()
    };
    let model = Arc::new(CorrectionModel::identity(ComputeDevice::Cpu).unwrap());
    assert!(matches!(
        Enhancer::with_corrector(config, model),
        Err(MlError::InvalidConfig(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════════════════
// INPUT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_wrong_sample_rate_is_rejected() {
    let enhancer = identity_enhancer(small_config());
    let input = generate_sine(1000, 440.0, 16_000, 0.5);
    assert!(matches!(
        enhancer.enhance(&input, 16_000),
        Err(MlError::InvalidSampleRate {
            expected: 8000,
            got: 16_000
        })
    ));
}

#[test]
fn test_non_finite_input_is_rejected() {
    let enhancer = identity_enhancer(small_config());
    let mut input = generate_sine(1000, 440.0, 8000, 0.5);
    input[321] = f32::NAN;
    assert!(matches!(
        enhancer.enhance(&input, 8000),
        Err(MlError::NonFiniteInput { index: 321 })
    ));

    input[321] = 0.0;
    input[5] = f32::INFINITY;
    assert!(matches!(
        enhancer.enhance(&input, 8000),
        Err(MlError::NonFiniteInput { index: 5 })
    ));
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_parallel_matches_sequential() {
    let sequential = identity_enhancer(small_config());
    let parallel = identity_enhancer(EnhanceConfig {
        parallel: true,
        ..small_config()
    });

    let input: Vec<f32> = generate_sine(4000 * 5 + 123, 350.0, 8000, 0.5)
        .iter()
        .zip(generate_sine(4000 * 5 + 123, 1200.0, 8000, 0.2))
        .map(|(a, b)| a + b)
        .collect();

    let a = sequential.enhance(&input, 8000).unwrap();
    let b = parallel.enhance(&input, 8000).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_enhancement_is_deterministic() {
    let enhancer = identity_enhancer(small_config());
    let input = generate_sine(5000, 640.0, 8000, 0.3);
    assert_eq!(
        enhancer.enhance(&input, 8000).unwrap(),
        enhancer.enhance(&input, 8000).unwrap()
    );
}
