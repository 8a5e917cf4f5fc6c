//! `aeq` - enhance an audio file with the AutoEQ correction model

use std::path::PathBuf;

use aeq_ml::{DevicePreference, Enhancer};
use aeq_offline::{JobConfig, WavFormat, enhance_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeviceArg {
    Auto,
    Cpu,
    Cuda,
    Metal,
}

impl From<DeviceArg> for DevicePreference {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Auto => DevicePreference::Auto,
            DeviceArg::Cpu => DevicePreference::Cpu,
            DeviceArg::Cuda => DevicePreference::Cuda,
            DeviceArg::Metal => DevicePreference::Metal,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "aeq")]
#[command(version, about = "Mel-spectral timbre correction for audio files", long_about = None)]
struct Args {
    /// Input audio file (WAV, FLAC, MP3, OGG, AAC, AIFF)
    input: PathBuf,

    /// Output WAV file
    output: PathBuf,

    /// Correction weights (.pt, .pth or .safetensors)
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Compute device for the correction model
    #[arg(long, value_enum)]
    device: Option<DeviceArg>,

    /// Griffin-Lim iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Chunk length in seconds
    #[arg(long)]
    segment_seconds: Option<f32>,

    /// Process chunks in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Write 32-bit float instead of the configured output format
    #[arg(long = "float", default_value_t = false)]
    float: bool,

    /// Debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn build_config(&self) -> Result<JobConfig> {
        let mut job = match &self.config {
            Some(path) => JobConfig::from_json_file(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => JobConfig::default(),
        };

        let config = &mut job.enhance;
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(device) = self.device {
            config.device = device.into();
        }
        if let Some(iterations) = self.iterations {
            config.phase.iterations = iterations;
        }
        if let Some(seconds) = self.segment_seconds {
            config.segment_seconds = seconds;
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.float {
            job.output_format = WavFormat::Float32;
        }

        job.enhance.validate().context("invalid configuration")?;
        Ok(job)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let job = args.build_config()?;
    log::debug!("Configuration: {:?}", job);

    let enhancer = Enhancer::new(job.enhance).context("initialise enhancer")?;
    let report = enhance_file(&args.input, &args.output, &enhancer, job.output_format)
        .with_context(|| format!("enhance {}", args.input.display()))?;

    eprintln!(
        "{} -> {} ({:.2}s, {:.1}x realtime)",
        args.input.display(),
        args.output.display(),
        report.duration_seconds,
        report.realtime_factor()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "aeq",
            "in.wav",
            "out.wav",
            "--device",
            "cpu",
            "--iterations",
            "4",
            "--segment-seconds",
            "2.5",
            "--parallel",
            "--float",
        ]);
        let job = args.build_config().unwrap();
        assert_eq!(job.enhance.device, DevicePreference::Cpu);
        assert_eq!(job.enhance.phase.iterations, 4);
        assert_eq!(job.enhance.segment_seconds, 2.5);
        assert!(job.enhance.parallel);
        assert_eq!(job.output_format, WavFormat::Float32);
    }

    #[test]
    fn test_default_output_is_pcm16() {
        let args = Args::parse_from(["aeq", "in.wav", "out.wav"]);
        assert_eq!(args.build_config().unwrap().output_format, WavFormat::Pcm16);
    }

    #[test]
    fn test_invalid_segment_is_rejected() {
        let args = Args::parse_from(["aeq", "in.wav", "out.wav", "--segment-seconds", "0"]);
        assert!(args.build_config().is_err());
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aeq.json");
        let json = r#"{
            "segment_seconds": 3.0,
            "output_format": "float32",
            "phase": { "iterations": 32 }
        }"#;
        std::fs::write(&path, json).unwrap();

        let args = Args::parse_from([
            "aeq",
            "in.wav",
            "out.wav",
            "--config",
            path.to_str().unwrap(),
            "--iterations",
            "8",
        ]);
        let job = args.build_config().unwrap();
        assert_eq!(job.enhance.segment_seconds, 3.0);
        assert_eq!(job.enhance.phase.iterations, 8);
        assert_eq!(job.output_format, WavFormat::Float32);
    }
}
