//! WAV output via hound

use std::io::{Cursor, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OfflineError, OfflineResult};

/// Output sample format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavFormat {
    /// 16-bit integer PCM
    #[default]
    Pcm16,
    /// 32-bit IEEE float
    Float32,
}

impl WavFormat {
    fn spec(self, sample_rate: u32) -> hound::WavSpec {
        match self {
            WavFormat::Pcm16 => hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            WavFormat::Float32 => hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
        }
    }
}

/// Mono WAV writer
pub struct WavEncoder;

impl WavEncoder {
    /// Write `samples` to `path`
    pub fn write(
        path: &Path,
        samples: &[f32],
        sample_rate: u32,
        format: WavFormat,
    ) -> OfflineResult<()> {
        let writer = hound::WavWriter::create(path, format.spec(sample_rate))
            .map_err(|e| OfflineError::WriteError(format!("{}: {}", path.display(), e)))?;
        Self::write_samples(writer, samples, format)
    }

    /// Encode to an in-memory WAV file
    pub fn encode(samples: &[f32], sample_rate: u32, format: WavFormat) -> OfflineResult<Vec<u8>> {
        let mut output = Vec::new();
        let writer = hound::WavWriter::new(Cursor::new(&mut output), format.spec(sample_rate))
            .map_err(|e| OfflineError::WriteError(e.to_string()))?;
        Self::write_samples(writer, samples, format)?;
        Ok(output)
    }

    fn write_samples<W: Write + Seek>(
        mut writer: hound::WavWriter<W>,
        samples: &[f32],
        format: WavFormat,
    ) -> OfflineResult<()> {
        match format {
            WavFormat::Pcm16 => {
                let mut clipped = 0usize;
                for &sample in samples {
                    if sample.abs() > 1.0 {
                        clipped += 1;
                    }
                    let s = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
                    writer
                        .write_sample(s)
                        .map_err(|e| OfflineError::WriteError(e.to_string()))?;
                }
                if clipped > 0 {
                    log::warn!("Clipped {} samples while writing 16-bit PCM", clipped);
                }
            }
            WavFormat::Float32 => {
                for &sample in samples {
                    writer
                        .write_sample(sample)
                        .map_err(|e| OfflineError::WriteError(e.to_string()))?;
                }
            }
        }

        writer
            .finalize()
            .map_err(|e| OfflineError::WriteError(e.to_string()))
    }
}
