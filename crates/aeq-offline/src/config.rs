//! Job configuration: core settings plus output options

use std::path::Path;

use aeq_ml::EnhanceConfig;
use serde::{Deserialize, Serialize};

use crate::encoder::WavFormat;
use crate::error::{OfflineError, OfflineResult};

/// Everything a file job needs
///
/// Core fields sit at the top level of the JSON file, next to
/// `output_format`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    #[serde(flatten)]
    pub enhance: EnhanceConfig,

    /// WAV sample format of the written file
    pub output_format: WavFormat,
}

impl JobConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> OfflineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| OfflineError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.enhance.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON text
    pub fn from_json_str(text: &str) -> OfflineResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| OfflineError::InvalidConfig(e.to_string()))?;
        config.enhance.validate()?;
        Ok(config)
    }
}
