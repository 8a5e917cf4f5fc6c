//! Mel-domain residual correction
//!
//! A small same-resolution CNN predicts a delta that is added back to the
//! input spectrogram, so a network with zeroed output weights is exactly the
//! identity.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aeq_ml::{ComputeDevice, CorrectionModel, SpectralCorrector};
//!
//! let model = CorrectionModel::load("models/autoeq_cnn_v1.pt", ComputeDevice::detect())?;
//! let corrected = model.correct(&mel_db)?;
//! ```

mod network;
mod weights;

pub use network::CorrectionModel;
pub use weights::{LoadReport, WeightMap, canonical_name, read_weight_blob};

use ndarray::Array2;

use crate::error::MlResult;

/// Anything that maps a mel dB tile to a corrected tile of identical shape
pub trait SpectralCorrector: Send + Sync {
    /// Correct a `[n_mels × frames]` tile
    fn correct(&self, tile: &Array2<f32>) -> MlResult<Array2<f32>>;

    /// Check if running on an accelerator
    fn is_gpu_accelerated(&self) -> bool {
        false
    }
}
