//! Residual CNN over mel dB tiles
//!
//! ## Topology
//! ```text
//! x ─┬─ conv3x3(1→16) → BN → ReLU                 body.0 / body.1
//!    │  conv3x3(16→16) → BN → ReLU                body.3 / body.4
//!    │  conv3x3(16→16) → BN → ReLU                body.6 / body.7
//!    │  conv1x1(16→1)                             body.9
//!    └──────────────────────────────── + ──▶ y
//! ```
//! Stride 1 and "same" padding everywhere, so any `[H × W]` tile maps to an
//! `[H × W]` tile.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Module, ModuleT, Tensor};
use candle_nn::{BatchNorm, Conv2d, Conv2dConfig};
use ndarray::Array2;

use super::SpectralCorrector;
use super::weights::{LoadReport, WeightMap, read_weight_blob};
use crate::error::{MlError, MlResult};
use crate::inference::ComputeDevice;

const HIDDEN_CHANNELS: usize = 16;
const BN_EPS: f64 = 1e-5;

/// (conv index, norm index, in channels) per block
const BLOCKS: [(usize, usize, usize); 3] =
    [(0, 1, 1), (3, 4, HIDDEN_CHANNELS), (6, 7, HIDDEN_CHANNELS)];
const PROJECTION_INDEX: usize = 9;

struct ConvBlock {
    conv: Conv2d,
    norm: BatchNorm,
}

impl ConvBlock {
    fn bind(
        weights: &mut WeightMap,
        conv_index: usize,
        norm_index: usize,
        in_channels: usize,
    ) -> MlResult<Self> {
        let conv_weight = weights.take_or_fill(
            &format!("body.{}.weight", conv_index),
            &[HIDDEN_CHANNELS, in_channels, 3, 3],
            0.0,
        )?;
        let conv_bias =
            weights.take_or_fill(&format!("body.{}.bias", conv_index), &[HIDDEN_CHANNELS], 0.0)?;
        let conv = Conv2d::new(
            conv_weight,
            Some(conv_bias),
            Conv2dConfig {
                padding: 1,
                ..Default::default()
            },
        );

        let prefix = format!("body.{}", norm_index);
        let running_mean =
            weights.take_or_fill(&format!("{}.running_mean", prefix), &[HIDDEN_CHANNELS], 0.0)?;
        let running_var =
            weights.take_or_fill(&format!("{}.running_var", prefix), &[HIDDEN_CHANNELS], 1.0)?;
        let gamma = weights.take_or_fill(&format!("{}.weight", prefix), &[HIDDEN_CHANNELS], 1.0)?;
        let beta = weights.take_or_fill(&format!("{}.bias", prefix), &[HIDDEN_CHANNELS], 0.0)?;
        let norm = BatchNorm::new(HIDDEN_CHANNELS, running_mean, running_var, gamma, beta, BN_EPS)?;

        Ok(Self { conv, norm })
    }

    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.conv.forward(x)?;
        // Inference mode: running statistics only
        let x = self.norm.forward_t(&x, false)?;
        x.relu()
    }
}

/// Loaded correction network, bound to one device for its whole lifetime
pub struct CorrectionModel {
    blocks: Vec<ConvBlock>,
    projection: Conv2d,
    device: Device,
    compute_device: ComputeDevice,
    source: Option<PathBuf>,
    report: LoadReport,
}

impl CorrectionModel {
    /// Load weights from a blob; the accelerator falls back to CPU if it cannot be opened
    pub fn load<P: AsRef<Path>>(path: P, device: ComputeDevice) -> MlResult<Self> {
        let path = path.as_ref();
        let tensors = read_weight_blob(path)?;

        let mut model = Self::from_tensors(tensors, device)?;
        model.source = Some(path.to_path_buf());

        log::info!(
            "Loaded correction model {} on {:?} ({} bound, {} missing, {} unused)",
            path.display(),
            model.compute_device,
            model.report.bound.len(),
            model.report.missing.len(),
            model.report.unused.len()
        );

        Ok(model)
    }

    /// Bind an in-memory parameter set (either naming scheme)
    pub fn from_tensors(tensors: HashMap<String, Tensor>, device: ComputeDevice) -> MlResult<Self> {
        let (compute_device, device) = device.open_or_cpu();
        let mut weights = WeightMap::new(tensors, device.clone());

        let blocks = BLOCKS
            .iter()
            .map(|&(conv, norm, in_channels)| {
                ConvBlock::bind(&mut weights, conv, norm, in_channels)
            })
            .collect::<MlResult<Vec<_>>>()?;

        let projection_weight = weights.take_or_fill(
            &format!("body.{}.weight", PROJECTION_INDEX),
            &[1, HIDDEN_CHANNELS, 1, 1],
            0.0,
        )?;
        let projection_bias =
            weights.take_or_fill(&format!("body.{}.bias", PROJECTION_INDEX), &[1], 0.0)?;
        let projection =
            Conv2d::new(projection_weight, Some(projection_bias), Conv2dConfig::default());

        let report = weights.finish();
        if !report.missing.is_empty() {
            log::warn!(
                "Correction model missing {} parameters, using neutral defaults: {:?}",
                report.missing.len(),
                report.missing
            );
        }
        for name in &report.unused {
            log::debug!("Ignoring unknown parameter {}", name);
        }

        Ok(Self {
            blocks,
            projection,
            device,
            compute_device,
            source: None,
            report,
        })
    }

    /// All-neutral network: output equals input
    pub fn identity(device: ComputeDevice) -> MlResult<Self> {
        Self::from_tensors(HashMap::new(), device)
    }

    /// Forward pass on `[batch, 1, H, W]`
    pub fn forward(&self, x: &Tensor) -> MlResult<Tensor> {
        let mut h = x.clone();
        for block in &self.blocks {
            h = block.forward(&h)?;
        }
        let residual = self.projection.forward(&h)?;
        Ok(x.add(&residual)?)
    }

    pub fn device(&self) -> ComputeDevice {
        self.compute_device
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }
}

impl SpectralCorrector for CorrectionModel {
    fn correct(&self, tile: &Array2<f32>) -> MlResult<Array2<f32>> {
        let (height, width) = tile.dim();
        if height == 0 || width == 0 {
            return Ok(tile.clone());
        }

        let data: Vec<f32> = tile.iter().copied().collect();
        let input = Tensor::from_vec(data, (1, 1, height, width), &self.device)?;
        let output = self.forward(&input)?;

        let dims = output.dims().to_vec();
        if dims != [1, 1, height, width] {
            return Err(MlError::InvalidOutputShape {
                expected: format!("{:?}", [1, 1, height, width]),
                got: format!("{:?}", dims),
            });
        }

        let values = output.flatten_all()?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
        Array2::from_shape_vec((height, width), values).map_err(|e| MlError::InferenceFailed {
            reason: format!("Shape conversion failed: {}", e),
        })
    }

    fn is_gpu_accelerated(&self) -> bool {
        self.compute_device.is_gpu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    fn random_tensors(seed: u64) -> HashMap<String, Tensor> {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut random = |shape: &[usize], scale: f32| {
            let n: usize = shape.iter().product();
            let values: Vec<f32> = (0..n).map(|_| (rng.random::<f32>() - 0.5) * scale).collect();
            Tensor::from_vec(values, shape.to_vec(), &Device::Cpu).unwrap()
        };

        let mut tensors = HashMap::new();
        for &(conv, norm, in_channels) in BLOCKS.iter() {
            tensors.insert(format!("body.{}.weight", conv), random(&[16, in_channels, 3, 3], 0.5));
            tensors.insert(format!("body.{}.bias", conv), random(&[16], 0.1));
            tensors.insert(
                format!("body.{}.weight", norm),
                random(&[16], 0.2).affine(1.0, 1.0).unwrap(),
            );
            tensors.insert(format!("body.{}.bias", norm), random(&[16], 0.1));
            tensors.insert(format!("body.{}.running_mean", norm), random(&[16], 0.1));
            tensors.insert(
                format!("body.{}.running_var", norm),
                random(&[16], 0.2).affine(1.0, 1.0).unwrap(),
            );
        }
        tensors.insert("body.9.weight".into(), random(&[1, 16, 1, 1], 0.5));
        tensors.insert("body.9.bias".into(), random(&[1], 0.1));
        tensors
    }

    fn tile(height: usize, width: usize) -> Array2<f32> {
        Array2::from_shape_fn((height, width), |(r, c)| -(((r * 7 + c * 3) % 80) as f32))
    }

    #[test]
    fn test_shape_invariance() {
        let model = CorrectionModel::from_tensors(random_tensors(1), ComputeDevice::Cpu).unwrap();
        for (h, w) in [(128, 432), (128, 1), (1, 1), (7, 13), (64, 3)] {
            let out = model.correct(&tile(h, w)).unwrap();
            assert_eq!(out.dim(), (h, w));
        }
    }

    #[test]
    fn test_zero_residual_is_identity() {
        let mut tensors = random_tensors(2);
        let zero_weight = Tensor::zeros((1, 16, 1, 1), DType::F32, &Device::Cpu).unwrap();
        tensors.insert("body.9.weight".into(), zero_weight);
        tensors.insert("body.9.bias".into(), Tensor::zeros(1, DType::F32, &Device::Cpu).unwrap());

        let model = CorrectionModel::from_tensors(tensors, ComputeDevice::Cpu).unwrap();
        let input = tile(128, 40);
        assert_eq!(model.correct(&input).unwrap(), input);
    }

    #[test]
    fn test_identity_model() {
        let model = CorrectionModel::identity(ComputeDevice::Cpu).unwrap();
        let input = tile(32, 17);
        assert_eq!(model.correct(&input).unwrap(), input);
        assert_eq!(model.load_report().bound.len(), 0);
        assert!(!model.is_gpu_accelerated());
    }

    #[test]
    fn test_trained_weights_change_output() {
        let model = CorrectionModel::from_tensors(random_tensors(3), ComputeDevice::Cpu).unwrap();
        let input = tile(16, 16);
        let out = model.correct(&input).unwrap();
        assert_ne!(out, input);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_legacy_names_bind_identically() {
        let current = random_tensors(4);
        let legacy: HashMap<String, Tensor> = current
            .iter()
            .map(|(k, v)| (k.replacen("body.", "net.", 1), v.clone()))
            .collect();

        let a = CorrectionModel::from_tensors(current, ComputeDevice::Cpu).unwrap();
        let b = CorrectionModel::from_tensors(legacy, ComputeDevice::Cpu).unwrap();
        assert!(b.load_report().is_complete());

        let input = tile(24, 9);
        assert_eq!(a.correct(&input).unwrap(), b.correct(&input).unwrap());
    }

    #[test]
    fn test_partial_load() {
        let mut tensors = random_tensors(5);
        tensors.remove("body.4.running_var");
        tensors.remove("body.9.bias");

        let model = CorrectionModel::from_tensors(tensors, ComputeDevice::Cpu).unwrap();
        let report = model.load_report();
        assert_eq!(report.missing.len(), 2);
        assert!(report.missing.contains(&"body.9.bias".to_string()));
        assert_eq!(model.correct(&tile(8, 8)).unwrap().dim(), (8, 8));
    }

    #[test]
    fn test_incompatible_shape_fails() {
        let mut tensors = random_tensors(6);
        tensors.insert(
            "body.3.weight".into(),
            Tensor::zeros((16, 8, 3, 3), DType::F32, &Device::Cpu).unwrap(),
        );
        let result = CorrectionModel::from_tensors(tensors, ComputeDevice::Cpu);
        assert!(matches!(result, Err(MlError::IncompatibleWeight { .. })));
    }

    #[test]
    fn test_load_safetensors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autoeq.safetensors");
        let tensors = random_tensors(7);
        candle_core::safetensors::save(&tensors, &path).unwrap();

        let from_file = CorrectionModel::load(&path, ComputeDevice::Cpu).unwrap();
        let in_memory = CorrectionModel::from_tensors(tensors, ComputeDevice::Cpu).unwrap();
        assert_eq!(from_file.source(), Some(path.as_path()));

        let input = tile(12, 20);
        assert_eq!(from_file.correct(&input).unwrap(), in_memory.correct(&input).unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let result = CorrectionModel::load("/nonexistent/autoeq_cnn_v1.pt", ComputeDevice::Cpu);
        assert!(matches!(result, Err(MlError::ModelNotFound { .. })));
    }
}
