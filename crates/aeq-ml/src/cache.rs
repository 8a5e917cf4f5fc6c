//! Process-wide memoization of expensive resources
//!
//! The pseudo-inverse projection costs an SVD and the model costs a file
//! read plus device upload, so each is built at most once per key and then
//! shared. Construction happens under the lock: concurrent first callers
//! wait for the winner instead of racing to build duplicates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use crate::config::{DevicePreference, SpectralParams};
use crate::correction::CorrectionModel;
use crate::error::MlResult;
use crate::inference::ComputeDevice;
use crate::spectral::MelProjection;

type ProjectionKey = (u32, usize, usize);
type ModelKey = (PathBuf, ComputeDevice);

static PROJECTIONS: LazyLock<Mutex<HashMap<ProjectionKey, Arc<MelProjection>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static MODELS: LazyLock<Mutex<HashMap<ModelKey, Arc<CorrectionModel>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Projection for `(sample_rate, n_fft, n_mels)`, computed on first use
pub fn shared_projection(params: &SpectralParams) -> MlResult<Arc<MelProjection>> {
    let key = (params.sample_rate, params.n_fft, params.n_mels);
    let mut projections = PROJECTIONS.lock();

    if let Some(projection) = projections.get(&key) {
        return Ok(Arc::clone(projection));
    }

    log::debug!(
        "Computing mel pseudo-inverse for {} Hz, n_fft {}, {} mels",
        key.0,
        key.1,
        key.2
    );
    let projection = Arc::new(MelProjection::compute(key.0, key.1, key.2)?);
    projections.insert(key, Arc::clone(&projection));
    Ok(projection)
}

/// Model for `(path, resolved device)`, loaded on first use
///
/// A failed load is not cached; the next call retries.
pub fn shared_model(path: &Path, preference: DevicePreference) -> MlResult<Arc<CorrectionModel>> {
    let device = ComputeDevice::resolve(preference)?;
    let key = (path.to_path_buf(), device);
    let mut models = MODELS.lock();

    if let Some(model) = models.get(&key) {
        return Ok(Arc::clone(model));
    }

    let model = Arc::new(CorrectionModel::load(path, device)?);
    models.insert(key, Arc::clone(&model));
    Ok(model)
}

/// Drop every cached projection and model
pub fn clear() {
    PROJECTIONS.lock().clear();
    MODELS.lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> SpectralParams {
        SpectralParams {
            sample_rate: 8000,
            n_fft: 128,
            hop_length: 32,
            n_mels: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_projection_is_shared() {
        let params = small_params();
        let a = shared_projection(&params).unwrap();
        let b = shared_projection(&params).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let other = SpectralParams {
            n_mels: 24,
            ..small_params()
        };
        let c = shared_projection(&other).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.n_mels(), 24);
    }

    #[test]
    fn test_model_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.safetensors");
        let tensors: HashMap<String, candle_core::Tensor> = HashMap::new();
        candle_core::safetensors::save(&tensors, &path).unwrap();

        let a = shared_model(&path, DevicePreference::Cpu).unwrap();
        let b = shared_model(&path, DevicePreference::Cpu).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let path = Path::new("/nonexistent/cache_test.pt");
        assert!(shared_model(path, DevicePreference::Cpu).is_err());
        assert!(!MODELS.lock().contains_key(&(path.to_path_buf(), ComputeDevice::Cpu)));
    }
}
