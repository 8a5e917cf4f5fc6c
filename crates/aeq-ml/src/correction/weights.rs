//! Weight blob reading and name normalisation
//!
//! Two export generations exist for the same topology: the current one
//! stores the layer stack under `body.*`, the older one under `net.*`.
//! Names are normalised to `body.*` before binding.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};

use crate::error::{MlError, MlResult};

const CURRENT_PREFIX: &str = "body.";
const LEGACY_PREFIX: &str = "net.";

/// Map a parameter name from either export scheme onto the current one
pub fn canonical_name(name: &str) -> String {
    match name.strip_prefix(LEGACY_PREFIX) {
        Some(rest) => format!("{}{}", CURRENT_PREFIX, rest),
        None => name.to_string(),
    }
}

/// Read every tensor in a `.safetensors` or PyTorch `.pt`/`.pth` file, names normalised
pub fn read_weight_blob(path: &Path) -> MlResult<HashMap<String, Tensor>> {
    if !path.exists() {
        return Err(MlError::ModelNotFound {
            path: path.display().to_string(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let raw: Vec<(String, Tensor)> = match extension.as_deref() {
        Some("safetensors") => candle_core::safetensors::load(path, &Device::Cpu)
            .map_err(|e| MlError::ModelLoadFailed {
                reason: format!("{}: {}", path.display(), e),
            })?
            .into_iter()
            .collect(),
        Some("pt") | Some("pth") | Some("bin") => {
            candle_core::pickle::read_all(path).map_err(|e| MlError::ModelLoadFailed {
                reason: format!("{}: {}", path.display(), e),
            })?
        }
        _ => {
            return Err(MlError::ModelLoadFailed {
                reason: format!("unsupported weight format: {}", path.display()),
            });
        }
    };

    let mut tensors = HashMap::with_capacity(raw.len());
    for (name, tensor) in raw {
        let canonical = canonical_name(&name);
        if canonical != name {
            log::debug!("Renamed legacy parameter {} -> {}", name, canonical);
        }
        tensors.insert(canonical, tensor);
    }

    Ok(tensors)
}

/// Outcome of binding a weight map to the topology
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Parameters taken from the blob
    pub bound: Vec<String>,
    /// Parameters absent from the blob (neutral defaults used)
    pub missing: Vec<String>,
    /// Blob entries the topology has no slot for
    pub unused: Vec<String>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Lenient name → tensor binder
///
/// Missing names fall back to a constant fill; a present tensor whose shape
/// differs from the slot is a hard error.
pub struct WeightMap {
    tensors: HashMap<String, Tensor>,
    device: Device,
    report: LoadReport,
}

impl WeightMap {
    pub fn new(tensors: HashMap<String, Tensor>, device: Device) -> Self {
        let tensors = tensors
            .into_iter()
            .map(|(name, tensor)| (canonical_name(&name), tensor))
            .collect();

        Self {
            tensors,
            device,
            report: LoadReport::default(),
        }
    }

    /// Take `name` with the given shape, or a tensor filled with `fill` if absent
    pub fn take_or_fill(&mut self, name: &str, shape: &[usize], fill: f32) -> MlResult<Tensor> {
        match self.tensors.remove(name) {
            Some(tensor) => {
                if tensor.dims() != shape {
                    return Err(MlError::IncompatibleWeight {
                        name: name.to_string(),
                        expected: format!("{:?}", shape),
                        got: format!("{:?}", tensor.dims()),
                    });
                }
                self.report.bound.push(name.to_string());
                Ok(tensor.to_dtype(DType::F32)?.to_device(&self.device)?)
            }
            None => {
                self.report.missing.push(name.to_string());
                Ok(Tensor::full(fill, shape.to_vec(), &self.device)?)
            }
        }
    }

    /// Finish binding; leftover entries other than BN step counters are reported unused
    pub fn finish(mut self) -> LoadReport {
        let mut unused: Vec<String> = self
            .tensors
            .into_keys()
            .filter(|name| !name.ends_with("num_batches_tracked"))
            .collect();
        unused.sort();
        self.report.unused = unused;
        self.report
    }
}
