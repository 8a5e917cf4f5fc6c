//! Compute device selection for the correction model
//!
//! Candle runs on CPU everywhere; CUDA and Metal backends exist only when
//! the matching cargo feature is enabled. Auto-detection runs once per
//! process and the result is reused for every model load.

use std::sync::OnceLock;

use candle_core::Device;

use crate::config::DevicePreference;
use crate::error::{MlError, MlResult};

/// Compute device for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputeDevice {
    /// CPU execution
    Cpu,
    /// NVIDIA CUDA (requires `cuda` feature)
    Cuda,
    /// Apple Metal (requires `metal` feature)
    Metal,
}

static DETECTED: OnceLock<ComputeDevice> = OnceLock::new();

impl ComputeDevice {
    /// Check if this device is available on current system
    pub fn is_available(&self) -> bool {
        match self {
            ComputeDevice::Cpu => true,
            ComputeDevice::Cuda => candle_core::utils::cuda_is_available(),
            ComputeDevice::Metal => candle_core::utils::metal_is_available(),
        }
    }

    /// Get priority (higher = preferred)
    pub fn priority(&self) -> u32 {
        match self {
            ComputeDevice::Cuda => 90,
            ComputeDevice::Metal => 85,
            ComputeDevice::Cpu => 10,
        }
    }

    /// Best available device, probed once per process
    pub fn detect() -> ComputeDevice {
        *DETECTED.get_or_init(|| {
            let device = available_devices()
                .into_iter()
                .max_by_key(|d| d.priority())
                .unwrap_or(ComputeDevice::Cpu);
            log::info!("Detected compute device: {:?}", device);
            device
        })
    }

    /// Resolve a preference into a concrete device
    pub fn resolve(preference: DevicePreference) -> MlResult<ComputeDevice> {
        let requested = match preference {
            DevicePreference::Auto => return Ok(Self::detect()),
            DevicePreference::Cpu => ComputeDevice::Cpu,
            DevicePreference::Cuda => ComputeDevice::Cuda,
            DevicePreference::Metal => ComputeDevice::Metal,
        };

        if requested.is_available() {
            Ok(requested)
        } else {
            Err(MlError::GpuNotAvailable {
                reason: format!("{:?} backend not compiled in", requested),
            })
        }
    }

    /// Open the candle device
    pub fn open(&self) -> MlResult<Device> {
        match self {
            ComputeDevice::Cpu => Ok(Device::Cpu),
            ComputeDevice::Cuda => Device::new_cuda(0).map_err(|e| MlError::GpuNotAvailable {
                reason: e.to_string(),
            }),
            ComputeDevice::Metal => Device::new_metal(0).map_err(|e| MlError::GpuNotAvailable {
                reason: e.to_string(),
            }),
        }
    }

    /// Open the device, falling back to CPU if the accelerator fails to initialise
    pub fn open_or_cpu(&self) -> (ComputeDevice, Device) {
        match self.open() {
            Ok(device) => (*self, device),
            Err(e) => {
                log::warn!("{:?} unusable ({}), falling back to CPU", self, e);
                (ComputeDevice::Cpu, Device::Cpu)
            }
        }
    }

    /// Check if this is an accelerator
    pub fn is_gpu(&self) -> bool {
        matches!(self, ComputeDevice::Cuda | ComputeDevice::Metal)
    }
}

/// Get all available compute devices
pub fn available_devices() -> Vec<ComputeDevice> {
    [ComputeDevice::Cuda, ComputeDevice::Metal, ComputeDevice::Cpu]
        .into_iter()
        .filter(|d| d.is_available())
        .collect()
}
