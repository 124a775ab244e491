//! Runtime configuration: device placement, quantization, memory policy

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::{Device, Quantization};
use crate::system::AcceleratorInfo;

/// Device configuration for inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceConfig {
    /// Simple device string (e.g., "auto", "cuda:0", "cpu")
    Simple(String),
    /// Detailed device configuration
    Detailed {
        /// Device type: "auto", "cuda", "cpu"
        device_type: String,
        /// Device ID (for multi-GPU)
        #[serde(default)]
        device_id: usize,
    },
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig::Simple("auto".to_string())
    }
}

impl DeviceConfig {
    /// Get device type ("auto", "cuda" or "cpu")
    pub fn device_type(&self) -> &str {
        match self {
            DeviceConfig::Simple(s) => {
                if s.starts_with("cuda") {
                    "cuda"
                } else if s == "auto" {
                    "auto"
                } else {
                    "cpu"
                }
            }
            DeviceConfig::Detailed { device_type, .. } => device_type,
        }
    }

    /// Get device ID (for multi-GPU)
    pub fn device_id(&self) -> usize {
        match self {
            DeviceConfig::Simple(s) => s
                .strip_prefix("cuda:")
                .and_then(|id| id.parse().ok())
                .unwrap_or(0),
            DeviceConfig::Detailed { device_id, .. } => *device_id,
        }
    }

    /// Check if CUDA was requested explicitly
    pub fn is_cuda(&self) -> bool {
        self.device_type() == "cuda"
    }
}

/// Quantization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantizationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bit width: 4, 8 or 16
    #[serde(default = "default_bits")]
    pub bits: u8,
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bits: default_bits(),
        }
    }
}

/// Model runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Preferred device
    #[serde(default)]
    pub device: DeviceConfig,

    /// Ignore any accelerator and run on CPU
    #[serde(default)]
    pub force_cpu: bool,

    #[serde(default)]
    pub quantization: QuantizationConfig,

    /// Free system memory (GB) below which a load triggers an eviction pass
    #[serde(default = "default_memory_floor")]
    pub memory_floor_gb: f64,

    /// Share of accelerator memory a loader may claim (0.1 - 1.0)
    #[serde(default = "default_gpu_memory_fraction")]
    pub gpu_memory_fraction: f32,

    /// Memory budget for resident models, reported in status
    #[serde(default = "default_max_model_memory")]
    pub max_model_memory_gb: f64,

    /// Where loaders keep downloaded weights
    #[serde(default = "default_model_cache_dir")]
    pub model_cache_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_bits() -> u8 {
    8
}

fn default_memory_floor() -> f64 {
    2.0
}

fn default_gpu_memory_fraction() -> f32 {
    0.8
}

fn default_max_model_memory() -> f64 {
    8.0
}

fn default_model_cache_dir() -> PathBuf {
    PathBuf::from("./models")
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            force_cpu: false,
            quantization: QuantizationConfig::default(),
            memory_floor_gb: default_memory_floor(),
            gpu_memory_fraction: default_gpu_memory_fraction(),
            max_model_memory_gb: default_max_model_memory(),
            model_cache_dir: default_model_cache_dir(),
        }
    }
}

impl RuntimeConfig {
    /// Pick the device models will be placed on.
    ///
    /// CUDA is only chosen when the monitor reports the requested device.
    pub fn resolve_device(&self, accelerator: &AcceleratorInfo) -> Device {
        if self.force_cpu {
            return Device::Cpu;
        }

        match self.device.device_type() {
            "cuda" | "auto" => {
                let wanted = if self.device.is_cuda() {
                    self.device.device_id()
                } else {
                    0
                };
                if accelerator.has_device(wanted) {
                    Device::Cuda(wanted)
                } else {
                    if self.device.is_cuda() {
                        tracing::warn!("cuda:{} requested but not available, using cpu", wanted);
                    }
                    Device::Cpu
                }
            }
            _ => Device::Cpu,
        }
    }

    /// Quantization applied to loads on `device`; only accelerators quantize
    pub fn effective_quantization(&self, device: Device) -> Quantization {
        if self.quantization.enabled && device.is_accelerator() {
            Quantization::from_bits(self.quantization.bits).unwrap_or_default()
        } else {
            Quantization::None
        }
    }
}
