//! System resource monitoring
//!
//! Read-only queries over system RAM and accelerator memory. The lifecycle
//! manager consults a `ResourceMonitor` before every load; status reports
//! expose the same numbers.

mod gpu;
mod memory;

pub use gpu::{detect_accelerators, parse_nvidia_smi};
pub use memory::system_memory;

use serde::{Deserialize, Serialize};

/// System RAM snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMemory {
    pub total_gb: f64,
    pub available_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
}

/// Memory of one accelerator device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMemory {
    pub index: usize,
    pub name: String,
    pub total_gb: f64,
    pub allocated_gb: f64,
    pub reserved_gb: f64,
    pub free_gb: f64,
    pub utilization_percent: f64,
}

/// Accelerator state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AcceleratorInfo {
    /// No accelerator present, or it could not be queried
    Unavailable,
    Available { devices: Vec<DeviceMemory> },
}

impl AcceleratorInfo {
    pub fn is_available(&self) -> bool {
        matches!(self, AcceleratorInfo::Available { devices } if !devices.is_empty())
    }

    pub fn has_device(&self, index: usize) -> bool {
        self.device(index).is_some()
    }

    pub fn device(&self, index: usize) -> Option<&DeviceMemory> {
        match self {
            AcceleratorInfo::Available { devices } => devices.iter().find(|d| d.index == index),
            AcceleratorInfo::Unavailable => None,
        }
    }
}

/// Pure query interface over memory resources
pub trait ResourceMonitor: Send + Sync {
    /// Full RAM snapshot
    fn system_memory(&self) -> SystemMemory;

    /// Per-device accelerator memory, or `Unavailable`
    fn accelerator_info(&self) -> AcceleratorInfo;

    /// Available RAM in GB
    fn available_system_memory_gb(&self) -> f64 {
        self.system_memory().available_gb
    }
}

/// Production monitor backed by `sysinfo` and `nvidia-smi`
#[derive(Debug, Clone, Default)]
pub struct SystemMonitor;

impl SystemMonitor {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceMonitor for SystemMonitor {
    fn system_memory(&self) -> SystemMemory {
        system_memory()
    }

    fn accelerator_info(&self) -> AcceleratorInfo {
        detect_accelerators()
    }
}
