//! Accelerator detection
//!
//! Queries `nvidia-smi` for per-device memory. Any failure reports the
//! accelerator as unavailable.

use std::process::Command;

use super::{AcceleratorInfo, DeviceMemory};

const QUERY: &str = "--query-gpu=index,name,memory.total,memory.used,memory.free";

/// Detect available accelerators (best effort)
pub fn detect_accelerators() -> AcceleratorInfo {
    let output = match Command::new("nvidia-smi")
        .args([QUERY, "--format=csv,noheader,nounits"])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("nvidia-smi not available: {}", e);
            return AcceleratorInfo::Unavailable;
        }
    };

    if !output.status.success() {
        tracing::debug!("nvidia-smi exited with {}", output.status);
        return AcceleratorInfo::Unavailable;
    }

    let devices = parse_nvidia_smi(&String::from_utf8_lossy(&output.stdout));
    if devices.is_empty() {
        AcceleratorInfo::Unavailable
    } else {
        AcceleratorInfo::Available { devices }
    }
}

/// Parse `index, name, memory.total, memory.used, memory.free` CSV rows (MiB)
pub fn parse_nvidia_smi(stdout: &str) -> Vec<DeviceMemory> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<DeviceMemory> {
    let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
    if parts.len() < 5 {
        return None;
    }

    let index = parts[0].parse::<usize>().ok()?;
    let name = parts[1].to_string();
    let total_mb = parts[2].parse::<f64>().ok()?;
    let used_mb = parts[3].parse::<f64>().ok()?;
    let free_mb = parts[4].parse::<f64>().ok()?;

    // Reserved covers allocations plus driver overhead
    let reserved_mb = (total_mb - free_mb).max(used_mb);
    let utilization_percent = if total_mb > 0.0 {
        reserved_mb / total_mb * 100.0
    } else {
        0.0
    };

    Some(DeviceMemory {
        index,
        name,
        total_gb: total_mb / 1024.0,
        allocated_gb: used_mb / 1024.0,
        reserved_gb: reserved_mb / 1024.0,
        free_gb: free_mb / 1024.0,
        utilization_percent,
    })
}
