//! Host status command

use anyhow::Result;
use serde::Serialize;

use crate::config::HostrConfig;
use crate::engine::LoadSettings;
use crate::model::{Device, Quantization};
use crate::system::{AcceleratorInfo, ResourceMonitor, SystemMemory, SystemMonitor};

/// What a service started with this configuration would see
#[derive(Debug, Serialize)]
struct HostStatus {
    system_memory: SystemMemory,
    accelerator: AcceleratorInfo,
    device: Device,
    quantization: Quantization,
    memory_floor_gb: f64,
    max_model_memory_gb: f64,
    workers: usize,
}

/// Show memory, accelerators and the resolved load device
pub async fn status(config: &HostrConfig, json: bool) -> Result<()> {
    let monitor = SystemMonitor::new();
    let (system_memory, accelerator) = tokio::task::spawn_blocking(move || {
        (monitor.system_memory(), monitor.accelerator_info())
    })
    .await?;

    let settings = LoadSettings::from_config(&config.runtime, &accelerator);
    let report = HostStatus {
        system_memory,
        accelerator,
        device: settings.device,
        quantization: settings.quantization,
        memory_floor_gb: settings.memory_floor_gb,
        max_model_memory_gb: config.runtime.max_model_memory_gb,
        workers: config.pool.workers,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let memory = &report.system_memory;
    println!("System memory:");
    println!("  Total: {:.2} GB", memory.total_gb);
    println!(
        "  Available: {:.2} GB (floor {:.2} GB)",
        memory.available_gb, report.memory_floor_gb
    );
    println!("  Used: {:.2} GB ({:.1}%)", memory.used_gb, memory.percent);

    println!("\nAccelerators:");
    match &report.accelerator {
        AcceleratorInfo::Unavailable => println!("  None detected"),
        AcceleratorInfo::Available { devices } => {
            for device in devices {
                println!("  [{}] {}", device.index, device.name);
                println!(
                    "    Memory: {:.2} / {:.2} GB free ({:.1}% in use)",
                    device.free_gb, device.total_gb, device.utilization_percent
                );
            }
        }
    }

    println!("\nLoad settings:");
    println!("  Device: {}", report.device);
    println!(
        "  Quantization: {}",
        report.quantization.label().as_deref().unwrap_or("none")
    );
    println!("  Model memory budget: {:.2} GB", report.max_model_memory_gb);
    println!("  Workers: {}", report.workers);

    if memory.available_gb < report.memory_floor_gb {
        tracing::warn!(
            "Available memory is below the floor; loads will run an eviction pass"
        );
    }

    Ok(())
}
