//! Model info command

use anyhow::{anyhow, Result};

use super::list::print_entry_details;
use crate::config::HostrConfig;
use crate::registry::ModelRegistry;

/// Show a catalog entry, with the load settings it would get on this host
pub async fn info(config: &HostrConfig, model: String) -> Result<()> {
    let registry = ModelRegistry::with_entries(config.catalog.clone());
    let entry = registry
        .get(&model)
        .ok_or_else(|| anyhow!("Model not found in catalog: {}", model))?;

    println!("Model: {}\n", model);
    print_entry_details(entry, config);

    let quantization = &config.runtime.quantization;
    println!("Load settings:");
    println!("  Device: {}", config.runtime.device.device_type());
    if quantization.enabled {
        println!("  Quantization: {}bit (accelerator only)", quantization.bits);
    } else {
        println!("  Quantization: disabled");
    }
    println!("  Cache dir: {}", config.runtime.model_cache_dir.display());

    Ok(())
}
