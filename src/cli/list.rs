//! List models command

use anyhow::Result;

use crate::config::HostrConfig;
use crate::model::ModelCategory;
use crate::registry::{CatalogEntry, ModelRegistry};

/// List cataloged models
pub async fn list(
    config: &HostrConfig,
    verbose: bool,
    category: Option<ModelCategory>,
) -> Result<()> {
    let registry = ModelRegistry::with_entries(config.catalog.clone());
    let entries: Vec<&CatalogEntry> = registry
        .entries()
        .filter(|e| category.map_or(true, |c| e.category == c))
        .collect();

    if entries.is_empty() {
        println!("  No models found.");
        println!("\nAdd entries under `catalog:` in the configuration file.");
        return Ok(());
    }

    println!("Cataloged models:\n");

    for entry in entries {
        if verbose {
            print_entry_details(entry, config);
        } else {
            println!("  {} ({})", entry.name, entry.category);
        }
    }

    Ok(())
}

pub(super) fn print_entry_details(entry: &CatalogEntry, config: &HostrConfig) {
    let defaults = &config.models;
    let marker = if entry.name == defaults.generation_model
        || entry.name == defaults.embedding_model
    {
        " [default]"
    } else {
        ""
    };

    println!("  {}{}", entry.name, marker);
    println!("    Name: {}", entry.display_name());
    println!("    Category: {}", entry.category);

    if let Some(size_gb) = entry.size_gb {
        if size_gb >= 1.0 {
            println!("    Size: {:.2} GB", size_gb);
        } else {
            println!("    Size: {:.0} MB", size_gb * 1024.0);
        }
    }
    if let Some(dim) = entry.embedding_dim {
        println!("    Dimension: {}", dim);
    }
    if let Some(generation) = &entry.generation {
        println!("    Max tokens: {}", generation.max_tokens);
        println!("    Temperature: {}", generation.temperature);
    }

    println!();
}
