//! Print the effective configuration

use anyhow::Result;

use crate::config::HostrConfig;

pub async fn config(config: &HostrConfig, json: bool) -> Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(config)?
    } else {
        serde_yaml::to_string(config)?
    };
    println!("{}", rendered);
    Ok(())
}
