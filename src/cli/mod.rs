//! CLI commands
//!
//! Inspection commands for the host: resources, catalog and effective
//! configuration. Models are served by embedding `ModelService` with a runtime.

mod config;
mod info;
mod list;
mod status;

pub use config::config;
pub use info::info;
pub use list::list;
pub use status::status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::model::ModelCategory;

/// hostr - local model lifecycle manager
#[derive(Parser)]
#[command(name = "hostr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML, or JSON by extension)
    #[arg(long, short, global = true, env = "HOSTR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show memory, accelerators and the device models would load on
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List cataloged models
    List {
        /// Show detailed information
        #[arg(long, short)]
        verbose: bool,

        /// Only models of this category (generation, representation)
        #[arg(long)]
        category: Option<ModelCategory>,
    },

    /// Show a catalog entry
    Info {
        /// Model name
        model: String,
    },

    /// Print the effective configuration
    Config {
        /// Print as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
}
