//! hostr - local model lifecycle manager
//!
//! hostr keeps inference models resident in one process and serves
//! generation and embedding requests against them under a shared memory
//! budget.
//!
//! # Architecture
//!
//! - **runtime**: the capability a tensor runtime implements (loader, decode
//!   session, encoder). hostr never touches weights directly.
//! - **engine**: resident-model table, LRU eviction, worker pool, executor
//! - **service**: the `ModelService` facade (load, unload, generate, embed, status)
//! - **system**: memory and accelerator queries
//!
//! # Example
//!
//! ```bash
//! # Resources and the device models would load on
//! hostr status
//!
//! # Cataloged models
//! hostr list --verbose
//!
//! # Effective configuration after HOSTR_* overrides
//! hostr --config hostr.yaml config
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod registry;
pub mod runtime;
pub mod service;
pub mod system;

#[cfg(test)]
mod testing;

// Re-export key types
pub use config::{GenerationConfig, HostrConfig, RuntimeConfig};
pub use engine::{LifecycleManager, WorkerPool};
pub use error::{HostrError, HostrResult, RuntimeError};
pub use model::{GenerationRequest, GenerationResponse, ModelCategory, ModelId};
pub use service::{ModelService, StatusReport};
