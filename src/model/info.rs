//! Metadata for resident models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Device, ModelCategory, Quantization};

/// Snapshot of a resident model's metadata
///
/// Produced by the lifecycle manager on demand; the live counters behind
/// `last_used` and `use_count` keep moving after the snapshot is taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub category: ModelCategory,
    /// Estimated weight size in GB
    pub size_gb: f64,
    pub device: Device,
    pub quantization: Quantization,
    /// Wall-clock time spent in the loader
    pub load_duration_secs: f64,
    pub loaded_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub use_count: u64,
    /// Estimated resident memory in GB
    pub memory_usage_gb: f64,
}
