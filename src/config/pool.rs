//! Worker pool configuration settings

use serde::{Deserialize, Serialize};

/// Bounded inference pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of inference tasks allowed to run at once
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum number of callers waiting for a slot (None = unbounded FIFO queue)
    #[serde(default)]
    pub max_queued: Option<usize>,
}

fn default_workers() -> usize {
    2
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_queued: None,
        }
    }
}
