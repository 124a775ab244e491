//! Eviction policy
//!
//! Picks the resident model to drop when a load finds memory below the floor.

use crate::model::ModelInfo;

/// Chooses a residency victim
pub trait EvictionPolicy: Send + Sync {
    /// Name of the model to evict, or None to evict nothing
    fn select_victim(&self, residents: &[ModelInfo]) -> Option<String>;
}

/// Least-recently-used eviction
///
/// Never selects a victim when fewer than two models are resident, so a single
/// large model is not evicted on its own behalf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LruEviction;

impl EvictionPolicy for LruEviction {
    fn select_victim(&self, residents: &[ModelInfo]) -> Option<String> {
        if residents.len() < 2 {
            return None;
        }

        residents
            .iter()
            .min_by(|a, b| {
                a.last_used
                    .cmp(&b.last_used)
                    .then_with(|| a.name.cmp(&b.name))
            })
            .map(|info| info.name.clone())
    }
}
