//! Core inference engine
//!
//! This module provides the inference execution pipeline:
//! - LifecycleManager: owns the resident-model table (load/unload/eviction)
//! - EvictionPolicy: picks a victim when memory runs low
//! - WorkerPool: bounded FIFO execution of compute-heavy work
//! - Executor: generation and embedding against resident models

mod embedding;
mod eviction;
mod executor;
mod lifecycle;
mod pool;

pub use embedding::{mean_pool, PoolingError};
pub use eviction::{EvictionPolicy, LruEviction};
pub use executor::Executor;
pub use lifecycle::{LifecycleManager, LoadOutcome, LoadSettings, ResidentModel};
pub use pool::{PoolError, PoolStatus, WorkerPool};
