//! Model lifecycle management
//!
//! Owns the resident-model table. Every load, unload and eviction runs under
//! one process-wide transition guard; inference only takes short read locks on
//! the table, so a cold load never blocks work on models that are already
//! resident.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use super::eviction::{EvictionPolicy, LruEviction};
use crate::config::RuntimeConfig;
use crate::error::{HostrError, HostrResult, RuntimeError};
use crate::model::{Device, ModelCategory, ModelId, ModelInfo, Quantization};
use crate::registry::ModelRegistry;
use crate::runtime::{LoadRequest, Loaders, ModelHandle};
use crate::system::{AcceleratorInfo, ResourceMonitor};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Strictly increasing monotonic ticks (ns since manager start)
struct Clock {
    origin: Instant,
    origin_wall: DateTime<Utc>,
    last: AtomicU64,
}

impl Clock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            origin_wall: Utc::now(),
            last: AtomicU64::new(0),
        }
    }

    fn now(&self) -> u64 {
        let elapsed = self.origin.elapsed().as_nanos() as u64;
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(elapsed.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        elapsed.max(prev + 1)
    }

    fn wall(&self, tick: u64) -> DateTime<Utc> {
        self.origin_wall + chrono::Duration::nanoseconds(tick as i64)
    }
}

/// A model in the resident table
///
/// The table holds the owning reference. In-flight inference tasks hold a
/// lease on it, so an evicted model is released when its last task ends.
#[derive(Debug)]
pub struct ResidentModel {
    name: String,
    handle: ModelHandle,
    device: Device,
    quantization: Quantization,
    size_gb: f64,
    memory_usage_gb: f64,
    load_duration: Duration,
    loaded_at: u64,
    last_used: AtomicU64,
    use_count: AtomicU64,
}

impl ResidentModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    pub fn category(&self) -> ModelCategory {
        self.handle.category()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn quantization(&self) -> Quantization {
        self.quantization
    }

    pub fn use_count(&self) -> u64 {
        self.use_count.load(Ordering::Relaxed)
    }

    fn touch(&self, tick: u64) {
        self.last_used.fetch_max(tick, Ordering::Relaxed);
    }

    fn record_use(&self, tick: u64) {
        self.use_count.fetch_add(1, Ordering::Relaxed);
        self.touch(tick);
    }

    fn info(&self, clock: &Clock) -> ModelInfo {
        ModelInfo {
            name: self.name.clone(),
            category: self.category(),
            size_gb: self.size_gb,
            device: self.device,
            quantization: self.quantization,
            load_duration_secs: self.load_duration.as_secs_f64(),
            loaded_at: clock.wall(self.loaded_at),
            last_used: clock.wall(self.last_used.load(Ordering::Relaxed)),
            use_count: self.use_count(),
            memory_usage_gb: self.memory_usage_gb,
        }
    }
}

/// Settings applied to every load
#[derive(Debug, Clone)]
pub struct LoadSettings {
    /// Available RAM (GB) below which a load runs one eviction pass
    pub memory_floor_gb: f64,
    pub device: Device,
    pub quantization: Quantization,
    pub cache_dir: PathBuf,
    pub gpu_memory_fraction: f32,
}

impl LoadSettings {
    /// Resolve device and quantization against what the monitor reports
    pub fn from_config(runtime: &RuntimeConfig, accelerator: &AcceleratorInfo) -> Self {
        let device = runtime.resolve_device(accelerator);
        Self {
            memory_floor_gb: runtime.memory_floor_gb,
            device,
            quantization: runtime.effective_quantization(device),
            cache_dir: runtime.model_cache_dir.clone(),
            gpu_memory_fraction: runtime.gpu_memory_fraction,
        }
    }
}

/// What a successful `load` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Already resident; only `last_used` was refreshed
    AlreadyResident,
    /// Weights were materialized, possibly after evicting one model
    Loaded { evicted: Option<String> },
}

/// Owner of the resident-model table
pub struct LifecycleManager {
    /// Serializes load/unload/evict across all identifiers
    transitions: Mutex<()>,
    /// Written only while `transitions` is held
    resident: RwLock<HashMap<String, Arc<ResidentModel>>>,
    loaders: Loaders,
    monitor: Arc<dyn ResourceMonitor>,
    policy: Box<dyn EvictionPolicy>,
    registry: Arc<ModelRegistry>,
    settings: LoadSettings,
    clock: Clock,
}

impl LifecycleManager {
    /// Create a manager with LRU eviction
    pub fn new(
        loaders: Loaders,
        monitor: Arc<dyn ResourceMonitor>,
        registry: Arc<ModelRegistry>,
        settings: LoadSettings,
    ) -> Self {
        Self {
            transitions: Mutex::new(()),
            resident: RwLock::new(HashMap::new()),
            loaders,
            monitor,
            policy: Box::new(LruEviction),
            registry,
            settings,
            clock: Clock::new(),
        }
    }

    /// Replace the eviction policy
    pub fn with_policy<P: EvictionPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn settings(&self) -> &LoadSettings {
        &self.settings
    }

    /// Make `id` resident.
    ///
    /// A resident model is left alone unless `force_reload` is set; its
    /// `last_used` is refreshed either way. Loader failures are logged and
    /// returned without retry.
    pub async fn load(&self, id: &ModelId, force_reload: bool) -> HostrResult<LoadOutcome> {
        let _guard = self.transitions.lock().await;
        self.load_locked(id, force_reload)
            .await
            .map(|(outcome, _)| outcome)
    }

    /// Remove `name` from the table. Returns false if it was not resident.
    pub async fn unload(&self, name: &str) -> bool {
        let _guard = self.transitions.lock().await;
        let removed = self.resident.write().await.remove(name);

        match removed {
            Some(model) => {
                tracing::info!("Unloading model: {}", name);
                self.release(model);
                true
            }
            None => {
                tracing::warn!("Model {} not loaded", name);
                false
            }
        }
    }

    /// Resident model for `id`, loading it inline if needed
    pub async fn ensure_loaded(&self, id: &ModelId) -> HostrResult<Arc<ResidentModel>> {
        if let Some(model) = self.get(&id.name).await {
            check_category(&model, id)?;
            return Ok(model);
        }

        tracing::info!("Model {} not loaded, loading now...", id.name);
        let _guard = self.transitions.lock().await;
        match self.load_locked(id, false).await {
            Ok((_, model)) => Ok(model),
            Err(HostrError::ModelLoadFailure {
                model,
                source: RuntimeError::NotFound(what),
            }) => Err(HostrError::ModelUnavailable {
                model,
                reason: format!("loader could not find {}", what),
            }),
            Err(e) => Err(e),
        }
    }

    /// Count a completed inference call against `model`
    pub fn record_use(&self, model: &ResidentModel) {
        model.record_use(self.clock.now());
    }

    pub async fn get(&self, name: &str) -> Option<Arc<ResidentModel>> {
        self.resident.read().await.get(name).cloned()
    }

    pub async fn is_resident(&self, name: &str) -> bool {
        self.resident.read().await.contains_key(name)
    }

    /// Metadata of every resident model, sorted by name
    pub async fn resident(&self) -> Vec<ModelInfo> {
        let mut infos: Vec<ModelInfo> = self
            .resident
            .read()
            .await
            .values()
            .map(|m| m.info(&self.clock))
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Unload everything (shutdown). Returns how many models were dropped.
    pub async fn unload_all(&self) -> usize {
        let _guard = self.transitions.lock().await;
        let drained: Vec<Arc<ResidentModel>> = self
            .resident
            .write()
            .await
            .drain()
            .map(|(_, model)| model)
            .collect();

        let count = drained.len();
        for model in drained {
            tracing::info!("Unloading model: {}", model.name);
            self.release(model);
        }
        count
    }

    async fn load_locked(
        &self,
        id: &ModelId,
        force_reload: bool,
    ) -> HostrResult<(LoadOutcome, Arc<ResidentModel>)> {
        if let Some(cataloged) = self.registry.category_of(&id.name) {
            if cataloged != id.category {
                return Err(HostrError::ModelUnavailable {
                    model: id.name.clone(),
                    reason: format!("cataloged as a {} model, not {}", cataloged, id.category),
                });
            }
        }

        if let Some(existing) = self.get(&id.name).await {
            check_category(&existing, id)?;
            if !force_reload {
                tracing::info!("Model {} already loaded", id.name);
                existing.touch(self.clock.now());
                return Ok((LoadOutcome::AlreadyResident, existing));
            }

            // The old instance stays resident until the new one is in place
            tracing::info!("Force reloading model: {}", id.name);
        }

        let evicted = self.relieve_memory_pressure(&id.name).await;

        let loader = self.loaders.for_category(id.category);
        let request = LoadRequest {
            model: id.clone(),
            device: self.settings.device,
            quantization: self.settings.quantization,
            cache_dir: self.settings.cache_dir.clone(),
            gpu_memory_fraction: self.settings.gpu_memory_fraction,
        };

        tracing::info!(
            "Loading model: {} (category: {}, device: {})",
            id.name,
            id.category,
            self.settings.device
        );
        let started = Instant::now();

        let loaded = tokio::task::spawn_blocking(move || loader.load(&request))
            .await
            .map_err(|e| RuntimeError::TaskFailed(e.to_string()))
            .and_then(|result| result)
            .and_then(|loaded| {
                if loaded.handle.category() == id.category {
                    Ok(loaded)
                } else {
                    Err(RuntimeError::Incompatible(format!(
                        "loader produced a {} model for a {} request",
                        loaded.handle.category(),
                        id.category
                    )))
                }
            })
            .map_err(|source| {
                tracing::error!("Failed to load model {}: {}", id.name, source);
                HostrError::ModelLoadFailure {
                    model: id.name.clone(),
                    source,
                }
            })?;

        let load_duration = started.elapsed();
        let on_accelerator = self.settings.device.is_accelerator();
        let size_gb = match loaded.parameter_count {
            Some(params) => {
                params as f64 * self.settings.quantization.bytes_per_parameter(on_accelerator)
                    / GIB
            }
            None => self
                .registry
                .get(&id.name)
                .and_then(|e| e.size_gb)
                .unwrap_or(0.0),
        };
        let memory_usage_gb = loaded
            .resident_bytes
            .map(|bytes| bytes as f64 / GIB)
            .unwrap_or(size_gb);

        let now = self.clock.now();
        let model = Arc::new(ResidentModel {
            name: id.name.clone(),
            handle: loaded.handle,
            device: self.settings.device,
            quantization: self.settings.quantization,
            size_gb,
            memory_usage_gb,
            load_duration,
            loaded_at: now,
            last_used: AtomicU64::new(now),
            use_count: AtomicU64::new(0),
        });

        let replaced = self
            .resident
            .write()
            .await
            .insert(id.name.clone(), Arc::clone(&model));
        if let Some(old) = replaced {
            self.release(old);
        }

        tracing::info!(
            "Model {} loaded successfully ({:.2}s, {:.2}GB)",
            id.name,
            load_duration.as_secs_f64(),
            size_gb
        );

        Ok((LoadOutcome::Loaded { evicted }, model))
    }

    /// One eviction pass when available memory is under the floor.
    ///
    /// Evicts at most one model and does not re-check until the floor is met;
    /// the load proceeds either way.
    async fn relieve_memory_pressure(&self, loading: &str) -> Option<String> {
        let floor = self.settings.memory_floor_gb;
        let available = self.monitor.available_system_memory_gb();
        if available >= floor {
            return None;
        }

        tracing::warn!(
            "Low memory available ({:.2}GB < {:.2}GB), attempting cleanup...",
            available,
            floor
        );

        // A model being reloaded is not a candidate for its own eviction
        let residents: Vec<ModelInfo> = self
            .resident()
            .await
            .into_iter()
            .filter(|m| m.name != loading)
            .collect();
        let victim = self.policy.select_victim(&residents);
        match &victim {
            Some(name) => {
                let removed = self.resident.write().await.remove(name);
                if let Some(model) = removed {
                    tracing::info!("Evicting least recently used model: {}", name);
                    self.release(model);
                }
            }
            None => tracing::debug!(
                "No eviction candidate among {} resident model(s)",
                residents.len()
            ),
        }

        let after = self.monitor.available_system_memory_gb();
        if after < floor {
            tracing::warn!(
                "Memory still below floor ({:.2}GB < {:.2}GB) after eviction pass, loading {} anyway",
                after,
                floor,
                loading
            );
        }

        victim
    }

    fn release(&self, model: Arc<ResidentModel>) {
        let leases = Arc::strong_count(&model) - 1;
        if leases > 0 {
            tracing::debug!(
                "Model {} still used by {} in-flight task(s); release deferred",
                model.name,
                leases
            );
        }
    }
}

fn check_category(model: &ResidentModel, id: &ModelId) -> HostrResult<()> {
    if model.category() == id.category {
        Ok(())
    } else {
        Err(HostrError::ModelUnavailable {
            model: id.name.clone(),
            reason: format!(
                "resident as a {} model, not {}",
                model.category(),
                id.category
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLoader, FakeMonitor};

    fn settings(floor: f64) -> LoadSettings {
        LoadSettings {
            memory_floor_gb: floor,
            device: Device::Cpu,
            quantization: Quantization::None,
            cache_dir: PathBuf::from("./models"),
            gpu_memory_fraction: 0.8,
        }
    }

    fn manager(loader: &Arc<FakeLoader>, monitor: &Arc<FakeMonitor>) -> LifecycleManager {
        LifecycleManager::new(
            Loaders::shared(loader.clone()),
            monitor.clone(),
            Arc::new(ModelRegistry::builtin()),
            settings(2.0),
        )
    }

    fn names(infos: &[ModelInfo]) -> Vec<&str> {
        infos.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_reload_without_force_keeps_handle_and_touches() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);
        let id = ModelId::generation("A");

        let first = manager.load(&id, false).await.unwrap();
        assert_eq!(first, LoadOutcome::Loaded { evicted: None });
        let handle_before = manager.get("A").await.unwrap();
        let used_before = manager.resident().await[0].last_used;

        let second = manager.load(&id, false).await.unwrap();
        assert_eq!(second, LoadOutcome::AlreadyResident);
        let handle_after = manager.get("A").await.unwrap();

        assert!(Arc::ptr_eq(&handle_before, &handle_after));
        assert!(manager.resident().await[0].last_used > used_before);
        assert_eq!(loader.loads(), 1);
    }

    #[tokio::test]
    async fn test_force_reload_replaces_handle() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);
        let id = ModelId::generation("A");

        manager.load(&id, false).await.unwrap();
        manager.load(&id, true).await.unwrap();

        assert_eq!(loader.loads(), 2);
        assert_eq!(loader.live(), 1);
        assert_eq!(manager.resident().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_force_reload_keeps_old_instance() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);
        let id = ModelId::generation("A");

        manager.load(&id, false).await.unwrap();
        let before = manager.get("A").await.unwrap();

        loader.fail("A");
        let err = manager.load(&id, true).await.unwrap_err();
        assert!(err.is_load_failure());

        let after = manager.get("A").await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(loader.live(), 1);
    }

    #[tokio::test]
    async fn test_force_reload_under_low_memory_spares_itself() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        for name in ["A", "B", "C"] {
            manager.load(&ModelId::generation(name), false).await.unwrap();
        }
        monitor.set_available(1.0);
        let outcome = manager.load(&ModelId::generation("A"), true).await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                evicted: Some("B".to_string())
            }
        );
        assert_eq!(names(&manager.resident().await), vec!["A", "C"]);
        assert_eq!(loader.live(), 2);
    }

    #[tokio::test]
    async fn test_unload_sequence_never_duplicates() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);
        let id = ModelId::generation("A");

        for force in [false, true, false, true] {
            manager.load(&id, force).await.unwrap();
            assert_eq!(loader.live(), 1);
            assert!(manager.unload("A").await);
            assert_eq!(loader.live(), 0);
            assert!(!manager.unload("A").await);
        }
        assert!(manager.resident().await.is_empty());
    }

    #[tokio::test]
    async fn test_unload_unknown_is_noop() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);
        manager.load(&ModelId::generation("A"), false).await.unwrap();

        assert!(!manager.unload("never-loaded").await);
        assert_eq!(names(&manager.resident().await), vec!["A"]);
    }

    #[tokio::test]
    async fn test_low_memory_evicts_exactly_one_lru() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        manager.load(&ModelId::generation("A"), false).await.unwrap();
        manager.load(&ModelId::generation("B"), false).await.unwrap();

        monitor.set_available(1.0);
        let outcome = manager.load(&ModelId::generation("C"), false).await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                evicted: Some("A".to_string())
            }
        );
        assert_eq!(names(&manager.resident().await), vec!["B", "C"]);
        assert_eq!(loader.live(), 2);
    }

    #[tokio::test]
    async fn test_recent_use_protects_from_eviction() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        manager.load(&ModelId::generation("A"), false).await.unwrap();
        manager.load(&ModelId::generation("B"), false).await.unwrap();
        let a = manager.get("A").await.unwrap();
        manager.record_use(&a);

        monitor.set_available(1.0);
        let outcome = manager.load(&ModelId::generation("C"), false).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                evicted: Some("B".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_single_resident_is_not_evicted() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        manager.load(&ModelId::generation("A"), false).await.unwrap();
        monitor.set_available(1.0);
        let outcome = manager.load(&ModelId::generation("B"), false).await.unwrap();

        assert_eq!(outcome, LoadOutcome::Loaded { evicted: None });
        assert_eq!(names(&manager.resident().await), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_eviction_pass_runs_once_per_load() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        for name in ["A", "B", "C"] {
            manager.load(&ModelId::generation(name), false).await.unwrap();
        }

        // Memory stays low; still only one model goes
        monitor.set_available(0.5);
        manager.load(&ModelId::generation("D"), false).await.unwrap();
        assert_eq!(names(&manager.resident().await), vec!["B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_loader_failure_is_terminal() {
        let loader = FakeLoader::new();
        loader.fail("broken");
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        manager.load(&ModelId::generation("A"), false).await.unwrap();
        let err = manager
            .load(&ModelId::generation("broken"), false)
            .await
            .unwrap_err();

        assert!(err.is_load_failure());
        assert_eq!(loader.loads(), 1);
        assert_eq!(names(&manager.resident().await), vec!["A"]);
    }

    #[tokio::test]
    async fn test_ensure_loaded_maps_not_found_to_unavailable() {
        let loader = FakeLoader::new();
        loader.missing("ghost");
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        let err = manager
            .ensure_loaded(&ModelId::generation("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, HostrError::ModelUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_category_conflicts_are_unavailable() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        manager
            .load(&ModelId::representation("encoder"), false)
            .await
            .unwrap();
        let err = manager
            .ensure_loaded(&ModelId::generation("encoder"))
            .await
            .unwrap_err();
        assert!(matches!(err, HostrError::ModelUnavailable { .. }));

        // Catalog says Bio_ClinicalBERT is a representation model
        let err = manager
            .load(&ModelId::generation("emilyalsentzer/Bio_ClinicalBERT"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, HostrError::ModelUnavailable { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cold_requests_load_once() {
        let loader = FakeLoader::new();
        loader.set_load_delay(Duration::from_millis(30));
        let monitor = FakeMonitor::with_available(32.0);
        let manager = Arc::new(manager(&loader, &monitor));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.ensure_loaded(&ModelId::generation("A")).await
            }));
        }

        let mut models = Vec::new();
        for handle in handles {
            models.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(loader.loads(), 1);
        assert_eq!(loader.live(), 1);
        assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_evicted_model_in_use_is_released_after_lease() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);

        manager.load(&ModelId::generation("A"), false).await.unwrap();
        manager.load(&ModelId::generation("B"), false).await.unwrap();
        let lease = manager.ensure_loaded(&ModelId::generation("A")).await.unwrap();

        monitor.set_available(1.0);
        manager.load(&ModelId::generation("C"), false).await.unwrap();

        assert!(!manager.is_resident("A").await);
        assert_eq!(loader.live(), 3);
        drop(lease);
        assert_eq!(loader.live(), 2);
    }

    #[tokio::test]
    async fn test_usage_counters() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);
        manager.load(&ModelId::generation("A"), false).await.unwrap();

        let model = manager.get("A").await.unwrap();
        let mut last = manager.resident().await[0].last_used;
        for expected in 1..=3 {
            manager.record_use(&model);
            let infos = manager.resident().await;
            let info = &infos[0];
            assert_eq!(info.use_count, expected);
            assert!(info.last_used > last);
            last = info.last_used;
        }
    }

    #[tokio::test]
    async fn test_unload_all() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);
        manager.load(&ModelId::generation("A"), false).await.unwrap();
        manager
            .load(&ModelId::representation("E"), false)
            .await
            .unwrap();

        assert_eq!(manager.unload_all().await, 2);
        assert_eq!(loader.live(), 0);
        assert!(manager.resident().await.is_empty());
    }

    #[tokio::test]
    async fn test_size_estimate_from_parameter_count() {
        let loader = FakeLoader::new();
        let monitor = FakeMonitor::with_available(32.0);
        let manager = manager(&loader, &monitor);
        manager.load(&ModelId::generation("A"), false).await.unwrap();

        let infos = manager.resident().await;
        let info = &infos[0];
        // 5e8 params at 4 bytes on CPU
        let expected = 500_000_000.0 * 4.0 / GIB;
        assert!((info.size_gb - expected).abs() < 1e-9);
        assert_eq!(info.memory_usage_gb, info.size_gb);
        assert_eq!(info.device, Device::Cpu);
    }
}
