//! Model service facade
//!
//! One `ModelService` owns the resident table, the worker pool and the
//! registry for the life of the process. Build it, `start()` it, and
//! `shutdown()` it explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::Stream;
use serde::Serialize;

use crate::config::HostrConfig;
use crate::engine::{
    Executor, LifecycleManager, LoadOutcome, LoadSettings, PoolStatus, WorkerPool,
};
use crate::error::{HostrError, HostrResult};
use crate::model::{
    Device, EmbeddingRequest, EmbeddingResponse, GenerationEvent, GenerationRequest, GenerationResponse,
    ModelCategory, ModelId, ModelInfo,
};
use crate::registry::ModelRegistry;
use crate::runtime::Loaders;
use crate::system::{AcceleratorInfo, ResourceMonitor, SystemMemory, SystemMonitor};

/// Reply to a load request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadResponse {
    pub success: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evicted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply to an unload request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnloadResponse {
    pub success: bool,
    pub model: String,
}

/// Snapshot of residency and resources
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub ready: bool,
    pub resident_models: Vec<ModelInfo>,
    pub accelerator: AcceleratorInfo,
    pub system_memory: SystemMemory,
    pub default_device: Device,
    pub quantization_enabled: bool,
    pub quantization_bits: u8,
    pub memory_floor_gb: f64,
    pub max_model_memory_gb: f64,
    pub pool: PoolStatus,
}

/// Entry point for loading, unloading and running models
pub struct ModelService {
    config: HostrConfig,
    registry: Arc<ModelRegistry>,
    monitor: Arc<dyn ResourceMonitor>,
    lifecycle: Arc<LifecycleManager>,
    executor: Executor,
    ready: AtomicBool,
}

impl ModelService {
    /// Build a service that monitors the real host
    pub fn new(config: HostrConfig, loaders: Loaders) -> HostrResult<Self> {
        Self::with_monitor(config, loaders, Arc::new(SystemMonitor::new()))
    }

    pub fn with_monitor(
        config: HostrConfig,
        loaders: Loaders,
        monitor: Arc<dyn ResourceMonitor>,
    ) -> HostrResult<Self> {
        config.validate()?;

        let registry = Arc::new(ModelRegistry::with_entries(config.catalog.clone()));
        let settings = LoadSettings::from_config(&config.runtime, &monitor.accelerator_info());
        tracing::info!(
            "Using device: {} (quantization: {})",
            settings.device,
            settings.quantization.label().as_deref().unwrap_or("none")
        );

        let lifecycle = Arc::new(LifecycleManager::new(
            loaders,
            Arc::clone(&monitor),
            Arc::clone(&registry),
            settings,
        ));
        let executor = Executor::new(
            Arc::clone(&lifecycle),
            WorkerPool::from_config(&config.pool),
            Arc::clone(&registry),
            config.generation.clone(),
        );

        Ok(Self {
            config,
            registry,
            monitor,
            lifecycle,
            executor,
            ready: AtomicBool::new(false),
        })
    }

    /// Preload default models if configured, then mark the service ready.
    ///
    /// Preload failures are logged; the service still starts.
    pub async fn start(&self) {
        if self.config.models.preload {
            let defaults = [
                ModelId::generation(self.config.models.generation_model.as_str()),
                ModelId::representation(self.config.models.embedding_model.as_str()),
            ];
            for id in defaults {
                tracing::info!("Preloading default model: {}", id);
                if let Err(e) = self.lifecycle.load(&id, false).await {
                    tracing::warn!("Failed to preload {}: {}", id.name, e);
                }
            }
        }

        self.ready.store(true, Ordering::SeqCst);
        tracing::info!("Model service ready");
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &HostrConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub async fn load_model(
        &self,
        name: &str,
        category: ModelCategory,
        force_reload: bool,
    ) -> LoadResponse {
        let id = ModelId::new(name, category);
        match self.lifecycle.load(&id, force_reload).await {
            Ok(outcome) => LoadResponse {
                success: true,
                model: id.name,
                evicted: match outcome {
                    LoadOutcome::Loaded { evicted } => evicted,
                    LoadOutcome::AlreadyResident => None,
                },
                error: None,
            },
            Err(e) => LoadResponse {
                success: false,
                model: id.name,
                evicted: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn unload_model(&self, name: &str) -> UnloadResponse {
        UnloadResponse {
            success: self.lifecycle.unload(name).await,
            model: name.to_string(),
        }
    }

    fn generation_model<'a>(&'a self, request: &'a GenerationRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or(&self.config.models.generation_model)
    }

    /// Generate text, loading the target model on demand
    ///
    /// Requests with `stream` set belong to `generate_stream`.
    pub async fn generate(&self, request: &GenerationRequest) -> HostrResult<GenerationResponse> {
        let model = self.generation_model(request);
        if request.stream {
            return Err(HostrError::GenerationFailure {
                model: model.to_string(),
                reason: "streaming requested; use generate_stream".to_string(),
            });
        }
        self.executor.generate(model, request).await
    }

    /// Streaming variant of `generate`
    pub fn generate_stream<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> impl Stream<Item = HostrResult<GenerationEvent>> + 'a {
        let model = self.generation_model(request);
        self.executor.generate_stream(model, request)
    }

    /// Embed `text`; `model` defaults to the configured representation model
    pub async fn embed(&self, text: &str, model: Option<&str>) -> HostrResult<EmbeddingResponse> {
        let model = model.unwrap_or(&self.config.models.embedding_model);
        self.executor.embed(model, text).await
    }

    pub async fn embed_request(&self, request: &EmbeddingRequest) -> HostrResult<EmbeddingResponse> {
        self.embed(&request.text, request.model.as_deref()).await
    }

    pub async fn status(&self) -> StatusReport {
        // Accelerator queries shell out, keep them off the async workers
        let monitor = Arc::clone(&self.monitor);
        let (system_memory, accelerator) = tokio::task::spawn_blocking(move || {
            (monitor.system_memory(), monitor.accelerator_info())
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Resource query failed: {}", e);
            (SystemMemory::default(), AcceleratorInfo::Unavailable)
        });

        let settings = self.lifecycle.settings();
        StatusReport {
            ready: self.is_ready(),
            resident_models: self.lifecycle.resident().await,
            accelerator,
            system_memory,
            default_device: settings.device,
            quantization_enabled: self.config.runtime.quantization.enabled,
            quantization_bits: self.config.runtime.quantization.bits,
            memory_floor_gb: settings.memory_floor_gb,
            max_model_memory_gb: self.config.runtime.max_model_memory_gb,
            pool: self.executor.pool().status(),
        }
    }

    /// Stop admitting work and unload every model
    pub async fn shutdown(&self) {
        self.ready.store(false, Ordering::SeqCst);
        self.executor.pool().close();
        let count = self.lifecycle.unload_all().await;
        tracing::info!("Model service stopped ({} model(s) unloaded)", count);
    }
}
