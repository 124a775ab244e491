//! Runtime capability seam
//!
//! hostr does not run tensors itself. A runtime (llama.cpp, candle, ...)
//! plugs in by implementing:
//! - `ModelLoader`: materializes weights and tokenizer for a `ModelId`
//! - `GenerationModel` / `DecodeSession`: one sampled token per step
//! - `EmbeddingModel`: token-level hidden states
//!
//! Loaded models are wrapped in a `ModelHandle`, one variant per category.

mod tokenizer;

pub use tokenizer::{BoxedTokenizer, TokenizerTrait};

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::RuntimeError;
use crate::model::{Device, ModelCategory, ModelId, Quantization};

/// Sampling parameters passed to the runtime's sampler
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: Option<usize>,
    pub repetition_penalty: f32,
    pub seed: Option<u64>,
}

/// An in-progress decode (prompt already prefilled)
pub trait DecodeSession: Send {
    /// Sample the next token and advance the session by one step
    fn next_token(&mut self) -> Result<u32, RuntimeError>;
}

/// A causal language model
pub trait GenerationModel: Send + Sync {
    fn tokenizer(&self) -> &dyn TokenizerTrait;

    /// Prefill `prompt` and return a session ready to produce tokens
    fn start_session<'a>(
        &'a self,
        prompt: &[u32],
        sampling: &SamplingParams,
    ) -> Result<Box<dyn DecodeSession + 'a>, RuntimeError>;

    /// Release accelerator-side caches. Called once, when the handle is destroyed.
    fn release(&self) {}
}

/// An encoder producing token-level representations
pub trait EmbeddingModel: Send + Sync {
    fn tokenizer(&self) -> &dyn TokenizerTrait;

    /// Width of each token representation
    fn dimension(&self) -> usize;

    /// One row of `dimension()` values per input token
    fn token_states(&self, tokens: &[u32]) -> Result<Vec<Vec<f32>>, RuntimeError>;

    /// Release accelerator-side caches. Called once, when the handle is destroyed.
    fn release(&self) {}
}

/// A loaded model, tagged by category
pub enum ModelHandle {
    Generation(Box<dyn GenerationModel>),
    Representation(Box<dyn EmbeddingModel>),
}

impl ModelHandle {
    pub fn category(&self) -> ModelCategory {
        match self {
            ModelHandle::Generation(_) => ModelCategory::Generation,
            ModelHandle::Representation(_) => ModelCategory::Representation,
        }
    }

    pub fn as_generation(&self) -> Option<&dyn GenerationModel> {
        match self {
            ModelHandle::Generation(model) => Some(model.as_ref()),
            ModelHandle::Representation(_) => None,
        }
    }

    pub fn as_embedding(&self) -> Option<&dyn EmbeddingModel> {
        match self {
            ModelHandle::Representation(model) => Some(model.as_ref()),
            ModelHandle::Generation(_) => None,
        }
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        match self {
            ModelHandle::Generation(model) => model.release(),
            ModelHandle::Representation(model) => model.release(),
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModelHandle::{}", self.category())
    }
}

/// Everything a loader needs to materialize one model
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub model: ModelId,
    pub device: Device,
    pub quantization: Quantization,
    pub cache_dir: PathBuf,
    pub gpu_memory_fraction: f32,
}

/// Loader output
pub struct LoadedModel {
    pub handle: ModelHandle,
    /// Parameter count, when the runtime knows it
    pub parameter_count: Option<u64>,
    /// Bytes actually resident after loading, when the runtime can measure it
    pub resident_bytes: Option<u64>,
}

impl LoadedModel {
    pub fn new(handle: ModelHandle) -> Self {
        Self {
            handle,
            parameter_count: None,
            resident_bytes: None,
        }
    }

    pub fn with_parameter_count(mut self, count: u64) -> Self {
        self.parameter_count = Some(count);
        self
    }

    pub fn with_resident_bytes(mut self, bytes: u64) -> Self {
        self.resident_bytes = Some(bytes);
        self
    }
}

/// Materializes weights and tokenizer. Called on a blocking thread.
pub trait ModelLoader: Send + Sync {
    fn load(&self, request: &LoadRequest) -> Result<LoadedModel, RuntimeError>;
}

/// Category-specific loaders
#[derive(Clone)]
pub struct Loaders {
    generation: Arc<dyn ModelLoader>,
    representation: Arc<dyn ModelLoader>,
}

impl Loaders {
    pub fn new(generation: Arc<dyn ModelLoader>, representation: Arc<dyn ModelLoader>) -> Self {
        Self {
            generation,
            representation,
        }
    }

    /// One loader serving both categories
    pub fn shared(loader: Arc<dyn ModelLoader>) -> Self {
        Self::new(Arc::clone(&loader), loader)
    }

    pub fn for_category(&self, category: ModelCategory) -> Arc<dyn ModelLoader> {
        match category {
            ModelCategory::Generation => Arc::clone(&self.generation),
            ModelCategory::Representation => Arc::clone(&self.representation),
        }
    }
}
