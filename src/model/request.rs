//! Request and response types for generation and embedding

use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;

/// A text generation request
///
/// Sampling fields left as `None` fall back to the model's catalog defaults,
/// then to the configured generation defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,

    /// Target model (None = configured default generation model)
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub max_tokens: Option<usize>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub top_p: Option<f32>,

    #[serde(default)]
    pub top_k: Option<usize>,

    #[serde(default)]
    pub repetition_penalty: Option<f32>,

    #[serde(default)]
    pub stop_sequences: Option<Vec<String>>,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Stream tokens as they are produced
    #[serde(default)]
    pub stream: bool,

    /// Cap on prompt + generated tokens
    #[serde(default)]
    pub context_length: Option<usize>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop<S: Into<String>>(mut self, stops: impl IntoIterator<Item = S>) -> Self {
        self.stop_sequences = Some(stops.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_context_length(mut self, context_length: usize) -> Self {
        self.context_length = Some(context_length);
        self
    }

    /// Overlay this request's sampling fields on `base`
    pub fn resolve(&self, base: &GenerationConfig) -> GenerationConfig {
        GenerationConfig {
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.unwrap_or(base.top_p),
            top_k: self.top_k.or(base.top_k),
            repetition_penalty: self.repetition_penalty.unwrap_or(base.repetition_penalty),
            stop_sequences: self
                .stop_sequences
                .clone()
                .unwrap_or_else(|| base.stop_sequences.clone()),
            seed: self.seed.or(base.seed),
        }
    }
}

/// Why generation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    /// `max_tokens` (or the context cap) was reached
    Length,
    /// A stop sequence matched or the model emitted end-of-sequence
    Stop,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Length => "length",
            FinishReason::Stop => "stop",
        }
    }
}

/// Result of a completed generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub id: String,
    pub text: String,
    pub model_used: String,
    pub prompt_tokens: usize,
    pub tokens_generated: usize,
    pub total_tokens: usize,
    pub finish_reason: FinishReason,
    pub generation_time_secs: f64,
    /// Echoed sampling parameters, device and quantization
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A generated token with its decoded text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedToken {
    pub token_id: u32,
    pub text: String,
}

/// Item of a streaming generation
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    Token(GeneratedToken),
    /// Final accounting; always the last event of a successful stream
    Done(GenerationResponse),
}

/// An embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub text: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// A pooled representation vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
    pub model_used: String,
    pub dimension: usize,
    pub tokens: usize,
    pub processing_time_secs: f64,
}
