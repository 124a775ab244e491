//! Model identity and per-request data types.
//!
//! - `ModelId` / `ModelCategory`: the key into the resident table
//! - `Quantization`: weight precision applied at load time
//! - `ModelInfo`: metadata for a resident model
//! - request/response types for generation and embedding

mod info;
mod request;

pub use info::ModelInfo;
pub use request::{
    EmbeddingRequest, EmbeddingResponse, FinishReason, GeneratedToken, GenerationEvent,
    GenerationRequest, GenerationResponse,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a model is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    /// Causal language model used for text generation
    #[serde(alias = "llm")]
    Generation,
    /// Encoder producing representation vectors
    #[serde(alias = "embedding")]
    Representation,
}

impl ModelCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelCategory::Generation => "generation",
            ModelCategory::Representation => "representation",
        }
    }
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generation" | "llm" => Ok(ModelCategory::Generation),
            "representation" | "embedding" => Ok(ModelCategory::Representation),
            other => Err(format!("unknown model category: '{}'", other)),
        }
    }
}

/// A model name plus its category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId {
    pub name: String,
    pub category: ModelCategory,
}

impl ModelId {
    pub fn new(name: impl Into<String>, category: ModelCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }

    pub fn generation(name: impl Into<String>) -> Self {
        Self::new(name, ModelCategory::Generation)
    }

    pub fn representation(name: impl Into<String>) -> Self {
        Self::new(name, ModelCategory::Representation)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}

/// Weight precision requested from the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quantization {
    /// Native precision of the device
    #[default]
    None,
    Int4,
    Int8,
    Float16,
}

impl Quantization {
    /// Map a configured bit width to a quantization mode
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            4 => Some(Quantization::Int4),
            8 => Some(Quantization::Int8),
            16 => Some(Quantization::Float16),
            _ => None,
        }
    }

    pub fn bits(&self) -> Option<u8> {
        match self {
            Quantization::None => None,
            Quantization::Int4 => Some(4),
            Quantization::Int8 => Some(8),
            Quantization::Float16 => Some(16),
        }
    }

    /// Short label, e.g. "8bit"
    pub fn label(&self) -> Option<String> {
        self.bits().map(|b| format!("{}bit", b))
    }

    /// Bytes per parameter used for size estimates.
    ///
    /// Unquantized weights are assumed f16 on an accelerator and f32 on CPU.
    pub fn bytes_per_parameter(&self, on_accelerator: bool) -> f64 {
        match self {
            Quantization::Int4 => 0.5,
            Quantization::Int8 => 1.0,
            Quantization::Float16 => 2.0,
            Quantization::None if on_accelerator => 2.0,
            Quantization::None => 4.0,
        }
    }
}

/// Placement of a model's weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "index")]
pub enum Device {
    Cpu,
    Cuda(usize),
}

impl Device {
    pub fn is_accelerator(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(id) => write!(f, "cuda:{}", id),
        }
    }
}
