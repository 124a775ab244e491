//! Error types for hostr
//!
//! Library code returns typed errors; only the binary collapses them into `anyhow`.

use thiserror::Error;

use crate::engine::PoolError;

/// Result type for service-level operations
pub type HostrResult<T> = Result<T, HostrError>;

/// Failures surfaced to callers of the model service
#[derive(Error, Debug)]
pub enum HostrError {
    /// The loader could not materialize the model. Terminal for the call, never retried.
    #[error("failed to load model '{model}': {source}")]
    ModelLoadFailure {
        model: String,
        #[source]
        source: RuntimeError,
    },

    /// The model is not resident and cannot be made resident for this request
    #[error("model '{model}' is unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// Decoding failed; partial output is discarded
    #[error("generation failed on '{model}': {reason}")]
    GenerationFailure { model: String, reason: String },

    /// Encoding or pooling failed
    #[error("embedding failed on '{model}': {reason}")]
    EmbeddingFailure { model: String, reason: String },

    /// The worker pool refused or lost the task
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HostrError {
    /// Whether the error came from materializing weights rather than from a single request
    pub fn is_load_failure(&self) -> bool {
        matches!(self, HostrError::ModelLoadFailure { .. })
    }
}

/// Errors raised by runtime capabilities (loaders, tokenizers, models)
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("model not found: {0}")]
    NotFound(String),

    #[error("incompatible weights: {0}")]
    Incompatible(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("tokenization failed: {0}")]
    Tokenization(String),

    #[error("forward pass failed: {0}")]
    Forward(String),

    #[error("runtime task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_display_includes_source() {
        let err = HostrError::ModelLoadFailure {
            model: "gpt-mini".to_string(),
            source: RuntimeError::Incompatible("unexpected tensor layout".to_string()),
        };
        assert!(err.is_load_failure());
        assert_eq!(
            err.to_string(),
            "failed to load model 'gpt-mini': incompatible weights: unexpected tensor layout"
        );
    }

    #[test]
    fn test_per_call_failures_are_not_load_failures() {
        let err = HostrError::GenerationFailure {
            model: "gpt-mini".to_string(),
            reason: "nan logits".to_string(),
        };
        assert!(!err.is_load_failure());
    }
}
