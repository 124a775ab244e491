//! Configuration system for hostr
//!
//! `HostrConfig` is read from YAML or JSON, then overridden by `HOSTR_*`
//! environment variables and validated before a service is built from it.

mod generation;
mod pool;
mod runtime;

pub use generation::GenerationConfig;
pub use pool::PoolConfig;
pub use runtime::{DeviceConfig, QuantizationConfig, RuntimeConfig};

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::CatalogEntry;

/// Default model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDefaults {
    /// Used when a generation request names no model
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Used when an embedding request names no model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Load both defaults when the service starts
    #[serde(default)]
    pub preload: bool,
}

fn default_generation_model() -> String {
    "microsoft/DialoGPT-medium".to_string()
}

fn default_embedding_model() -> String {
    "emilyalsentzer/Bio_ClinicalBERT".to_string()
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            preload: false,
        }
    }
}

/// hostr configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostrConfig {
    /// Device, quantization and memory policy
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Inference worker pool
    #[serde(default)]
    pub pool: PoolConfig,

    /// Default models
    #[serde(default)]
    pub models: ModelDefaults,

    /// Default generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Extra catalog entries, merged over the built-in catalog
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

impl HostrConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Build the effective configuration: file (if any), then environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.extension().is_some_and(|ext| ext == "json") => {
                Self::from_json(path)?
            }
            Some(path) => Self::from_yaml(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `HOSTR_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        for e in self.apply_env_from(|key| std::env::var(key).ok()) {
            tracing::warn!("Ignoring environment override: {}", e);
        }
    }

    /// Apply `HOSTR_*` overrides from an arbitrary lookup
    ///
    /// A value that fails to parse is skipped and reported; the remaining
    /// overrides still apply.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();

        if let Some(v) = lookup("HOSTR_DEVICE") {
            self.runtime.device = DeviceConfig::Simple(v);
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_FORCE_CPU", &mut errors) {
            self.runtime.force_cpu = v;
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_ENABLE_QUANTIZATION", &mut errors) {
            self.runtime.quantization.enabled = v;
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_QUANTIZATION_BITS", &mut errors) {
            self.runtime.quantization.bits = v;
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_MEMORY_FLOOR_GB", &mut errors) {
            self.runtime.memory_floor_gb = v;
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_GPU_MEMORY_FRACTION", &mut errors) {
            self.runtime.gpu_memory_fraction = v;
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_MAX_MODEL_MEMORY_GB", &mut errors) {
            self.runtime.max_model_memory_gb = v;
        }
        if let Some(v) = lookup("HOSTR_MODEL_CACHE_DIR") {
            self.runtime.model_cache_dir = PathBuf::from(v);
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_WORKERS", &mut errors) {
            self.pool.workers = v;
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_MAX_QUEUED", &mut errors) {
            self.pool.max_queued = Some(v);
        }
        if let Some(v) = lookup("HOSTR_DEFAULT_GENERATION_MODEL") {
            self.models.generation_model = v;
        }
        if let Some(v) = lookup("HOSTR_DEFAULT_EMBEDDING_MODEL") {
            self.models.embedding_model = v;
        }
        if let Some(v) = parse_env(&lookup, "HOSTR_PRELOAD_MODELS", &mut errors) {
            self.models.preload = v;
        }

        errors
    }

    /// Reject settings the service cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bits = self.runtime.quantization.bits;
        if !matches!(bits, 4 | 8 | 16) {
            return Err(ConfigError::InvalidValue {
                field: "runtime.quantization.bits",
                value: bits.to_string(),
                reason: "must be 4, 8 or 16",
            });
        }

        let fraction = self.runtime.gpu_memory_fraction;
        if !(0.1..=1.0).contains(&fraction) {
            return Err(ConfigError::InvalidValue {
                field: "runtime.gpu_memory_fraction",
                value: fraction.to_string(),
                reason: "must be between 0.1 and 1.0",
            });
        }

        if !(self.runtime.memory_floor_gb >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "runtime.memory_floor_gb",
                value: self.runtime.memory_floor_gb.to_string(),
                reason: "must be a non-negative number",
            });
        }

        if self.pool.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool.workers",
                value: "0".to_string(),
                reason: "at least one worker is required",
            });
        }

        if self.generation.temperature < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "generation.temperature",
                value: self.generation.temperature.to_string(),
                reason: "must not be negative",
            });
        }

        if !(self.generation.top_p > 0.0 && self.generation.top_p <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "generation.top_p",
                value: self.generation.top_p.to_string(),
                reason: "must be in (0, 1]",
            });
        }

        if self.models.generation_model.is_empty() || self.models.embedding_model.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "models",
                value: String::new(),
                reason: "default model names must not be empty",
            });
        }

        Ok(())
    }
}

fn parse_env<T, F>(lookup: &F, field: &'static str, errors: &mut Vec<ConfigError>) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(field)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(ConfigError::InvalidValue {
                field,
                value,
                reason: "could not parse environment override",
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::model::ModelCategory;

    #[test]
    fn test_hostr_config_yaml() {
        let yaml = r#"
runtime:
  device: cuda:0
  force_cpu: false
  quantization:
    enabled: true
    bits: 4
  memory_floor_gb: 3.5
  model_cache_dir: /var/cache/hostr

pool:
  workers: 4
  max_queued: 32

models:
  generation_model: mistralai/Mistral-7B-Instruct-v0.1
  preload: true

generation:
  max_tokens: 256
  temperature: 0.2

catalog:
  - name: local/tiny-gpt
    category: llm
    size_gb: 0.3
"#;
        let config: HostrConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.runtime.device.is_cuda());
        assert_eq!(config.runtime.quantization.bits, 4);
        assert_eq!(config.runtime.memory_floor_gb, 3.5);
        assert_eq!(config.pool.workers, 4);
        assert_eq!(config.pool.max_queued, Some(32));
        assert!(config.models.preload);
        assert_eq!(
            config.models.embedding_model,
            "emilyalsentzer/Bio_ClinicalBERT"
        );
        assert_eq!(config.generation.max_tokens, 256);
        assert_eq!(config.generation.top_p, 0.9);
        assert_eq!(config.catalog[0].category, ModelCategory::Generation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_validate() {
        let config = HostrConfig::default();
        assert_eq!(config.pool.workers, 2);
        assert_eq!(config.runtime.memory_floor_gb, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_quantization_bits() {
        let mut config = HostrConfig::default();
        config.runtime.quantization.bits = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("runtime.quantization.bits"));
    }

    #[test]
    fn test_invalid_gpu_fraction() {
        let mut config = HostrConfig::default();
        config.runtime.gpu_memory_fraction = 0.05;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = HostrConfig::default();
        config.pool.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HOSTR_FORCE_CPU", "true"),
            ("HOSTR_QUANTIZATION_BITS", "16"),
            ("HOSTR_WORKERS", "3"),
            ("HOSTR_MAX_QUEUED", "8"),
            ("HOSTR_DEFAULT_GENERATION_MODEL", "local/tiny-gpt"),
        ]
        .into_iter()
        .collect();

        let mut config = HostrConfig::default();
        let errors = config.apply_env_from(|key| vars.get(key).map(|v| v.to_string()));
        assert!(errors.is_empty());

        assert!(config.runtime.force_cpu);
        assert_eq!(config.runtime.quantization.bits, 16);
        assert_eq!(config.pool.workers, 3);
        assert_eq!(config.pool.max_queued, Some(8));
        assert_eq!(config.models.generation_model, "local/tiny-gpt");
    }

    #[test]
    fn test_env_parse_error_keeps_later_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HOSTR_FORCE_CPU", "sometimes"),
            ("HOSTR_WORKERS", "many"),
            ("HOSTR_MAX_QUEUED", "8"),
            ("HOSTR_PRELOAD_MODELS", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = HostrConfig::default();
        let errors = config.apply_env_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[1],
            ConfigError::InvalidValue { field: "HOSTR_WORKERS", .. }
        ));
        assert!(!config.runtime.force_cpu);
        assert_eq!(config.pool.workers, 2);
        assert_eq!(config.pool.max_queued, Some(8));
        assert!(config.models.preload);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"pool": {{"workers": 1}}, "runtime": {{"memory_floor_gb": 0.5}}}}"#
        )
        .unwrap();

        let config = HostrConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.pool.workers, 1);
        assert_eq!(config.runtime.memory_floor_gb, 0.5);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "runtime:\n  gpu_memory_fraction: 2.0").unwrap();
        assert!(HostrConfig::load(Some(file.path())).is_err());
    }
}
