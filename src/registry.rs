//! Static model catalog
//!
//! Maps model names to their category and default parameters. Models that are
//! not in the catalog can still be loaded when the caller states the category.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::model::ModelCategory;

/// A catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Identifier handed to the loader (e.g. a HuggingFace repo id)
    pub name: String,

    pub category: ModelCategory,

    /// Human-readable name
    #[serde(default)]
    pub display_name: Option<String>,

    /// Approximate weight size in GB, used when the loader reports no parameter count
    #[serde(default)]
    pub size_gb: Option<f64>,

    /// Sampling defaults for this model (generation models only)
    #[serde(default)]
    pub generation: Option<GenerationConfig>,

    /// Output dimension (representation models only)
    #[serde(default)]
    pub embedding_dim: Option<usize>,
}

impl CatalogEntry {
    fn builtin(
        name: &str,
        display_name: &str,
        category: ModelCategory,
        size_gb: f64,
        embedding_dim: Option<usize>,
    ) -> Self {
        Self {
            name: name.to_string(),
            category,
            display_name: Some(display_name.to_string()),
            size_gb: Some(size_gb),
            generation: None,
            embedding_dim,
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Model catalog
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: BTreeMap<String, CatalogEntry>,
}

impl ModelRegistry {
    /// An empty catalog
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in catalog
    pub fn builtin() -> Self {
        use ModelCategory::{Generation, Representation};

        let mut registry = Self::empty();
        for entry in [
            CatalogEntry::builtin(
                "microsoft/DialoGPT-medium",
                "DialoGPT Medium",
                Generation,
                0.7,
                None,
            ),
            CatalogEntry::builtin(
                "meta-llama/Llama-2-7b-chat-hf",
                "Llama 2 7B Chat",
                Generation,
                6.8,
                None,
            ),
            CatalogEntry::builtin(
                "meta-llama/Llama-2-13b-chat-hf",
                "Llama 2 13B Chat",
                Generation,
                12.5,
                None,
            ),
            CatalogEntry::builtin(
                "mistralai/Mistral-7B-Instruct-v0.1",
                "Mistral 7B Instruct",
                Generation,
                6.2,
                None,
            ),
            CatalogEntry::builtin(
                "medalpaca/medalpaca-7b",
                "MedAlpaca 7B",
                Generation,
                6.5,
                None,
            ),
            CatalogEntry::builtin(
                "emilyalsentzer/Bio_ClinicalBERT",
                "Clinical BERT",
                Representation,
                1.2,
                Some(768),
            ),
        ] {
            registry.insert(entry);
        }
        registry
    }

    /// Built-in catalog extended (or overridden) by `extra`
    pub fn with_entries(extra: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut registry = Self::builtin();
        for entry in extra {
            registry.insert(entry);
        }
        registry
    }

    /// Add or replace an entry
    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn category_of(&self, name: &str) -> Option<ModelCategory> {
        self.get(name).map(|e| e.category)
    }

    /// Sampling defaults for `name`, falling back to `fallback`
    pub fn generation_defaults<'a>(
        &'a self,
        name: &str,
        fallback: &'a GenerationConfig,
    ) -> &'a GenerationConfig {
        self.get(name)
            .and_then(|e| e.generation.as_ref())
            .unwrap_or(fallback)
    }

    /// Entries sorted by name
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
