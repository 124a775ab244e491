//! In-memory runtime and monitor used by unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

use crate::error::RuntimeError;
use crate::model::ModelCategory;
use crate::runtime::{
    BoxedTokenizer, DecodeSession, EmbeddingModel, GenerationModel, LoadRequest, LoadedModel,
    ModelHandle, ModelLoader, SamplingParams, TokenizerTrait,
};
use crate::system::{AcceleratorInfo, ResourceMonitor, SystemMemory};

/// One token per `char`; token 0 is end-of-sequence
pub struct CharTokenizer;

impl TokenizerTrait for CharTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, RuntimeError> {
        Ok(text.chars().map(|c| c as u32).collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, RuntimeError> {
        ids.iter()
            .map(|&id| {
                char::from_u32(id)
                    .ok_or_else(|| RuntimeError::Tokenization(format!("invalid token {}", id)))
            })
            .collect()
    }

    fn is_eos(&self, token_id: u32) -> bool {
        token_id == 0
    }
}

/// How a scripted generation model behaves
#[derive(Debug, Clone)]
pub struct Script {
    /// Characters emitted in order
    pub reply: String,
    /// Emit EOS after `reply` instead of cycling it
    pub eos_at_end: bool,
    /// Sleep per decode step
    pub step_delay: Duration,
    /// Fail on this step (0-based)
    pub fail_at: Option<usize>,
}

impl Script {
    pub fn cycling(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            eos_at_end: false,
            step_delay: Duration::ZERO,
            fail_at: None,
        }
    }

    pub fn once(reply: &str) -> Self {
        Self {
            eos_at_end: true,
            ..Self::cycling(reply)
        }
    }
}

pub struct ScriptedGenerator {
    tokenizer: BoxedTokenizer,
    script: Script,
    live: Arc<AtomicUsize>,
}

struct ScriptedSession<'a> {
    script: &'a Script,
    reply: Vec<u32>,
    step: usize,
}

impl DecodeSession for ScriptedSession<'_> {
    fn next_token(&mut self) -> Result<u32, RuntimeError> {
        if !self.script.step_delay.is_zero() {
            std::thread::sleep(self.script.step_delay);
        }
        if self.script.fail_at == Some(self.step) {
            return Err(RuntimeError::Forward(format!(
                "scripted failure at step {}",
                self.step
            )));
        }

        let token = if self.step < self.reply.len() {
            self.reply[self.step]
        } else if self.script.eos_at_end || self.reply.is_empty() {
            0
        } else {
            self.reply[self.step % self.reply.len()]
        };
        self.step += 1;
        Ok(token)
    }
}

impl GenerationModel for ScriptedGenerator {
    fn tokenizer(&self) -> &dyn TokenizerTrait {
        &self.tokenizer
    }

    fn start_session<'a>(
        &'a self,
        _prompt: &[u32],
        _sampling: &SamplingParams,
    ) -> Result<Box<dyn DecodeSession + 'a>, RuntimeError> {
        let reply = self.tokenizer.encode(&self.script.reply)?;
        Ok(Box::new(ScriptedSession {
            script: &self.script,
            reply,
            step: 0,
        }))
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Every token row is the token id repeated `dimension` times
pub struct CodepointEmbedder {
    dimension: usize,
    live: Arc<AtomicUsize>,
}

impl EmbeddingModel for CodepointEmbedder {
    fn tokenizer(&self) -> &dyn TokenizerTrait {
        &CharTokenizer
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn token_states(&self, tokens: &[u32]) -> Result<Vec<Vec<f32>>, RuntimeError> {
        Ok(tokens
            .iter()
            .map(|&t| vec![t as f32; self.dimension])
            .collect())
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Loader producing scripted models, with load and liveness counters
#[derive(Default)]
pub struct FakeLoader {
    scripts: Mutex<HashMap<String, Script>>,
    failing: Mutex<HashSet<String>>,
    missing: Mutex<HashSet<String>>,
    loads: AtomicUsize,
    live: Arc<AtomicUsize>,
    load_delay: Mutex<Duration>,
}

impl FakeLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, name: &str, script: Script) {
        self.scripts.lock().unwrap().insert(name.to_string(), script);
    }

    pub fn fail(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn missing(&self, name: &str) {
        self.missing.lock().unwrap().insert(name.to_string());
    }

    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = delay;
    }

    /// Number of successful loader calls
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Handles created and not yet released
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl ModelLoader for FakeLoader {
    fn load(&self, request: &LoadRequest) -> Result<LoadedModel, RuntimeError> {
        let delay = *self.load_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let name = &request.model.name;
        if self.missing.lock().unwrap().contains(name) {
            return Err(RuntimeError::NotFound(name.clone()));
        }
        if self.failing.lock().unwrap().contains(name) {
            return Err(RuntimeError::Incompatible(format!(
                "{} has unexpected tensor shapes",
                name
            )));
        }

        let handle = match request.model.category {
            ModelCategory::Generation => {
                let script = self
                    .scripts
                    .lock()
                    .unwrap()
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Script::cycling(&format!("{} ", name)));
                ModelHandle::Generation(Box::new(ScriptedGenerator {
                    tokenizer: Box::new(CharTokenizer),
                    script,
                    live: Arc::clone(&self.live),
                }))
            }
            ModelCategory::Representation => ModelHandle::Representation(Box::new(
                CodepointEmbedder {
                    dimension: 4,
                    live: Arc::clone(&self.live),
                },
            )),
        };

        self.loads.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(LoadedModel::new(handle).with_parameter_count(500_000_000))
    }
}

/// Monitor with settable available memory
pub struct FakeMonitor {
    available_gb: Mutex<f64>,
    accelerator: Mutex<AcceleratorInfo>,
    query_threads: Mutex<Vec<ThreadId>>,
}

impl FakeMonitor {
    pub fn with_available(gb: f64) -> Arc<Self> {
        Arc::new(Self {
            available_gb: Mutex::new(gb),
            accelerator: Mutex::new(AcceleratorInfo::Unavailable),
            query_threads: Mutex::new(Vec::new()),
        })
    }

    pub fn set_available(&self, gb: f64) {
        *self.available_gb.lock().unwrap() = gb;
    }

    /// Threads that ran an accelerator query
    pub fn query_threads(&self) -> Vec<ThreadId> {
        self.query_threads.lock().unwrap().clone()
    }
}

impl ResourceMonitor for FakeMonitor {
    fn system_memory(&self) -> SystemMemory {
        let available = *self.available_gb.lock().unwrap();
        SystemMemory {
            total_gb: 64.0,
            available_gb: available,
            used_gb: 64.0 - available,
            percent: (64.0 - available) / 64.0 * 100.0,
        }
    }

    fn accelerator_info(&self) -> AcceleratorInfo {
        self.query_threads
            .lock()
            .unwrap()
            .push(std::thread::current().id());
        self.accelerator.lock().unwrap().clone()
    }
}
