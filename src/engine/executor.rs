//! Inference executor
//!
//! Runs generation and embedding against resident models. Each call makes
//! sure its model is resident, then hands the compute-heavy part to the
//! worker pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_stream::stream;
use futures::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::embedding::embed_text;
use super::lifecycle::{LifecycleManager, ResidentModel};
use super::pool::{PoolError, WorkerPool};
use crate::config::GenerationConfig;
use crate::error::{HostrError, HostrResult};
use crate::model::{
    EmbeddingResponse, FinishReason, GeneratedToken, GenerationEvent, GenerationRequest,
    GenerationResponse, ModelId,
};
use crate::registry::ModelRegistry;

/// Generated tokens decoded after each step when scanning for stop sequences
const STOP_WINDOW: usize = 20;

/// Result of one decode loop
#[derive(Debug, Clone, PartialEq)]
struct DecodeOutput {
    text: String,
    prompt_tokens: usize,
    tokens_generated: usize,
    finish_reason: FinishReason,
    stop_sequence: Option<String>,
}

/// Inference executor
///
/// Shares the lifecycle manager with the service; owns nothing but the
/// sampling defaults.
pub struct Executor {
    lifecycle: Arc<LifecycleManager>,
    pool: WorkerPool,
    registry: Arc<ModelRegistry>,
    defaults: GenerationConfig,
}

impl Executor {
    pub fn new(
        lifecycle: Arc<LifecycleManager>,
        pool: WorkerPool,
        registry: Arc<ModelRegistry>,
        defaults: GenerationConfig,
    ) -> Self {
        Self {
            lifecycle,
            pool,
            registry,
            defaults,
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Sampling configuration for `request` against `model`
    fn resolve(&self, model: &str, request: &GenerationRequest) -> GenerationConfig {
        request.resolve(self.registry.generation_defaults(model, &self.defaults))
    }

    /// Generate text and return the complete result
    pub async fn generate(
        &self,
        model_name: &str,
        request: &GenerationRequest,
    ) -> HostrResult<GenerationResponse> {
        let model = self
            .lifecycle
            .ensure_loaded(&ModelId::generation(model_name))
            .await?;
        let config = self.resolve(model_name, request);
        let started = Instant::now();

        let output = {
            let model = Arc::clone(&model);
            let config = config.clone();
            let prompt = request.prompt.clone();
            let context_length = request.context_length;
            self.pool
                .run(move || decode(&model, &prompt, &config, context_length, |_| {}))
                .await??
        };

        self.lifecycle.record_use(&model);
        Ok(finish(&model, &config, output, started.elapsed()))
    }

    /// Generate text, yielding tokens as the worker produces them.
    ///
    /// Token events carry raw decoded text. The final `Done` event holds the
    /// response, with text truncated at the matched stop sequence.
    pub fn generate_stream<'a>(
        &'a self,
        model_name: &'a str,
        request: &'a GenerationRequest,
    ) -> impl Stream<Item = HostrResult<GenerationEvent>> + 'a {
        stream! {
            let model = match self.lifecycle.ensure_loaded(&ModelId::generation(model_name)).await {
                Ok(model) => model,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let config = self.resolve(model_name, request);
            let started = Instant::now();

            let (tx, mut rx) = mpsc::unbounded_channel();
            let job = {
                let pool = self.pool.clone();
                let model = Arc::clone(&model);
                let config = config.clone();
                let prompt = request.prompt.clone();
                let context_length = request.context_length;
                tokio::spawn(async move {
                    pool.run(move || {
                        decode(&model, &prompt, &config, context_length, |token| {
                            // Receiver gone: keep decoding, the slot is held until done
                            let _ = tx.send(token);
                        })
                    })
                    .await
                })
            };

            while let Some(token) = rx.recv().await {
                yield Ok(GenerationEvent::Token(token));
            }

            let output = match job.await {
                Ok(Ok(Ok(output))) => output,
                Ok(Ok(Err(e))) => {
                    yield Err(e);
                    return;
                }
                Ok(Err(e)) => {
                    yield Err(e.into());
                    return;
                }
                Err(e) => {
                    yield Err(PoolError::TaskFailed(e.to_string()).into());
                    return;
                }
            };

            self.lifecycle.record_use(&model);
            yield Ok(GenerationEvent::Done(finish(&model, &config, output, started.elapsed())));
        }
    }

    /// Embed `text` with a representation model
    pub async fn embed(&self, model_name: &str, text: &str) -> HostrResult<EmbeddingResponse> {
        if text.is_empty() {
            return Err(HostrError::EmbeddingFailure {
                model: model_name.to_string(),
                reason: "input text is empty".to_string(),
            });
        }

        let model = self
            .lifecycle
            .ensure_loaded(&ModelId::representation(model_name))
            .await?;
        let started = Instant::now();

        let (embedding, tokens) = {
            let model = Arc::clone(&model);
            let text = text.to_string();
            self.pool
                .run(move || match model.handle().as_embedding() {
                    Some(encoder) => embed_text(model.name(), encoder, &text),
                    None => Err(HostrError::ModelUnavailable {
                        model: model.name().to_string(),
                        reason: "not a representation model".to_string(),
                    }),
                })
                .await??
        };

        self.lifecycle.record_use(&model);
        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model_used: model_name.to_string(),
            tokens,
            processing_time_secs: started.elapsed().as_secs_f64(),
        })
    }
}

/// Run the decode loop on the current (blocking) thread
fn decode<F>(
    model: &ResidentModel,
    prompt: &str,
    config: &GenerationConfig,
    context_length: Option<usize>,
    mut on_token: F,
) -> HostrResult<DecodeOutput>
where
    F: FnMut(GeneratedToken),
{
    let failure = |reason: String| HostrError::GenerationFailure {
        model: model.name().to_string(),
        reason,
    };

    let generator = model
        .handle()
        .as_generation()
        .ok_or_else(|| failure("not a generation model".to_string()))?;
    let tokenizer = generator.tokenizer();

    let prompt_tokens = tokenizer
        .encode(prompt)
        .map_err(|e| failure(e.to_string()))?;
    if prompt_tokens.is_empty() {
        return Err(failure("prompt encodes to no tokens".to_string()));
    }

    let mut max_tokens = config.max_tokens;
    if let Some(cap) = context_length {
        let room = cap.saturating_sub(prompt_tokens.len());
        if room == 0 {
            return Err(failure(format!(
                "prompt of {} tokens leaves no room in a context of {}",
                prompt_tokens.len(),
                cap
            )));
        }
        max_tokens = max_tokens.min(room);
    }

    let mut session = generator
        .start_session(&prompt_tokens, &config.sampling())
        .map_err(|e| failure(e.to_string()))?;

    let mut generated: Vec<u32> = Vec::with_capacity(max_tokens);
    let mut finish_reason = FinishReason::Length;
    let mut stop_sequence = None;

    for i in 0..max_tokens {
        tracing::debug!("Generating token {} / {}", i + 1, max_tokens);

        let next_token = session.next_token().map_err(|e| failure(e.to_string()))?;
        if tokenizer.is_eos(next_token) {
            tracing::debug!("Hit EOS token, stopping generation");
            finish_reason = FinishReason::Stop;
            break;
        }

        generated.push(next_token);
        let text = tokenizer.decode(&[next_token]).unwrap_or_default();
        on_token(GeneratedToken {
            token_id: next_token,
            text,
        });

        if !config.stop_sequences.is_empty() {
            let start = generated.len().saturating_sub(STOP_WINDOW);
            let window = tokenizer
                .decode(&generated[start..])
                .map_err(|e| failure(e.to_string()))?;
            if let Some(stop) = config
                .stop_sequences
                .iter()
                .find(|s| !s.is_empty() && window.contains(s.as_str()))
            {
                tracing::debug!("Matched stop sequence {:?}", stop);
                stop_sequence = Some(stop.clone());
                // A match on the last allowed token still counts as reaching the limit
                if generated.len() < max_tokens {
                    finish_reason = FinishReason::Stop;
                }
                break;
            }
        }
    }

    let mut text = tokenizer
        .decode(&generated)
        .map_err(|e| failure(e.to_string()))?;
    if stop_sequence.is_some() {
        if let Some(cut) = earliest_stop(&text, &config.stop_sequences) {
            text.truncate(cut);
        }
    }

    Ok(DecodeOutput {
        text,
        prompt_tokens: prompt_tokens.len(),
        tokens_generated: generated.len(),
        finish_reason,
        stop_sequence,
    })
}

/// Byte offset of the first stop sequence in `text`
fn earliest_stop(text: &str, stops: &[String]) -> Option<usize> {
    stops
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
}

fn finish(
    model: &ResidentModel,
    config: &GenerationConfig,
    output: DecodeOutput,
    elapsed: Duration,
) -> GenerationResponse {
    let secs = elapsed.as_secs_f64();
    tracing::info!(
        "Generated {} tokens with {} in {:.2}s ({:.1} tok/s)",
        output.tokens_generated,
        model.name(),
        secs,
        if secs > 0.0 {
            output.tokens_generated as f64 / secs
        } else {
            0.0
        }
    );

    let mut metadata = config.metadata();
    metadata.insert("device".into(), model.device().to_string().into());
    metadata.insert(
        "quantization".into(),
        model
            .quantization()
            .label()
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::Null),
    );
    if let Some(stop) = output.stop_sequence {
        metadata.insert("stop_sequence".into(), stop.into());
    }

    GenerationResponse {
        id: format!("gen-{}", Uuid::new_v4()),
        text: output.text,
        model_used: model.name().to_string(),
        prompt_tokens: output.prompt_tokens,
        tokens_generated: output.tokens_generated,
        total_tokens: output.prompt_tokens + output.tokens_generated,
        finish_reason: output.finish_reason,
        generation_time_secs: secs,
        metadata,
    }
}
