//! Sentence embeddings by mean pooling

use thiserror::Error;

use crate::error::{HostrError, HostrResult};
use crate::runtime::EmbeddingModel;

#[derive(Error, Debug, PartialEq)]
pub enum PoolingError {
    #[error("no token representations to pool")]
    Empty,

    #[error("token {row} has width {found}, expected {expected}")]
    Width {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Average token rows into one vector of width `dimension`
pub fn mean_pool(rows: &[Vec<f32>], dimension: usize) -> Result<Vec<f32>, PoolingError> {
    if rows.is_empty() {
        return Err(PoolingError::Empty);
    }

    let mut pooled = vec![0.0f32; dimension];
    for (row, values) in rows.iter().enumerate() {
        if values.len() != dimension {
            return Err(PoolingError::Width {
                row,
                expected: dimension,
                found: values.len(),
            });
        }
        for (acc, v) in pooled.iter_mut().zip(values) {
            *acc += v;
        }
    }

    let count = rows.len() as f32;
    pooled.iter_mut().for_each(|v| *v /= count);
    Ok(pooled)
}

/// Encode `text` and pool it. Returns the vector and the token count.
pub(crate) fn embed_text(
    name: &str,
    model: &dyn EmbeddingModel,
    text: &str,
) -> HostrResult<(Vec<f32>, usize)> {
    let failure = |reason: String| HostrError::EmbeddingFailure {
        model: name.to_string(),
        reason,
    };

    let tokens = model
        .tokenizer()
        .encode(text)
        .map_err(|e| failure(e.to_string()))?;
    if tokens.is_empty() {
        return Err(failure("input encodes to no tokens".to_string()));
    }

    let states = model
        .token_states(&tokens)
        .map_err(|e| failure(e.to_string()))?;
    let pooled = mean_pool(&states, model.dimension()).map_err(|e| failure(e.to_string()))?;

    tracing::debug!("Pooled {} tokens into {} dims", tokens.len(), pooled.len());
    Ok((pooled, tokens.len()))
}
