//! Embedding dimension adapter.
//!
//! Local embedding models rarely produce the width a vector collection was
//! provisioned with (e.g. bge-m3 emits 1024 floats, the collection expects
//! 1536). [`DimensionAdapter`] wraps any [`Embedder`] and right-pads its
//! output with zeros up to the target width, so every caller that goes
//! through the adapter produces vectors the collection accepts.
//!
//! Vectors that are already as wide or wider than the target are returned
//! unchanged. No truncation policy exists; an over-wide vector reaches the
//! store and is rejected there with a dimension mismatch.

use twinmem_types::embedding::EmbedOptions;
use twinmem_types::error::EmbeddingError;

use super::embedder::Embedder;

/// Right-pad `vector` with `0.0` up to `target_dim`.
///
/// Pure function: the first `vector.len()` entries are untouched, and a
/// vector with `len >= target_dim` is returned as-is.
pub fn pad_to_dimension(mut vector: Vec<f32>, target_dim: usize) -> Vec<f32> {
    if vector.len() < target_dim {
        vector.resize(target_dim, 0.0);
    }
    vector
}

/// Embed `text` through `embedder` and adapt the result to `target_dim`.
///
/// `options` are forwarded unmodified. If the embedder rejects them with
/// [`EmbeddingError::UnsupportedArguments`], the call is retried once with
/// the bare text. Any other error, or an error on the retry, propagates.
pub async fn adapt<E: Embedder>(
    embedder: &E,
    text: &str,
    target_dim: usize,
    options: &EmbedOptions,
) -> Result<Vec<f32>, EmbeddingError> {
    let raw = match embedder.embed(text, options).await {
        Ok(vector) => vector,
        Err(EmbeddingError::UnsupportedArguments(detail)) if !options.is_empty() => {
            tracing::debug!(
                model = embedder.model_name(),
                %detail,
                "Embedder rejected extra arguments; retrying with text only"
            );
            embedder.embed(text, &EmbedOptions::none()).await?
        }
        Err(e) => return Err(e),
    };

    if raw.len() < target_dim {
        tracing::trace!(
            model = embedder.model_name(),
            raw_dim = raw.len(),
            target_dim,
            "Padding embedding"
        );
    } else if raw.len() > target_dim {
        tracing::warn!(
            model = embedder.model_name(),
            raw_dim = raw.len(),
            target_dim,
            "Embedding is wider than the target dimension; passing through unchanged"
        );
    }

    Ok(pad_to_dimension(raw, target_dim))
}

/// An [`Embedder`] decorator that pads every output to a fixed width.
///
/// Reports `target_dim` as its dimension so it can stand in for the raw
/// embedder anywhere a collection-compatible embedder is expected.
pub struct DimensionAdapter<E> {
    inner: E,
    target_dim: usize,
}

impl<E: Embedder> DimensionAdapter<E> {
    pub fn new(inner: E, target_dim: usize) -> Self {
        Self { inner, target_dim }
    }

    pub fn target_dimension(&self) -> usize {
        self.target_dim
    }

    /// The wrapped, unadapted embedder.
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Embedder> Embedder for DimensionAdapter<E> {
    async fn embed(&self, text: &str, options: &EmbedOptions) -> Result<Vec<f32>, EmbeddingError> {
        adapt(&self.inner, text, self.target_dim, options).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.target_dim)
    }
}
