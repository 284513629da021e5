//! Embedder trait for text-to-vector conversion.
//!
//! Defines the interface for embedding text into vectors.
//! Implementations (Ollama, fastembed) live in twinmem-infra.

use twinmem_types::embedding::EmbedOptions;
use twinmem_types::error::EmbeddingError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    ///
    /// `options` carries extra call arguments. An implementation that does
    /// not understand one of them must fail with
    /// [`EmbeddingError::UnsupportedArguments`] rather than silently drop it.
    fn embed(
        &self,
        text: &str,
        options: &EmbedOptions,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    /// The model name used for embeddings (e.g., "bge-m3:latest").
    fn model_name(&self) -> &str;

    /// Width of the vectors this embedder returns, when known without a call.
    fn dimension(&self) -> Option<usize>;
}
