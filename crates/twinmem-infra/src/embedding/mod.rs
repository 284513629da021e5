//! Embedding backends.
//!
//! - `OllamaEmbedder`: Ollama `/api/embed` over HTTP (default)
//! - `FastEmbedEmbedder`: in-process ONNX inference via fastembed
//!
//! [`create_embedder`] picks one from config and boxes it for runtime use.

pub mod local;
pub mod ollama;

use std::path::Path;

use twinmem_core::embedding::box_embedder::BoxEmbedder;
use twinmem_types::config::{EmbedderConfig, EmbedderType};
use twinmem_types::error::EmbeddingError;

use self::local::FastEmbedEmbedder;
use self::ollama::OllamaEmbedder;

/// Build the configured embedder.
///
/// fastembed models are cached under `{data_dir}/models`.
pub fn create_embedder(
    config: &EmbedderConfig,
    data_dir: &Path,
) -> Result<BoxEmbedder, EmbeddingError> {
    match config.provider {
        EmbedderType::Ollama => Ok(BoxEmbedder::new(OllamaEmbedder::new(
            &config.base_url,
            &config.model,
            config.native_dimension,
        ))),
        EmbedderType::FastEmbed => {
            let embedder = FastEmbedEmbedder::new(&config.model, Some(data_dir.join("models")))?;
            Ok(BoxEmbedder::new(embedder))
        }
    }
}
