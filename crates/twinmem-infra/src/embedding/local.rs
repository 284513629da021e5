//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `twinmem-core` using fastembed's
//! ONNX runtime inference. Models are downloaded on first use and cached.
//!
//! fastembed takes no per-call arguments, so any non-empty `EmbedOptions`
//! is rejected with `UnsupportedArguments`; the dimension adapter then
//! retries with the bare text.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};

use twinmem_core::embedding::embedder::Embedder;
use twinmem_types::embedding::EmbedOptions;
use twinmem_types::error::EmbeddingError;

/// Map a configured model name to a fastembed model and its output width.
pub fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    let bare = name.trim().trim_start_matches("BAAI/").trim_start_matches("sentence-transformers/");
    match bare.to_lowercase().as_str() {
        "bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
        "bge-large-en-v1.5" => Some((EmbeddingModel::BGELargeENV15, 1024)),
        "all-minilm-l6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        _ => None,
    }
}

/// Fail on any extra call argument.
fn reject_options(options: &EmbedOptions) -> Result<(), EmbeddingError> {
    if options.is_empty() {
        return Ok(());
    }
    let keys: Vec<&str> = options.keys().collect();
    Err(EmbeddingError::UnsupportedArguments(format!(
        "fastembed accepts no extra arguments (got: {})",
        keys.join(", ")
    )))
}

/// Local embedder backed by a fastembed `TextEmbedding` model.
pub struct FastEmbedEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedEmbedder {
    /// Load `model_name`, downloading it into `cache_dir` if needed.
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self, EmbeddingError> {
        let (model_enum, dimension) = resolve_model(model_name).ok_or_else(|| {
            EmbeddingError::Provider(format!(
                "unsupported fastembed model '{model_name}' (supported: bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, all-MiniLM-L6-v2)"
            ))
        })?;

        let mut init_options = TextInitOptions::new(model_enum).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            init_options = init_options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(init_options).map_err(|e| {
            EmbeddingError::Provider(format!("failed to initialize fastembed model: {e}"))
        })?;

        tracing::info!(model = model_name, dimension, "Initialized local embedder");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, text: &str, options: &EmbedOptions) -> Result<Vec<f32>, EmbeddingError> {
        reject_options(options)?;

        let model = Arc::clone(&self.model);
        let text = text.to_string();

        // ONNX inference is CPU-bound.
        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| EmbeddingError::Provider(format!("model lock poisoned: {e}")))?;
            model
                .embed(vec![text], None)
                .map_err(|e| EmbeddingError::Provider(format!("failed to generate embedding: {e}")))
        })
        .await
        .map_err(|e| EmbeddingError::Provider(format!("embedding task failed: {e}")))??;

        embeddings.into_iter().next().ok_or(EmbeddingError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
