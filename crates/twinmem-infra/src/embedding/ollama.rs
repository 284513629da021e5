//! Ollama embedding client.
//!
//! Calls Ollama's native `POST /api/embed` endpoint. Only the request keys
//! that endpoint understands are forwarded from `EmbedOptions`; anything
//! else (e.g. `memory_action`) is refused with `UnsupportedArguments` so the
//! dimension adapter can retry with the bare text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use twinmem_core::embedding::embedder::Embedder;
use twinmem_types::embedding::EmbedOptions;
use twinmem_types::error::EmbeddingError;

/// Request keys `/api/embed` accepts besides `model` and `input`.
pub const FORWARDED_OPTIONS: &[&str] = &["keep_alive", "truncate", "options", "dimensions"];

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Strip `/api` or `/v1` suffixes so both native and OpenAI-style URLs work.
pub fn normalize_ollama_base_url(configured: &str) -> String {
    let mut base_url = configured.trim().trim_end_matches('/').to_string();

    if base_url.ends_with("/api") {
        base_url.truncate(base_url.len() - "/api".len());
    } else if base_url.ends_with("/v1") {
        base_url.truncate(base_url.len() - "/v1".len());
    }

    base_url
}

/// Embedder backed by a (usually local) Ollama server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: Option<usize>,
}

impl OllamaEmbedder {
    /// Create an embedder for `model` served at `base_url`.
    ///
    /// `dimension` is the model's native width when known up front; Ollama
    /// does not report it without an embedding call.
    pub fn new(base_url: &str, model: &str, dimension: Option<usize>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_ollama_base_url(base_url),
            model: model.to_string(),
            dimension,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    /// Split `options` into forwardable request keys, rejecting the rest.
    fn request_extras(options: &EmbedOptions) -> Result<Map<String, Value>, EmbeddingError> {
        let unknown: Vec<&str> = options
            .keys()
            .filter(|k| !FORWARDED_OPTIONS.contains(k))
            .collect();
        if !unknown.is_empty() {
            return Err(EmbeddingError::UnsupportedArguments(format!(
                "Ollama /api/embed does not accept: {}",
                unknown.join(", ")
            )));
        }

        Ok(options
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect())
    }
}

impl Embedder for OllamaEmbedder {
    #[tracing::instrument(name = "ollama_embed", skip(self, text, options), fields(model = %self.model))]
    async fn embed(&self, text: &str, options: &EmbedOptions) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbedRequest {
            model: &self.model,
            input: text,
            extra: Self::request_extras(options)?,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EmbeddingError::Connectivity(format!("{}: {e}", self.base_url))
                } else {
                    EmbeddingError::Provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&raw)
                .map(|b| b.error)
                .unwrap_or(raw);
            return Err(EmbeddingError::Provider(format!(
                "Ollama returned {status}: {message}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("invalid embed response: {e}")))?;

        let vector = parsed
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(EmbeddingError::EmptyResponse)?;

        tracing::trace!(dim = vector.len(), "Received embedding");
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}
