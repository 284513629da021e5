//! Global configuration types for twinmem.
//!
//! `GlobalConfig` represents the top-level `config.toml` that names the
//! vector collection and its dimension, the graph store location, and the
//! LLM and embedding backends. Connection values are passed through to the
//! backends as-is; nothing here validates them beyond deserialization.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderType;

/// Top-level configuration.
///
/// Loaded from `~/.twinmem/config.toml`. All fields have defaults matching a
/// local Ollama setup with a 1536-wide collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub graph_store: GraphStoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
}

/// Vector store location and collection shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Directory of the LanceDB database, relative to the data dir unless absolute.
    #[serde(default = "default_vector_path")]
    pub path: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Width the collection is provisioned with on first creation.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_vector_path() -> String {
    "vector_store".to_string()
}

fn default_collection() -> String {
    "memories".to_string()
}

fn default_dimension() -> usize {
    1536
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            path: default_vector_path(),
            collection: default_collection(),
            dimension: default_dimension(),
        }
    }
}

/// Graph store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    /// SQLite URL; a relative file path resolves under the data dir.
    #[serde(default = "default_graph_url")]
    pub url: String,
}

fn default_graph_url() -> String {
    "sqlite://graph.db".to_string()
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            url: default_graph_url(),
        }
    }
}

/// Extraction LLM backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: ProviderType,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Nucleus sampling passed through to the provider (temperature is always forced to 0).
    #[serde(default)]
    pub top_p: Option<f64>,
}

fn default_llm_provider() -> ProviderType {
    ProviderType::Ollama
}

fn default_llm_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_llm_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            top_p: None,
        }
    }
}

/// Which embedding backend produces raw vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderType {
    Ollama,
    #[serde(rename = "fastembed")]
    FastEmbed,
}

/// Embedding backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default = "default_embedder_provider")]
    pub provider: EmbedderType,
    #[serde(default = "default_embedder_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedder_model")]
    pub model: String,
    /// Native output width of the model, if known up front.
    #[serde(default)]
    pub native_dimension: Option<usize>,
}

fn default_embedder_provider() -> EmbedderType {
    EmbedderType::Ollama
}

fn default_embedder_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedder_model() -> String {
    "bge-m3:latest".to_string()
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: default_embedder_provider(),
            base_url: default_embedder_base_url(),
            model: default_embedder_model(),
            native_dimension: None,
        }
    }
}
