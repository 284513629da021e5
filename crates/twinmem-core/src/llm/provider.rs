//! LlmProvider trait definition.
//!
//! The extraction pipeline only ever needs a single non-streaming
//! completion, so the trait is deliberately small.

use twinmem_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

/// Trait for LLM provider backends (Ollama, OpenAI-compatible servers).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in twinmem-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// What this provider supports (JSON mode, context window).
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
