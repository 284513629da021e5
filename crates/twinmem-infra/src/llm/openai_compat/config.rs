//! Configuration types and per-backend defaults for OpenAI-compatible providers.

use secrecy::SecretString;

use twinmem_types::llm::ProviderCapabilities;

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "ollama", "openai").
    pub provider_name: String,
    /// Base URL for the API, including the `/v1` suffix.
    pub base_url: String,
    pub api_key: SecretString,
    /// Default model when a request leaves `model` empty.
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

/// OpenAI default configuration.
///
/// Base URL: `https://api.openai.com/v1`
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: "https://api.openai.com/v1".into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            json_mode: true,
            max_context_tokens: 128_000,
            max_output_tokens: 16_384,
        },
    }
}

/// Local Ollama server through its OpenAI-compatible endpoint.
///
/// Ollama ignores the key but the client always sends one.
pub fn ollama_defaults(base_url: &str, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "ollama".into(),
        base_url: ollama_v1_url(base_url),
        api_key: SecretString::from("ollama"),
        model: model.into(),
        capabilities: ProviderCapabilities {
            json_mode: true,
            max_context_tokens: 32_768,
            max_output_tokens: 8_192,
        },
    }
}

/// `http://host:11434`, `.../api` and `.../v1` all map to `.../v1`.
fn ollama_v1_url(base_url: &str) -> String {
    let root = crate::embedding::ollama::normalize_ollama_base_url(base_url);
    format!("{root}/v1")
}
