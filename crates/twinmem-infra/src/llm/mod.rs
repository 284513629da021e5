//! LLM provider implementations.
//!
//! Every supported backend speaks the OpenAI chat completions protocol, so a
//! single [`OpenAiCompatibleProvider`] covers them. [`create_provider`] picks
//! the configuration from [`LlmConfig`] and boxes the result.

pub mod openai_compat;

use secrecy::SecretString;

use twinmem_core::llm::box_provider::BoxLlmProvider;
use twinmem_core::llm::provider::LlmProvider;
use twinmem_types::config::LlmConfig;
use twinmem_types::llm::{CompletionRequest, LlmError, Message, ProviderType};

use self::openai_compat::config::{openai_defaults, OpenAiCompatConfig};
use self::openai_compat::OpenAiCompatibleProvider;

/// Build the configured extraction provider.
///
/// Ollama needs no key. Hosted OpenAI-compatible backends fail with
/// [`LlmError::AuthenticationFailed`] when `api_key` is `None`.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    match config.provider {
        ProviderType::Ollama => Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::ollama(
            &config.base_url,
            &config.model,
        ))),
        ProviderType::OpenAiCompatible => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            let defaults = openai_defaults(key, &config.model);
            let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
                base_url: config.base_url.clone(),
                ..defaults
            });
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

/// Send a tiny completion to confirm the endpoint and model respond.
pub async fn probe_provider<P: LlmProvider>(provider: &P) -> Result<(), LlmError> {
    let request = CompletionRequest {
        temperature: Some(0.0),
        ..CompletionRequest::new(vec![Message::user("Hello")], 10)
    };
    provider.complete(&request).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_without_key() {
        let provider = create_provider(&LlmConfig::default(), None).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert!(provider.capabilities().json_mode);
    }

    #[test]
    fn test_openai_compatible_requires_key() {
        let config = LlmConfig {
            provider: ProviderType::OpenAiCompatible,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config, None),
            Err(LlmError::AuthenticationFailed)
        ));

        let provider = create_provider(&config, Some(SecretString::from("sk-test"))).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[tokio::test]
    async fn test_connection_check_through_boxed_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "qwen2.5:7b",
                "max_completion_tokens": 10,
                "temperature": 0.0,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "id": "chatcmpl-probe",
                    "object": "chat.completion",
                    "created": 1_760_000_000u32,
                    "model": "qwen2.5:7b",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "Hi"},
                        "finish_reason": "stop"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let config = LlmConfig {
            base_url: server.url(),
            ..Default::default()
        };
        let provider = create_provider(&config, None).unwrap();
        probe_provider(&provider).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_unreachable_provider() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config, None).unwrap();
        assert!(matches!(
            probe_provider(&provider).await,
            Err(LlmError::Connectivity(_))
        ));
    }
}
