//! OpenAI-compatible LLM provider implementation.
//!
//! A single [`OpenAiCompatibleProvider`] serves both a local Ollama server
//! (through its `/v1` endpoint) and hosted OpenAI-style APIs, differing
//! only in base URL, key and capabilities.
//!
//! Uses [`async_openai`] for type-safe request/response handling.

pub mod config;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, FinishReason,
    ResponseFormat as OaiResponseFormat, StopConfiguration,
};
use async_openai::Client;
use secrecy::{ExposeSecret, SecretString};

use twinmem_core::llm::provider::LlmProvider;
use twinmem_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, ProviderCapabilities,
    ResponseFormat, StopReason, Usage,
};

use self::config::OpenAiCompatConfig;

/// Unified provider for any OpenAI-compatible chat completions API.
///
/// Does not derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    model: String,
    capabilities: ProviderCapabilities,
}

impl OpenAiCompatibleProvider {
    /// Create a new OpenAI-compatible provider from a configuration.
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            model: config.model,
            capabilities: config.capabilities,
        }
    }

    /// Create an OpenAI provider at `https://api.openai.com/v1`.
    pub fn openai(api_key: SecretString, model: &str) -> Self {
        Self::new(config::openai_defaults(api_key, model))
    }

    /// Create a provider for a local Ollama server.
    pub fn ollama(base_url: &str, model: &str) -> Self {
        Self::new(config::ollama_defaults(base_url, model))
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(ref system) = request.system {
            messages.push(system_message(system));
        }

        for msg in &request.messages {
            let oai_msg = match msg.role {
                MessageRole::System => system_message(&msg.content),
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        )),
                        refusal: None,
                        name: None,
                        audio: None,
                        tool_calls: None,
                        function_call: None,
                    })
                }
            };
            messages.push(oai_msg);
        }

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        let mut req = CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            top_p: request.top_p.map(|p| p as f32),
            ..Default::default()
        };

        if let Some(format) = request.response_format {
            req.response_format = Some(match format {
                ResponseFormat::Json => OaiResponseFormat::JsonObject,
                ResponseFormat::Text => OaiResponseFormat::Text,
            });
        }

        if let Some(ref stops) = request.stop_sequences {
            if !stops.is_empty() {
                req.stop = Some(StopConfiguration::StringArray(stops.clone()));
            }
        }

        req
    }
}

fn system_message(content: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
        content: ChatCompletionRequestSystemMessageContent::Text(content.to_string()),
        name: None,
    })
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    #[tracing::instrument(name = "chat_completion", skip(self, request), fields(provider = %self.provider_name))]
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = self.build_request(request);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map(map_finish_reason)
            .unwrap_or(StopReason::EndTurn);

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        tracing::debug!(
            output_tokens = usage.output_tokens,
            stop_reason = %stop_reason,
            "Completion received"
        );

        Ok(CompletionResponse {
            id: response.id,
            content,
            model: response.model,
            stop_reason,
            usage,
        })
    }
}

fn map_finish_reason(reason: &FinishReason) -> StopReason {
    match reason {
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ContentFilter => StopReason::ContentFilter,
        // No tools are ever offered, so a tool call just ends the turn.
        FinishReason::Stop | FinishReason::ToolCalls | FinishReason::FunctionCall => {
            StopReason::EndTurn
        }
    }
}

/// Classify an API error body by its `code`/`type` fields and message.
fn classify_api_error(code: &str, kind: &str, message: &str) -> Option<LlmError> {
    let auth = ["authentication_error", "invalid_api_key"];
    if auth.contains(&code) || auth.contains(&kind) || message.contains("API key") {
        return Some(LlmError::AuthenticationFailed);
    }
    if code == "rate_limit_exceeded" || kind == "rate_limit_error" {
        return Some(LlmError::RateLimited {
            retry_after_ms: None,
        });
    }
    if code == "context_length_exceeded" || message.contains("maximum context length") {
        return Some(LlmError::ContextLengthExceeded {
            max: 0,
            requested: 0,
        });
    }
    if code == "server_error" || kind == "overloaded_error" {
        return Some(LlmError::Overloaded(message.to_string()));
    }
    None
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    let classified = match &err {
        OpenAIError::ApiError(api) => classify_api_error(
            api.code.as_deref().unwrap_or_default(),
            api.r#type.as_deref().unwrap_or_default(),
            &api.message,
        ),
        OpenAIError::Reqwest(e) if e.is_connect() || e.is_timeout() => {
            Some(LlmError::Connectivity(err.to_string()))
        }
        OpenAIError::Reqwest(e) => match e.status().map(|s| s.as_u16()) {
            Some(401) => Some(LlmError::AuthenticationFailed),
            Some(429) => Some(LlmError::RateLimited {
                retry_after_ms: None,
            }),
            Some(503) => Some(LlmError::Overloaded(err.to_string())),
            _ => None,
        },
        OpenAIError::JSONDeserialize(_, content) => Some(LlmError::Deserialization(format!(
            "failed to parse response: {content}"
        ))),
        OpenAIError::InvalidArgument(msg) => Some(LlmError::InvalidRequest(msg.clone())),
        _ => None,
    };

    classified.unwrap_or_else(|| LlmError::Provider {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use twinmem_core::llm::enforcer::StructuredOutputEnforcer;
    use twinmem_types::llm::Message;

    fn sample_request() -> CompletionRequest {
        let mut req = CompletionRequest::new(vec![Message::user("Alex loves Neo4j")], 2000);
        req.system = Some("Extract relationships.".to_string());
        req
    }

    fn completion_body(content: &str, finish_reason: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_760_000_000u32,
            "model": "qwen2.5:7b",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": finish_reason
            }],
            "usage": {"prompt_tokens": 42, "completion_tokens": 17, "total_tokens": 59}
        })
        .to_string()
    }

    #[test]
    fn test_ollama_factory() {
        let provider = OpenAiCompatibleProvider::ollama("http://localhost:11434", "qwen2.5:7b");
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model, "qwen2.5:7b");
        assert!(provider.capabilities().json_mode);
    }

    #[test]
    fn test_openai_factory() {
        let provider = OpenAiCompatibleProvider::openai(SecretString::from("sk-test"), "gpt-4o-mini");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.capabilities().max_output_tokens, 16_384);
    }

    #[test]
    fn test_build_request_plain() {
        let provider = OpenAiCompatibleProvider::ollama("http://localhost:11434", "qwen2.5:7b");
        let req = provider.build_request(&sample_request());

        assert_eq!(req.model, "qwen2.5:7b");
        assert_eq!(req.messages.len(), 2);
        assert!(matches!(req.messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(req.messages[1], ChatCompletionRequestMessage::User(_)));
        assert_eq!(req.max_completion_tokens, Some(2000));
        assert!(req.temperature.is_none());
        assert!(req.response_format.is_none());
    }

    #[test]
    fn test_build_request_maps_json_format_and_sampling() {
        let provider = OpenAiCompatibleProvider::ollama("http://localhost:11434", "qwen2.5:7b");
        let mut request = sample_request();
        request.model = "llama3.1:8b".to_string();
        request.response_format = Some(ResponseFormat::Json);
        request.temperature = Some(0.0);
        request.top_p = Some(0.1);
        request.stop_sequences = Some(vec!["###".to_string()]);

        let req = provider.build_request(&request);
        assert_eq!(req.model, "llama3.1:8b");
        assert!(matches!(req.response_format, Some(OaiResponseFormat::JsonObject)));
        assert_eq!(req.temperature, Some(0.0));
        assert_eq!(req.top_p, Some(0.1));
        assert!(req.stop.is_some());

        let wire = serde_json::to_value(&req).unwrap();
        assert_eq!(wire["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn test_complete_through_enforcer_sends_json_mode() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "qwen2.5:7b",
                "temperature": 0.0,
                "response_format": {"type": "json_object"},
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(
                r#"{"relationships":[{"source":"Alex","type":"LOVES","target":"Neo4j"}]}"#,
                "stop",
            ))
            .create_async()
            .await;

        let provider = StructuredOutputEnforcer::new(OpenAiCompatibleProvider::ollama(
            &server.url(),
            "qwen2.5:7b",
        ));
        let response = provider.complete(&sample_request()).await.unwrap();

        assert!(response.content.contains("relationships"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 42);
        assert_eq!(response.usage.output_tokens, 17);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_length_finish_is_max_tokens() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(r#"{"relationships":[{"sou"#, "length"))
            .create_async()
            .await;

        let provider = OpenAiCompatibleProvider::ollama(&server.url(), "qwen2.5:7b");
        let response = provider.complete(&sample_request()).await.unwrap();
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#,
            )
            .create_async()
            .await;

        let provider = OpenAiCompatibleProvider::new(config::OpenAiCompatConfig {
            base_url: format!("{}/v1", server.url()),
            ..config::openai_defaults(SecretString::from("sk-wrong"), "gpt-4o-mini")
        });
        let err = provider.complete(&sample_request()).await.unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connectivity_error() {
        let provider = OpenAiCompatibleProvider::ollama("http://127.0.0.1:1", "qwen2.5:7b");
        let err = provider.complete(&sample_request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Connectivity(_)), "got {err:?}");
    }

    #[test]
    fn test_map_finish_reason() {
        assert_eq!(map_finish_reason(&FinishReason::Stop), StopReason::EndTurn);
        assert_eq!(map_finish_reason(&FinishReason::Length), StopReason::MaxTokens);
        assert_eq!(
            map_finish_reason(&FinishReason::ContentFilter),
            StopReason::ContentFilter
        );
        assert_eq!(map_finish_reason(&FinishReason::ToolCalls), StopReason::EndTurn);
    }

    #[test]
    fn test_classify_api_error() {
        assert!(matches!(
            classify_api_error("invalid_api_key", "", "Incorrect API key provided"),
            Some(LlmError::AuthenticationFailed)
        ));
        assert!(matches!(
            classify_api_error("rate_limit_exceeded", "", "slow down"),
            Some(LlmError::RateLimited { .. })
        ));
        assert!(matches!(
            classify_api_error("", "", "This model's maximum context length is 8192 tokens"),
            Some(LlmError::ContextLengthExceeded { .. })
        ));
        assert!(classify_api_error("", "invalid_request_error", "model not found").is_none());
    }
}
