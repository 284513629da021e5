//! Structured-output enforcement for extraction calls.
//!
//! Entity/relation extraction parses the model's reply as JSON. Small local
//! models only produce parseable JSON reliably when the request both selects
//! JSON output mode and samples at temperature 0. [`StructuredOutputEnforcer`]
//! wraps a provider and rewrites every request it forwards so those two
//! fields hold regardless of what the caller asked for. All other request
//! fields pass through untouched.

use twinmem_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, ResponseFormat,
};

use super::provider::LlmProvider;

/// Sampling temperature applied to every enforced request.
pub const ENFORCED_TEMPERATURE: f64 = 0.0;

/// Return a copy of `request` with JSON output and temperature 0 forced.
pub fn enforce(request: &CompletionRequest) -> CompletionRequest {
    CompletionRequest {
        response_format: Some(ResponseFormat::Json),
        temperature: Some(ENFORCED_TEMPERATURE),
        ..request.clone()
    }
}

/// LLM provider decorator that forces structured JSON output.
pub struct StructuredOutputEnforcer<P> {
    inner: P,
}

impl<P: LlmProvider> StructuredOutputEnforcer<P> {
    pub fn new(inner: P) -> Self {
        if !inner.capabilities().json_mode {
            tracing::warn!(
                provider = inner.name(),
                "Provider does not advertise JSON mode; extraction output may not parse"
            );
        }
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: LlmProvider> LlmProvider for StructuredOutputEnforcer<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        self.inner.capabilities()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let enforced = enforce(request);
        if request.temperature != enforced.temperature
            || request.response_format != enforced.response_format
        {
            tracing::debug!(
                provider = self.inner.name(),
                caller_temperature = ?request.temperature,
                caller_format = ?request.response_format,
                "Overriding sampling settings for structured output"
            );
        }
        self.inner.complete(&enforced).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use twinmem_types::llm::{Message, StopReason, Usage};

    /// Provider that records every request it receives.
    struct RecordingProvider {
        capabilities: ProviderCapabilities,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                capabilities: ProviderCapabilities {
                    json_mode: true,
                    max_context_tokens: 32_768,
                    max_output_tokens: 4_096,
                },
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &self.capabilities
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(CompletionResponse {
                id: "resp-1".into(),
                content: "{}".into(),
                model: "recording-model".into(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    fn caller_request() -> CompletionRequest {
        CompletionRequest {
            model: "qwen2.5:7b".into(),
            messages: vec![Message::user("extract this")],
            system: Some("You extract relations.".into()),
            max_tokens: 2000,
            temperature: Some(0.9),
            top_p: Some(0.5),
            response_format: Some(ResponseFormat::Text),
            stop_sequences: Some(vec!["###".into()]),
        }
    }

    #[test]
    fn test_enforce_overrides_format_and_temperature() {
        let enforced = enforce(&caller_request());
        assert_eq!(enforced.response_format, Some(ResponseFormat::Json));
        assert_eq!(enforced.temperature, Some(0.0));
    }

    #[test]
    fn test_enforce_fills_unset_fields() {
        let req = CompletionRequest::new(vec![Message::user("hi")], 64);
        let enforced = enforce(&req);
        assert_eq!(enforced.response_format, Some(ResponseFormat::Json));
        assert_eq!(enforced.temperature, Some(ENFORCED_TEMPERATURE));
    }

    #[test]
    fn test_enforce_preserves_other_fields() {
        let original = caller_request();
        let enforced = enforce(&original);
        assert_eq!(enforced.model, original.model);
        assert_eq!(enforced.messages, original.messages);
        assert_eq!(enforced.system, original.system);
        assert_eq!(enforced.max_tokens, original.max_tokens);
        assert_eq!(enforced.top_p, original.top_p);
        assert_eq!(enforced.stop_sequences, original.stop_sequences);
    }

    #[tokio::test]
    async fn test_provider_receives_enforced_request() {
        let enforcer = StructuredOutputEnforcer::new(RecordingProvider::new());
        let original = caller_request();

        enforcer.complete(&original).await.unwrap();

        let seen = enforcer.inner().seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, Some(0.0));
        assert_eq!(seen[0].response_format, Some(ResponseFormat::Json));
        assert_eq!(seen[0].top_p, Some(0.5));
        assert_eq!(seen[0].model, "qwen2.5:7b");
        // Caller's request is not mutated.
        assert_eq!(original.temperature, Some(0.9));
    }

    #[test]
    fn test_enforcer_delegates_metadata() {
        let enforcer = StructuredOutputEnforcer::new(RecordingProvider::new());
        assert_eq!(enforcer.name(), "recording");
        assert!(enforcer.capabilities().json_mode);
    }
}
