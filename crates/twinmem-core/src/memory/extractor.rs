//! Graph triple extraction via LLM.
//!
//! `LlmTripleExtractor` asks the model for the entities and relationships in
//! a fact and turns the reply into [`GraphTriple`]s. Requests always go
//! through a [`StructuredOutputEnforcer`], so the model is in JSON mode at
//! temperature 0.
//!
//! Parsing is lenient: the expected shape is
//! `{"relationships": [{"source", "type", "target"}]}`, but a bare array,
//! markdown code fences, and entities given as `{"id": ...}` objects are all
//! accepted. Output that still cannot be parsed logs a warning and yields an
//! empty list, which the coordinator reports as a skipped graph write.

use serde_json::Value;

use twinmem_types::graph::GraphTriple;
use twinmem_types::llm::{CompletionRequest, LlmError, Message, StopReason};

use crate::llm::enforcer::StructuredOutputEnforcer;
use crate::llm::provider::LlmProvider;

/// Trait for turning a fact into graph triples.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait TripleExtractor: Send + Sync {
    /// Extract zero or more triples from `text`.
    ///
    /// An empty result is not an error.
    fn extract(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<GraphTriple>, LlmError>> + Send;
}

/// System prompt for the relationship extraction call.
const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a knowledge graph builder. Extract the entities and the relationships between them from the user's statement.

Rules:
1. Use the most specific, complete name for each entity (e.g. "Python Developer", not "developer")
2. Refer to the speaker as "USER" when the statement is written in the first person
3. Relationship types are short verbs or verb phrases in UPPER_SNAKE_CASE (e.g. WORKS_AS, LIKES, LIVES_IN)
4. Only extract relationships that are explicitly stated
5. General statements with no named entities produce no relationships

Return a JSON object with exactly one field:
- "relationships": array of objects, each with "source", "type", and "target" strings

If there is nothing to extract, return: {"relationships": []}

Example output:
{"relationships": [{"source": "Alex", "type": "WORKS_AS", "target": "Python Developer"}]}"#;

/// Default response budget for an extraction call.
pub const DEFAULT_EXTRACTION_MAX_TOKENS: u32 = 2000;

/// LLM-backed [`TripleExtractor`].
pub struct LlmTripleExtractor<P> {
    provider: StructuredOutputEnforcer<P>,
    model: String,
    max_tokens: u32,
    top_p: Option<f64>,
}

impl<P: LlmProvider> LlmTripleExtractor<P> {
    /// Wrap `provider` in a [`StructuredOutputEnforcer`] and use its default model.
    pub fn new(provider: P) -> Self {
        Self {
            provider: StructuredOutputEnforcer::new(provider),
            model: String::new(),
            max_tokens: DEFAULT_EXTRACTION_MAX_TOKENS,
            top_p: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_top_p(mut self, top_p: Option<f64>) -> Self {
        self.top_p = top_p;
        self
    }

    /// The enforcer-wrapped provider used for extraction calls.
    pub fn provider(&self) -> &StructuredOutputEnforcer<P> {
        &self.provider
    }

    fn build_request(&self, text: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            system: Some(EXTRACTION_SYSTEM_PROMPT.to_string()),
            top_p: self.top_p,
            ..CompletionRequest::new(vec![Message::user(text)], self.max_tokens)
        }
    }
}

impl<P: LlmProvider> TripleExtractor for LlmTripleExtractor<P> {
    #[tracing::instrument(
        name = "extract_triples",
        skip(self, text),
        fields(provider = self.provider.name(), text_len = text.len())
    )]
    async fn extract(&self, text: &str) -> Result<Vec<GraphTriple>, LlmError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let request = self.build_request(text);
        let response = self.provider.complete(&request).await?;
        if response.stop_reason != StopReason::EndTurn {
            tracing::warn!(
                stop_reason = %response.stop_reason,
                "Extraction reply ended early; relationships may be incomplete"
            );
        }

        let triples = parse_triples(&response.content);
        tracing::debug!(count = triples.len(), "Extracted graph triples");
        Ok(triples)
    }
}

/// Parse an extraction reply into normalized, de-duplicated triples.
///
/// Never fails: unparseable content logs a warning and returns an empty list.
pub fn parse_triples(content: &str) -> Vec<GraphTriple> {
    let body = strip_code_fence(content.trim());

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(
                error = %e,
                content_preview = preview(body),
                "Failed to parse extraction JSON; returning no triples"
            );
            return Vec::new();
        }
    };

    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match ["relationships", "relations", "triples"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
        {
            Some(items) => items.as_slice(),
            // A lone relationship object, common from small models in JSON mode.
            None if map.contains_key("source") => std::slice::from_ref(&value),
            None => {
                tracing::warn!(
                    content_preview = preview(body),
                    "Extraction JSON has no relationships array; returning no triples"
                );
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    let mut triples: Vec<GraphTriple> = Vec::with_capacity(items.len());
    for item in items {
        let Some(triple) = triple_from_value(item) else {
            tracing::debug!(item = %item, "Skipping incomplete relationship");
            continue;
        };
        if !triples.contains(&triple) {
            triples.push(triple);
        }
    }
    triples
}

fn triple_from_value(item: &Value) -> Option<GraphTriple> {
    let obj = item.as_object()?;
    let source = entity_label(obj.get("source")?)?;
    let relation = ["type", "relationship", "relation"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))?;
    let target = ["target", "destination"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(entity_label))?;

    let triple = GraphTriple::new(
        source.trim(),
        GraphTriple::normalize_relation(relation),
        target.trim(),
    );
    triple.is_complete().then_some(triple)
}

/// Entities come back either as plain strings or as `{"id": ..}` / `{"name": ..}` objects.
fn entity_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => ["id", "name"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(200) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use twinmem_types::llm::{
        CompletionResponse, ProviderCapabilities, ResponseFormat, StopReason, Usage,
    };

    struct ScriptedProvider {
        reply: Result<String, String>,
        capabilities: ProviderCapabilities,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn replying(content: &str) -> Self {
            Self {
                reply: Ok(content.to_string()),
                capabilities: ProviderCapabilities {
                    json_mode: true,
                    max_context_tokens: 32_768,
                    max_output_tokens: 4_096,
                },
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                ..Self::replying("")
            }
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &self.capabilities
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(content) => Ok(CompletionResponse {
                    id: "resp".into(),
                    content: content.clone(),
                    model: "scripted-model".into(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                }),
                Err(message) => Err(LlmError::Provider {
                    message: message.clone(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_extract_object_shape() {
        let provider = ScriptedProvider::replying(
            r#"{"relationships": [{"source": "Alex", "type": "works as", "target": "Python Developer"}]}"#,
        );
        let extractor = LlmTripleExtractor::new(provider);

        let triples = extractor.extract("Alex is a Python developer").await.unwrap();
        assert_eq!(
            triples,
            vec![GraphTriple::new("Alex", "WORKS_AS", "Python Developer")]
        );
    }

    #[tokio::test]
    async fn test_extract_sends_enforced_request() {
        let extractor = LlmTripleExtractor::new(ScriptedProvider::replying("[]"))
            .with_model("qwen2.5:7b")
            .with_max_tokens(512)
            .with_top_p(Some(0.1));

        extractor.extract("User likes graphs").await.unwrap();

        let seen = extractor.provider().inner().seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].response_format, Some(ResponseFormat::Json));
        assert_eq!(seen[0].temperature, Some(0.0));
        assert_eq!(seen[0].model, "qwen2.5:7b");
        assert_eq!(seen[0].max_tokens, 512);
        assert_eq!(seen[0].top_p, Some(0.1));
        assert_eq!(seen[0].messages, vec![Message::user("User likes graphs")]);
        assert!(seen[0].system.is_some());
    }

    #[tokio::test]
    async fn test_extract_empty_text_skips_llm() {
        let extractor = LlmTripleExtractor::new(ScriptedProvider::replying("[]"));
        assert!(extractor.extract("   ").await.unwrap().is_empty());
        assert!(extractor.provider().inner().seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extract_propagates_provider_error() {
        let extractor = LlmTripleExtractor::new(ScriptedProvider::failing("model not found"));
        let result = extractor.extract("Alex is a developer").await;
        assert!(matches!(result, Err(LlmError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_extract_unparseable_is_empty() {
        let extractor =
            LlmTripleExtractor::new(ScriptedProvider::replying("Sure! Alex is a developer."));
        assert!(extractor.extract("Alex is a developer").await.unwrap().is_empty());
    }

    #[test]
    fn test_parse_bare_array() {
        let triples =
            parse_triples(r#"[{"source": "USER", "relationship": "likes", "target": "graphs"}]"#);
        assert_eq!(triples, vec![GraphTriple::new("USER", "LIKES", "graphs")]);
    }

    #[test]
    fn test_parse_code_fenced() {
        let content = "```json\n{\"relationships\": [{\"source\": \"Alex\", \"type\": \"LOVES\", \"target\": \"Neo4j\"}]}\n```";
        assert_eq!(
            parse_triples(content),
            vec![GraphTriple::new("Alex", "LOVES", "Neo4j")]
        );
    }

    #[test]
    fn test_parse_entity_objects() {
        let content = r#"{"relationships": [
            {"source": {"id": "Alex", "type": "Person"}, "type": "WORKS_AT", "target": {"name": "Acme"}}
        ]}"#;
        assert_eq!(
            parse_triples(content),
            vec![GraphTriple::new("Alex", "WORKS_AT", "Acme")]
        );
    }

    #[test]
    fn test_parse_drops_incomplete_and_duplicates() {
        let content = r#"{"relationships": [
            {"source": "Alex", "type": "LIKES", "target": "Rust"},
            {"source": "Alex", "type": "likes", "target": "Rust"},
            {"source": "", "type": "LIKES", "target": "Go"},
            {"source": "Alex", "target": "Zig"},
            "not an object"
        ]}"#;
        assert_eq!(
            parse_triples(content),
            vec![GraphTriple::new("Alex", "LIKES", "Rust")]
        );
    }

    #[test]
    fn test_parse_single_relationship_object() {
        let triples = parse_triples(r#"{"source": "Alex", "type": "LOVES", "target": "Neo4j"}"#);
        assert_eq!(triples, vec![GraphTriple::new("Alex", "LOVES", "Neo4j")]);

        let triples =
            parse_triples(r#"{"source": "USER", "relationship": "likes", "destination": "graphs"}"#);
        assert_eq!(triples, vec![GraphTriple::new("USER", "LIKES", "graphs")]);
    }

    #[tokio::test]
    async fn test_extract_single_object_reply() {
        let extractor = LlmTripleExtractor::new(ScriptedProvider::replying(
            r#"{"source": "Alex", "type": "WORKS_AS", "target": "Python Developer"}"#,
        ));
        let triples = extractor.extract("Alex is a Python developer").await.unwrap();
        assert_eq!(triples, vec![GraphTriple::new("Alex", "WORKS_AS", "Python Developer")]);
    }

    #[test]
    fn test_parse_empty_relationships() {
        assert!(parse_triples(r#"{"relationships": []}"#).is_empty());
        assert!(parse_triples(r#"{"entities": ["sky"]}"#).is_empty());
        assert!(parse_triples("42").is_empty());
        assert!(parse_triples("").is_empty());
    }
}
