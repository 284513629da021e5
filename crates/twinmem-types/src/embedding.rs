//! Embedding call options.
//!
//! Callers of an embedder may attach extra arguments (for example the memory
//! action that triggered the embedding, or provider tuning knobs). Embedders
//! forward what they understand and reject the rest with
//! [`EmbeddingError::UnsupportedArguments`](crate::error::EmbeddingError).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key used for the memory action ("add", "search", "update").
pub const MEMORY_ACTION_KEY: &str = "memory_action";

/// Extra arguments passed alongside the text to an embedder.
///
/// Ordered by key so that forwarding is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbedOptions {
    params: BTreeMap<String, serde_json::Value>,
}

impl EmbedOptions {
    /// Empty option set (the "text only" call).
    pub fn none() -> Self {
        Self::default()
    }

    /// Option set carrying only a memory action.
    pub fn for_action(action: &str) -> Self {
        Self::none().with(MEMORY_ACTION_KEY, serde_json::Value::from(action))
    }

    /// Add or replace a single argument.
    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The memory action, if one was attached.
    pub fn memory_action(&self) -> Option<&str> {
        self.get(MEMORY_ACTION_KEY).and_then(|v| v.as_str())
    }
}
