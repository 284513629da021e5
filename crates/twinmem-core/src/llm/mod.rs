//! LLM provider abstraction.
//!
//! - `LlmProvider`: RPITIT trait implemented by backends in twinmem-infra
//! - `BoxLlmProvider`: object-safe wrapper for runtime provider selection
//! - `StructuredOutputEnforcer`: forces JSON output at temperature 0

pub mod box_provider;
pub mod enforcer;
pub mod provider;
