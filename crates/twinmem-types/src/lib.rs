//! Shared domain types for twinmem.
//!
//! This crate contains the types passed between the coordination layer and
//! its collaborators: facts, vector records, graph triples, embedding options,
//! LLM request/response shapes, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
