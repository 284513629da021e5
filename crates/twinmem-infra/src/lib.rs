//! Infrastructure layer for twinmem.
//!
//! Contains implementations of the traits defined in `twinmem-core`:
//! LanceDB vector memory, SQLite-backed graph store, Ollama and fastembed
//! embedders, the OpenAI-compatible LLM provider, and config loading.

pub mod config;
pub mod embedding;
pub mod graph;
pub mod llm;
pub mod vector;
