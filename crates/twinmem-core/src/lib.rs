//! Coordination logic and collaborator trait definitions for twinmem.
//!
//! This crate defines the "ports" (embedder, LLM provider, vector store,
//! graph store, triple extractor) that the infrastructure layer implements,
//! plus the two shims that sit in front of them (dimension adapter and
//! structured-output enforcer) and the dual-write coordinator itself.
//! It depends only on `twinmem-types` -- never on `twinmem-infra` or any
//! database/IO crate.

pub mod embedding;
pub mod llm;
pub mod memory;
