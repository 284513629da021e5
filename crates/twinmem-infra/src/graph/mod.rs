//! Graph store infrastructure.
//!
//! The property graph lives in SQLite: an `entities` table of unique labels
//! and an append-only `relations` table tagged with the fact's subject.

pub mod pool;
pub mod sqlite;
