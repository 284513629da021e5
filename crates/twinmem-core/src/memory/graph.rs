//! Graph store trait.
//!
//! The graph side is a schema-free property graph: entities are plain
//! labels and relation types are whatever the extractor produced.
//! Implementations (SQLite) live in twinmem-infra.

use twinmem_types::error::StoreError;
use twinmem_types::graph::GraphTriple;

/// Trait for appending and reading extracted triples.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait GraphStore: Send + Sync {
    /// Append `triples` under `subject`, creating entities as needed.
    ///
    /// Returns the number of relations written.
    fn add_triples(
        &self,
        subject: &str,
        triples: &[GraphTriple],
    ) -> impl std::future::Future<Output = Result<usize, StoreError>> + Send;

    /// Every triple recorded under `subject`, in insertion order.
    fn triples_for_subject(
        &self,
        subject: &str,
    ) -> impl std::future::Future<Output = Result<Vec<GraphTriple>, StoreError>> + Send;

    /// Cheap round-trip to confirm the store is reachable.
    fn ping(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
