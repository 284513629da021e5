//! Vector memory store trait.
//!
//! Defines the interface for the fixed-dimension vector collection.
//! Implementations (LanceDB) live in twinmem-infra.

use twinmem_types::error::StoreError;
use twinmem_types::memory::{CollectionDescriptor, RecallResponse, VectorRecord};

/// Trait for a vector-indexed memory collection.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait VectorMemoryStore: Send + Sync {
    /// Name and fixed dimension of the collection this store writes to.
    fn collection(&self) -> &CollectionDescriptor;

    /// Insert one record.
    ///
    /// Fails with [`StoreError::DimensionMismatch`] when the record's vector
    /// length differs from the collection dimension.
    fn insert(
        &self,
        record: &VectorRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// All memories stored for `subject`, oldest first.
    fn get_all(
        &self,
        subject: &str,
    ) -> impl std::future::Future<Output = Result<RecallResponse, StoreError>> + Send;

    /// Number of memories stored for `subject`.
    fn count(
        &self,
        subject: &str,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}
