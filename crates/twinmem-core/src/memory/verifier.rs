//! Read-back verification of the vector path.

use twinmem_types::error::StoreError;
use twinmem_types::memory::MemoryEntry;

use super::vector::VectorMemoryStore;

/// Queries the vector-backed memory for everything stored under a subject.
///
/// Backends answer "get all" with either a bare list or a `{"results": [...]}`
/// wrapper; the verifier always hands back a flat, ordered list. An empty list
/// is a valid outcome.
pub struct ReadBackVerifier<'a, V> {
    store: &'a V,
}

impl<'a, V: VectorMemoryStore> ReadBackVerifier<'a, V> {
    pub fn new(store: &'a V) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "verify_read_back", skip(self))]
    pub async fn verify(&self, subject: &str) -> Result<Vec<MemoryEntry>, StoreError> {
        let entries = self.store.get_all(subject).await?.into_entries();
        tracing::debug!(count = entries.len(), "Read back memories");
        Ok(entries)
    }
}
