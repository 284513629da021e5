//! Dual-write coordinator.
//!
//! Writes each fact into two independently-schemed stores:
//!
//! - **vector path**: embed the text through a [`DimensionAdapter`] and insert
//!   a [`VectorRecord`] into the fixed-dimension collection
//! - **graph path**: extract triples through the LLM and append them to the
//!   graph store, or skip the store entirely when nothing was extracted
//!
//! The two paths are independent. A failure on one never prevents the other
//! from running, there is no rollback, and `write` reports both outcomes
//! instead of returning an error.

use serde_json::Value;

use twinmem_types::embedding::EmbedOptions;
use twinmem_types::memory::{
    CollectionDescriptor, Fact, GraphStatus, VectorRecord, VectorStatus, WriteReport, WriteStage,
};

use crate::embedding::adapter::DimensionAdapter;
use crate::embedding::embedder::Embedder;

use super::extractor::TripleExtractor;
use super::graph::GraphStore;
use super::vector::VectorMemoryStore;
use super::verifier::ReadBackVerifier;

/// Explicit per-coordinator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Width every embedding is padded to before insertion.
    pub target_dimension: usize,
    /// Extra arguments forwarded to the embedder on every call.
    pub embed_options: EmbedOptions,
    /// Opaque payload stored alongside every vector record.
    pub metadata: Value,
}

impl CoordinatorConfig {
    /// Settings matching `collection`, tagging embed calls as an "add".
    pub fn for_collection(collection: &CollectionDescriptor) -> Self {
        Self {
            target_dimension: collection.dimension,
            embed_options: EmbedOptions::for_action("add"),
            metadata: Value::Null,
        }
    }

    pub fn with_embed_options(mut self, embed_options: EmbedOptions) -> Self {
        self.embed_options = embed_options;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Writes facts to a vector store and a graph store, reporting each path.
pub struct DualWriteCoordinator<E, V, G, X> {
    embedder: DimensionAdapter<E>,
    vector_store: V,
    graph_store: G,
    extractor: X,
    config: CoordinatorConfig,
}

impl<E, V, G, X> DualWriteCoordinator<E, V, G, X>
where
    E: Embedder,
    V: VectorMemoryStore,
    G: GraphStore,
    X: TripleExtractor,
{
    /// Build a coordinator whose settings follow the vector store's collection.
    pub fn new(embedder: E, vector_store: V, graph_store: G, extractor: X) -> Self {
        let config = CoordinatorConfig::for_collection(vector_store.collection());
        Self::with_config(embedder, vector_store, graph_store, extractor, config)
    }

    pub fn with_config(
        embedder: E,
        vector_store: V,
        graph_store: G,
        extractor: X,
        config: CoordinatorConfig,
    ) -> Self {
        let collection = vector_store.collection();
        if config.target_dimension != collection.dimension {
            tracing::warn!(
                collection = %collection.name,
                collection_dim = collection.dimension,
                target_dim = config.target_dimension,
                "Target dimension differs from collection; vector writes will be rejected"
            );
        }
        if let Some(native) = embedder.dimension() {
            if native < config.target_dimension {
                tracing::info!(
                    model = embedder.model_name(),
                    native_dim = native,
                    target_dim = config.target_dimension,
                    "Embeddings will be zero-padded to the collection dimension"
                );
            }
        }

        Self {
            embedder: DimensionAdapter::new(embedder, config.target_dimension),
            vector_store,
            graph_store,
            extractor,
            config,
        }
    }

    /// Write one fact to both stores.
    ///
    /// Never fails; inspect both statuses of the returned report.
    #[tracing::instrument(name = "dual_write", skip(self, fact), fields(subject = %fact.subject))]
    pub async fn write(&self, fact: &Fact) -> WriteReport {
        log_stage(WriteStage::Received);

        let vector_status = match self.write_vector(fact).await {
            Ok(status) => status,
            Err(reason) => {
                tracing::warn!(%reason, "Vector write failed");
                VectorStatus::Failed(reason)
            }
        };
        log_stage(WriteStage::VectorWriteAttempted);

        let graph_status = self.write_graph(fact).await;
        if let GraphStatus::Failed(reason) = &graph_status {
            tracing::warn!(%reason, "Graph write failed");
        }

        log_stage(WriteStage::Done);
        tracing::info!(
            vector = %vector_status,
            graph = %graph_status,
            "Fact processed"
        );

        WriteReport {
            subject: fact.subject.clone(),
            vector_status,
            graph_status,
        }
    }

    /// Write facts one at a time, in order.
    pub async fn write_all(&self, facts: &[Fact]) -> Vec<WriteReport> {
        let mut reports = Vec::with_capacity(facts.len());
        for fact in facts {
            reports.push(self.write(fact).await);
        }
        reports
    }

    async fn write_vector(&self, fact: &Fact) -> Result<VectorStatus, String> {
        let vector = self
            .embedder
            .embed(&fact.text, &self.config.embed_options)
            .await
            .map_err(|e| format!("embedding failed: {e}"))?;

        let record = VectorRecord::from_fact(fact, vector, self.embedder.model_name())
            .with_payload(self.config.metadata.clone());

        self.vector_store
            .insert(&record)
            .await
            .map_err(|e| e.to_string())?;

        tracing::debug!(id = %record.id, dim = record.vector.len(), "Vector record inserted");
        Ok(VectorStatus::Written(record.id))
    }

    async fn write_graph(&self, fact: &Fact) -> GraphStatus {
        let extracted = self.extractor.extract(&fact.text).await;
        log_stage(WriteStage::GraphExtractAttempted);

        let triples = match extracted {
            Ok(triples) => triples,
            Err(e) => return GraphStatus::Failed(format!("extraction failed: {e}")),
        };

        if triples.is_empty() {
            log_stage(WriteStage::GraphSkipped);
            return GraphStatus::Skipped;
        }

        let written = self.graph_store.add_triples(&fact.subject, &triples).await;
        log_stage(WriteStage::GraphWriteAttempted);

        match written {
            Ok(count) => GraphStatus::Written(count),
            Err(e) => GraphStatus::Failed(e.to_string()),
        }
    }

    /// Read-back verifier over this coordinator's vector store.
    pub fn verifier(&self) -> ReadBackVerifier<'_, V> {
        ReadBackVerifier::new(&self.vector_store)
    }

    pub fn vector_store(&self) -> &V {
        &self.vector_store
    }

    pub fn graph_store(&self) -> &G {
        &self.graph_store
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }
}

fn log_stage(stage: WriteStage) {
    tracing::debug!(%stage, "Write stage");
}
