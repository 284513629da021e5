//! Application state wiring the stores, embedder and extractor together.
//!
//! `AppState` pins the coordinator's generics to the concrete infra
//! implementations selected by `config.toml`.

use std::path::PathBuf;

use anyhow::Context;

use twinmem_core::embedding::box_embedder::BoxEmbedder;
use twinmem_core::llm::box_provider::BoxLlmProvider;
use twinmem_core::memory::coordinator::{CoordinatorConfig, DualWriteCoordinator};
use twinmem_core::memory::extractor::LlmTripleExtractor;
use twinmem_core::memory::vector::VectorMemoryStore;
use twinmem_infra::config::{
    graph_database_url, llm_api_key, load_global_config, resolve_data_dir, vector_store_path,
};
use twinmem_infra::embedding::create_embedder;
use twinmem_infra::graph::sqlite::SqliteGraphStore;
use twinmem_infra::llm::create_provider;
use twinmem_infra::vector::lance::LanceVectorStore;
use twinmem_infra::vector::memory::LanceVectorMemoryStore;
use twinmem_types::config::GlobalConfig;

pub type ConcreteCoordinator = DualWriteCoordinator<
    BoxEmbedder,
    LanceVectorMemoryStore,
    SqliteGraphStore,
    LlmTripleExtractor<BoxLlmProvider>,
>;

pub struct AppState {
    pub config: GlobalConfig,
    /// The whole LanceDB database, for listing collections.
    pub vector_db: LanceVectorStore,
    pub coordinator: ConcreteCoordinator,
}

impl AppState {
    /// Initialize from the resolved data directory.
    pub async fn init() -> anyhow::Result<Self> {
        Self::init_at(resolve_data_dir(), serde_json::Value::Null).await
    }

    /// Initialize with `metadata` attached to every vector record written.
    pub async fn init_with_metadata(metadata: serde_json::Value) -> anyhow::Result<Self> {
        Self::init_at(resolve_data_dir(), metadata).await
    }

    pub async fn init_at(data_dir: PathBuf, metadata: serde_json::Value) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;

        let lance_path = vector_store_path(&data_dir, &config);
        let vector_db = LanceVectorStore::new(lance_path.clone())
            .await
            .with_context(|| format!("Failed to open vector store at {}", lance_path.display()))?;
        let vectors = LanceVectorMemoryStore::open(
            &vector_db,
            &config.vector_store.collection,
            config.vector_store.dimension,
        )
        .await
        .context("Failed to open vector collection")?;

        let graph_url = graph_database_url(&data_dir, &config);
        let graph = SqliteGraphStore::connect(&graph_url)
            .await
            .context("Failed to open graph store")?;

        let embedder =
            create_embedder(&config.embedder, &data_dir).context("Failed to create embedder")?;

        let provider =
            create_provider(&config.llm, llm_api_key()).context("Failed to create LLM provider")?;
        let extractor = LlmTripleExtractor::new(provider)
            .with_max_tokens(config.llm.max_tokens)
            .with_top_p(config.llm.top_p);

        let coordinator_config =
            CoordinatorConfig::for_collection(vectors.collection()).with_metadata(metadata);
        let coordinator =
            DualWriteCoordinator::with_config(embedder, vectors, graph, extractor, coordinator_config);

        tracing::debug!(
            data_dir = %data_dir.display(),
            collection = %config.vector_store.collection,
            "Application state initialized"
        );

        Ok(Self {
            config,
            vector_db,
            coordinator,
        })
    }
}
