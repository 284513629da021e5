//! Health commands: connectivity check and collection listing.

use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use twinmem_core::embedding::embedder::Embedder;
use twinmem_core::memory::graph::GraphStore;
use twinmem_core::memory::vector::VectorMemoryStore;
use twinmem_infra::config::{
    graph_database_url, llm_api_key, load_global_config, vector_store_path,
};
use twinmem_infra::embedding::create_embedder;
use twinmem_infra::graph::sqlite::SqliteGraphStore;
use twinmem_infra::llm::{create_provider, probe_provider};
use twinmem_infra::vector::lance::LanceVectorStore;
use twinmem_infra::vector::memory::LanceVectorMemoryStore;
use twinmem_types::config::GlobalConfig;
use twinmem_types::embedding::EmbedOptions;
use twinmem_types::memory::CollectionDescriptor;

use crate::state::AppState;

/// How an embedder's native width relates to the collection width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionFit {
    Exact,
    /// Vectors are zero-padded up to the collection width.
    Padded,
    /// Vectors are wider than the collection; inserts will be rejected.
    TooWide,
}

impl DimensionFit {
    pub fn classify(native: usize, collection: usize) -> Self {
        match native.cmp(&collection) {
            std::cmp::Ordering::Equal => DimensionFit::Exact,
            std::cmp::Ordering::Less => DimensionFit::Padded,
            std::cmp::Ordering::Greater => DimensionFit::TooWide,
        }
    }
}

#[derive(Debug, Serialize)]
struct Probe {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<E: std::fmt::Display> From<Result<(), E>> for Probe {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Probe {
                ok: true,
                error: None,
            },
            Err(e) => Probe {
                ok: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckReport {
    data_dir: String,
    collection: String,
    collection_dimension: usize,
    vector_store: Probe,
    graph_store: Probe,
    embedder_model: String,
    embedder: Probe,
    #[serde(skip_serializing_if = "Option::is_none")]
    native_dimension: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension_fit: Option<DimensionFit>,
    llm_provider: String,
    llm: Probe,
}

impl CheckReport {
    fn healthy(&self) -> bool {
        self.vector_store.ok
            && self.graph_store.ok
            && self.embedder.ok
            && self.llm.ok
            && self.dimension_fit != Some(DimensionFit::TooWide)
    }
}

/// Open the vector collection and count rows for a dummy subject.
async fn probe_vector_store(
    data_dir: &Path,
    config: &GlobalConfig,
) -> (CollectionDescriptor, Probe) {
    let requested = CollectionDescriptor::new(
        config.vector_store.collection.clone(),
        config.vector_store.dimension,
    );

    let db = match LanceVectorStore::new(vector_store_path(data_dir, config)).await {
        Ok(db) => db,
        Err(e) => return (requested, Err::<(), _>(e).into()),
    };
    let opened = LanceVectorMemoryStore::open(&db, &requested.name, requested.dimension).await;
    let store = match opened {
        Ok(store) => store,
        Err(e) => return (requested, Err::<(), _>(e).into()),
    };

    let probe: Probe = store.count("__twinmem_check__").await.map(|_| ()).into();
    (store.collection().clone(), probe)
}

async fn probe_graph_store(data_dir: &Path, config: &GlobalConfig) -> Probe {
    match SqliteGraphStore::connect(&graph_database_url(data_dir, config)).await {
        Ok(graph) => graph.ping().await.into(),
        Err(e) => Err::<(), _>(e).into(),
    }
}

/// Embed a short text without extra arguments; returns the native width on success.
async fn probe_embedder(data_dir: &Path, config: &GlobalConfig) -> (Probe, Option<usize>) {
    let embedder = match create_embedder(&config.embedder, data_dir) {
        Ok(embedder) => embedder,
        Err(e) => return (Err::<(), _>(e).into(), config.embedder.native_dimension),
    };
    match embedder
        .embed("connectivity check", &EmbedOptions::none())
        .await
    {
        Ok(vector) => (Ok::<(), String>(()).into(), Some(vector.len())),
        Err(e) => (Err::<(), _>(e).into(), embedder.dimension()),
    }
}

/// The probe talks to the raw provider: OpenAI rejects JSON mode unless the
/// prompt mentions JSON.
async fn probe_llm(config: &GlobalConfig) -> Probe {
    match create_provider(&config.llm, llm_api_key()) {
        Ok(provider) => probe_provider(&provider).await.into(),
        Err(e) => Err::<(), _>(e).into(),
    }
}

/// Probe every backend independently so one broken store still yields a report.
async fn gather_report(data_dir: &Path) -> CheckReport {
    let config = load_global_config(data_dir).await;

    let (collection, vector_store) = probe_vector_store(data_dir, &config).await;
    let graph_store = probe_graph_store(data_dir, &config).await;
    let (embedder, native_dimension) = probe_embedder(data_dir, &config).await;
    let dimension_fit = native_dimension.map(|n| DimensionFit::classify(n, collection.dimension));
    let llm = probe_llm(&config).await;

    CheckReport {
        data_dir: data_dir.display().to_string(),
        collection: collection.name,
        collection_dimension: collection.dimension,
        vector_store,
        graph_store,
        embedder_model: config.embedder.model.clone(),
        embedder,
        native_dimension,
        dimension_fit,
        llm_provider: format!("{} ({})", config.llm.provider, config.llm.model),
        llm,
    }
}

/// Probe every backend the coordinator talks to.
pub async fn check(data_dir: &Path, json: bool) -> Result<()> {
    let report = gather_report(data_dir).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.healthy() {
        bail!("health check failed");
    }
    Ok(())
}

fn print_report(report: &CheckReport) {
    let mark = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };
    let detail = |probe: &Probe| match &probe.error {
        Some(e) => format!(" ({})", style(e).red()),
        None => String::new(),
    };

    println!();
    println!("  Data directory {}", style(&report.data_dir).dim());
    println!(
        "  Collection '{}' ({} dimensions)",
        style(&report.collection).cyan().bold(),
        report.collection_dimension
    );
    println!();
    println!(
        "  {} Vector store{}",
        mark(report.vector_store.ok),
        detail(&report.vector_store)
    );
    println!(
        "  {} Graph store{}",
        mark(report.graph_store.ok),
        detail(&report.graph_store)
    );
    println!(
        "  {} Embedder {}{}",
        mark(report.embedder.ok),
        style(&report.embedder_model).cyan(),
        detail(&report.embedder)
    );
    println!(
        "  {} LLM {}{}",
        mark(report.llm.ok),
        style(&report.llm_provider).cyan(),
        detail(&report.llm)
    );

    if let (Some(native), Some(fit)) = (report.native_dimension, report.dimension_fit) {
        match fit {
            DimensionFit::Exact => {
                println!("  {} Embedding width {native} matches", mark(true));
            }
            DimensionFit::Padded => println!(
                "  {} Embedding width {native} is zero-padded to {}",
                style("!").yellow().bold(),
                report.collection_dimension
            ),
            DimensionFit::TooWide => println!(
                "  {} Embedding width {native} exceeds {}; vector writes will be rejected",
                mark(false),
                report.collection_dimension
            ),
        }
    }
    println!();
}

/// List every vector collection with its dimension.
pub async fn collections(state: &AppState, json: bool) -> Result<()> {
    let collections = state
        .vector_db
        .collections()
        .await
        .context("Failed to list vector collections")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collections)?);
        return Ok(());
    }

    let active = &state.config.vector_store.collection;

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Collection").fg(Color::White),
        Cell::new("Dimension").fg(Color::White),
        Cell::new("").fg(Color::White),
    ]);
    for c in &collections {
        let marker = if &c.name == active { "active" } else { "" };
        table.add_row(vec![
            Cell::new(&c.name).fg(Color::Cyan),
            Cell::new(c.dimension).fg(Color::Yellow),
            Cell::new(marker).fg(Color::Green),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_fit() {
        assert_eq!(DimensionFit::classify(1536, 1536), DimensionFit::Exact);
        assert_eq!(DimensionFit::classify(1024, 1536), DimensionFit::Padded);
        assert_eq!(DimensionFit::classify(2048, 1536), DimensionFit::TooWide);
    }

    #[test]
    fn test_probe_from_result() {
        let ok: Probe = Ok::<(), String>(()).into();
        assert!(ok.ok);
        let failed: Probe = Err::<(), _>("connection refused").into();
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_too_wide_embedder_is_unhealthy() {
        let ok = || Probe {
            ok: true,
            error: None,
        };
        let mut report = CheckReport {
            data_dir: "/tmp/twinmem".into(),
            collection: "memories".into(),
            collection_dimension: 1536,
            vector_store: ok(),
            graph_store: ok(),
            embedder_model: "bge-m3:latest".into(),
            embedder: ok(),
            native_dimension: Some(1024),
            dimension_fit: Some(DimensionFit::Padded),
            llm_provider: "ollama (qwen2.5:7b)".into(),
            llm: ok(),
        };
        assert!(report.healthy());

        report.dimension_fit = Some(DimensionFit::TooWide);
        assert!(!report.healthy());
    }

    #[tokio::test]
    async fn test_broken_graph_store_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
[graph_store]
url = "sqlite:///nonexistent-dir/deeper/graph.db?mode=rw"

[llm]
base_url = "http://127.0.0.1:1"

[embedder]
base_url = "http://127.0.0.1:1"
"#,
        )
        .unwrap();

        let report = gather_report(dir.path()).await;

        assert!(report.vector_store.ok, "{:?}", report.vector_store.error);
        assert_eq!(report.collection, "memories");
        assert_eq!(report.collection_dimension, 1536);
        assert!(!report.graph_store.ok);
        assert!(report.graph_store.error.is_some());
        assert!(!report.embedder.ok);
        assert!(!report.llm.ok);
        assert!(!report.healthy());
    }
}
