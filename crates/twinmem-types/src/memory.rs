//! Memory types for twinmem.
//!
//! These types model a fact as it flows through the dual-write pipeline:
//! the submitted [`Fact`], the [`VectorRecord`] persisted to the vector
//! store, the [`MemoryEntry`] view read back from it, and the per-path
//! [`WriteReport`] the coordinator returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// A text statement attributed to a subject.
///
/// Immutable once submitted; consumed once by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub subject: String,
    pub text: String,
}

impl Fact {
    pub fn new(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            text: text.into(),
        }
    }
}

/// Name and fixed vector width of a vector-store collection.
///
/// Established when the collection is created and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    pub name: String,
    pub dimension: usize,
}

impl CollectionDescriptor {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
        }
    }

    /// Whether a vector of `len` elements can be written to this collection.
    pub fn accepts(&self, len: usize) -> bool {
        len == self.dimension
    }
}

/// A vector-store row: one per accepted fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Internally generated identifier (UUIDv7).
    pub id: Uuid,
    pub subject: String,
    pub vector: Vec<f32>,
    /// The original fact text.
    pub text: String,
    /// Opaque metadata stored with the record.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Model that produced the (unadapted) embedding.
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}

impl VectorRecord {
    /// Build a record for `fact` with a freshly generated id.
    pub fn from_fact(fact: &Fact, vector: Vec<f32>, embedding_model: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            subject: fact.subject.clone(),
            vector,
            text: fact.text.clone(),
            payload: serde_json::Value::Null,
            embedding_model: embedding_model.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// A memory as read back from the vector store (no vector attached).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: Uuid,
    pub subject: String,
    /// The stored fact text.
    #[serde(rename = "memory")]
    pub text: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<&VectorRecord> for MemoryEntry {
    fn from(record: &VectorRecord) -> Self {
        Self {
            id: record.id,
            subject: record.subject.clone(),
            text: record.text.clone(),
            payload: record.payload.clone(),
            created_at: record.created_at,
        }
    }
}

/// Shape of a "get all memories" response.
///
/// Some backends return a bare list, others wrap it in an object with a
/// `results` field. Both deserialize into this type and collapse into a
/// single ordered list via [`RecallResponse::into_entries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecallResponse {
    List(Vec<MemoryEntry>),
    Wrapped { results: Vec<MemoryEntry> },
}

impl RecallResponse {
    pub fn into_entries(self) -> Vec<MemoryEntry> {
        match self {
            RecallResponse::Wrapped { results } => results,
            RecallResponse::List(entries) => entries,
        }
    }
}

/// Outcome of the vector path for one fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum VectorStatus {
    /// Record inserted under the given id.
    Written(Uuid),
    Failed(String),
}

impl VectorStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, VectorStatus::Written(_))
    }
}

impl fmt::Display for VectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorStatus::Written(id) => write!(f, "written ({id})"),
            VectorStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome of the graph path for one fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum GraphStatus {
    /// This many triples were appended to the graph store.
    Written(usize),
    /// Extraction produced no triples; the graph store was not called.
    Skipped,
    Failed(String),
}

impl GraphStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, GraphStatus::Written(_))
    }
}

impl fmt::Display for GraphStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphStatus::Written(n) => {
                write!(f, "written ({n} relation{})", if *n == 1 { "" } else { "s" })
            }
            GraphStatus::Skipped => write!(f, "skipped"),
            GraphStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-path result of writing one fact. Callers must inspect both halves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    pub subject: String,
    pub vector_status: VectorStatus,
    pub graph_status: GraphStatus,
}

impl WriteReport {
    /// Both paths persisted something (a skipped graph path does not count).
    pub fn fully_written(&self) -> bool {
        self.vector_status.is_written() && self.graph_status.is_written()
    }

    /// One path failed while the other did not.
    pub fn is_partial(&self) -> bool {
        let vector_failed = matches!(self.vector_status, VectorStatus::Failed(_));
        let graph_failed = matches!(self.graph_status, GraphStatus::Failed(_));
        vector_failed != graph_failed
    }
}

/// Stages a fact passes through inside the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Received,
    VectorWriteAttempted,
    GraphExtractAttempted,
    GraphWriteAttempted,
    GraphSkipped,
    Done,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStage::Received => write!(f, "received"),
            WriteStage::VectorWriteAttempted => write!(f, "vector_write_attempted"),
            WriteStage::GraphExtractAttempted => write!(f, "graph_extract_attempted"),
            WriteStage::GraphWriteAttempted => write!(f, "graph_write_attempted"),
            WriteStage::GraphSkipped => write!(f, "graph_skipped"),
            WriteStage::Done => write!(f, "done"),
        }
    }
}
