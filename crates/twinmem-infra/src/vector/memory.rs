//! LanceDB-backed vector memory collection.
//!
//! Implements `VectorMemoryStore` from `twinmem-core`. A collection is a
//! single LanceDB table whose vector width is fixed when the table is first
//! created; reopening an existing table adopts the width stored in its
//! schema, never the one requested. Inserts with any other width fail with
//! `StoreError::DimensionMismatch` before touching the table.

use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use uuid::Uuid;

use twinmem_core::memory::vector::VectorMemoryStore;
use twinmem_types::error::StoreError;
use twinmem_types::memory::{CollectionDescriptor, MemoryEntry, RecallResponse, VectorRecord};

use super::lance::LanceVectorStore;
use super::schema::{memory_schema, vector_dimension};

/// LanceDB-backed implementation of [`VectorMemoryStore`].
pub struct LanceVectorMemoryStore {
    table: lancedb::Table,
    collection: CollectionDescriptor,
}

impl LanceVectorMemoryStore {
    /// Open collection `name`, creating it `dimension` wide if it does not exist.
    ///
    /// An existing collection keeps the width it was created with; a
    /// differing `dimension` only logs a warning.
    pub async fn open(
        store: &LanceVectorStore,
        name: &str,
        dimension: usize,
    ) -> Result<Self, StoreError> {
        let table = store
            .ensure_table(name, Arc::new(memory_schema(dimension)))
            .await
            .map_err(|e| StoreError::Connectivity(format!("Failed to open collection {name}: {e}")))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to read schema of {name}: {e}")))?;
        let actual = vector_dimension(&schema).ok_or_else(|| {
            StoreError::Query(format!("Collection {name} has no fixed-size vector column"))
        })?;

        if actual != dimension {
            tracing::warn!(
                collection = name,
                requested = dimension,
                existing = actual,
                "Collection already exists with a different dimension; keeping existing"
            );
        }

        Ok(Self {
            table,
            collection: CollectionDescriptor::new(name, actual),
        })
    }

    fn subject_filter(subject: &str) -> String {
        format!("subject = '{}'", subject.replace('\'', "''"))
    }

    /// Build an Arrow RecordBatch holding a single record.
    fn build_record_batch(&self, record: &VectorRecord) -> Result<RecordBatch, StoreError> {
        let schema = Arc::new(memory_schema(self.collection.dimension));

        let payload = if record.payload.is_null() {
            None
        } else {
            Some(record.payload.to_string())
        };

        let values = Float32Array::from(record.vector.clone());
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.collection.dimension as i32,
            Arc::new(values),
            None,
        )
        .map_err(|e| StoreError::Query(format!("Failed to build vector column: {e}")))?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![record.id.to_string()])),
                Arc::new(StringArray::from(vec![record.subject.clone()])),
                Arc::new(StringArray::from(vec![record.text.clone()])),
                Arc::new(StringArray::from(vec![payload])),
                Arc::new(StringArray::from(vec![record.embedding_model.clone()])),
                Arc::new(StringArray::from(vec![record.created_at.to_rfc3339()])),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| StoreError::Query(format!("Failed to build record batch: {e}")))
    }

    /// Parse Arrow RecordBatch rows into memory entries (vector column skipped).
    fn record_batch_to_entries(batch: &RecordBatch) -> Result<Vec<MemoryEntry>, StoreError> {
        let num_rows = batch.num_rows();
        if num_rows == 0 {
            return Ok(vec![]);
        }

        let id_col = string_column(batch, "id")?;
        let subject_col = string_column(batch, "subject")?;
        let text_col = string_column(batch, "text")?;
        let payload_col = string_column(batch, "payload")?;
        let created_at_col = string_column(batch, "created_at")?;

        let mut entries = Vec::with_capacity(num_rows);
        for i in 0..num_rows {
            let id = Uuid::parse_str(id_col.value(i)).unwrap_or_else(|_| Uuid::nil());
            let payload = if payload_col.is_null(i) {
                serde_json::Value::Null
            } else {
                serde_json::from_str(payload_col.value(i)).unwrap_or(serde_json::Value::Null)
            };
            let created_at = DateTime::parse_from_rfc3339(created_at_col.value(i))
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            entries.push(MemoryEntry {
                id,
                subject: subject_col.value(i).to_string(),
                text: text_col.value(i).to_string(),
                payload,
                created_at,
            });
        }

        Ok(entries)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, StoreError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::Query(format!("{name} column missing or not Utf8")))
}

impl VectorMemoryStore for LanceVectorMemoryStore {
    fn collection(&self) -> &CollectionDescriptor {
        &self.collection
    }

    async fn insert(&self, record: &VectorRecord) -> Result<(), StoreError> {
        if !self.collection.accepts(record.vector.len()) {
            return Err(StoreError::DimensionMismatch {
                collection: self.collection.name.clone(),
                expected: self.collection.dimension,
                actual: record.vector.len(),
            });
        }

        let batch = self.build_record_batch(record)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        self.table
            .add(reader)
            .execute()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to add memory: {e}")))?;

        Ok(())
    }

    async fn get_all(&self, subject: &str) -> Result<RecallResponse, StoreError> {
        let results = self
            .table
            .query()
            .only_if(Self::subject_filter(subject))
            .execute()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to query memories: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to collect results: {e}")))?;

        let mut entries = Vec::new();
        for batch in &batches {
            entries.extend(Self::record_batch_to_entries(batch)?);
        }
        // UUIDv7 ids sort by creation time.
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(RecallResponse::List(entries))
    }

    async fn count(&self, subject: &str) -> Result<u64, StoreError> {
        let count = self
            .table
            .count_rows(Some(Self::subject_filter(subject)))
            .await
            .map_err(|e| StoreError::Query(format!("Failed to count rows: {e}")))?;

        Ok(count as u64)
    }
}
