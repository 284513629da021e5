//! LanceDB database handle.
//!
//! `LanceVectorStore` wraps a `lancedb::Connection`; each memory collection
//! is one table, created on demand from an Arrow schema.

use std::path::PathBuf;
use std::sync::Arc;

use arrow_schema::Schema;

use twinmem_types::memory::CollectionDescriptor;

use super::schema::vector_dimension;

/// One LanceDB database directory holding any number of collections.
pub struct LanceVectorStore {
    db: lancedb::Connection,
}

impl LanceVectorStore {
    /// Open or create a LanceDB vector store at the given path.
    ///
    /// Creates the directory if it does not exist.
    pub async fn new(base_path: PathBuf) -> Result<Self, lancedb::Error> {
        std::fs::create_dir_all(&base_path).map_err(|e| lancedb::Error::CreateDir {
            path: base_path.display().to_string(),
            source: e,
        })?;

        let uri = base_path
            .to_str()
            .ok_or_else(|| lancedb::Error::InvalidInput {
                message: format!("Path contains invalid UTF-8: {}", base_path.display()),
            })?;

        let db = lancedb::connect(uri).execute().await?;

        Ok(Self { db })
    }

    /// Open `table_name`, creating it empty from `schema` if missing.
    ///
    /// An existing table is returned as-is; its schema is not compared.
    pub async fn ensure_table(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
    ) -> Result<lancedb::Table, lancedb::Error> {
        if let Some(table) = self.open_table(table_name).await? {
            return Ok(table);
        }

        tracing::info!(table = table_name, "Creating vector table");
        self.db.create_empty_table(table_name, schema).execute().await
    }

    /// Open an existing table, or `None` if it does not exist.
    pub async fn open_table(&self, table_name: &str) -> Result<Option<lancedb::Table>, lancedb::Error> {
        match self.db.open_table(table_name).execute().await {
            Ok(table) => Ok(Some(table)),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List all table names in the database.
    pub async fn table_names(&self) -> Result<Vec<String>, lancedb::Error> {
        self.db.table_names().execute().await
    }

    /// Every table that has a vector column, with the width it was created with.
    ///
    /// Tables without a fixed-size vector column are skipped.
    pub async fn collections(&self) -> Result<Vec<CollectionDescriptor>, lancedb::Error> {
        let mut collections = Vec::new();
        for name in self.table_names().await? {
            let Some(table) = self.open_table(&name).await? else {
                continue;
            };
            let schema = table.schema().await?;
            if let Some(dimension) = vector_dimension(&schema) {
                collections.push(CollectionDescriptor::new(name, dimension));
            }
        }
        Ok(collections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::schema::memory_schema;

    #[tokio::test]
    async fn test_connection_opens_successfully() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LanceVectorStore::new(temp_dir.path().to_path_buf())
            .await
            .expect("Failed to create vector store");

        let tables = store.table_names().await.expect("Failed to list tables");
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_table_creates_and_reopens() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LanceVectorStore::new(temp_dir.path().to_path_buf())
            .await
            .expect("Failed to create vector store");

        let table = store
            .ensure_table("memories", Arc::new(memory_schema(8)))
            .await
            .expect("Failed to create table");
        assert_eq!(table.count_rows(None).await.unwrap(), 0);

        // Reopening with a different schema keeps the original one.
        let reopened = store
            .ensure_table("memories", Arc::new(memory_schema(16)))
            .await
            .expect("Failed to reopen table");
        let schema = reopened.schema().await.unwrap();
        assert_eq!(vector_dimension(&schema), Some(8));
    }

    #[tokio::test]
    async fn test_open_missing_table_is_none() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LanceVectorStore::new(temp_dir.path().to_path_buf())
            .await
            .expect("Failed to create vector store");

        assert!(store.open_table("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collections_report_dimensions() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LanceVectorStore::new(temp_dir.path().to_path_buf())
            .await
            .expect("Failed to create vector store");

        store
            .ensure_table("memories", Arc::new(memory_schema(1536)))
            .await
            .unwrap();
        store
            .ensure_table("agent_mem_1024", Arc::new(memory_schema(1024)))
            .await
            .unwrap();

        let mut collections = store.collections().await.unwrap();
        collections.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            collections,
            vec![
                CollectionDescriptor::new("agent_mem_1024", 1024),
                CollectionDescriptor::new("memories", 1536),
            ]
        );
    }
}
