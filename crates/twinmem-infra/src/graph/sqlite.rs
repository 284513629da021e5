//! SQLite-backed property graph.
//!
//! Implements `GraphStore` from `twinmem-core` using sqlx with split
//! read/write pools. Entities are deduplicated by label; relations are
//! appended as-is, with no schema for relation types.

use chrono::Utc;
use sqlx::Row;

use twinmem_core::memory::graph::GraphStore;
use twinmem_types::error::StoreError;
use twinmem_types::graph::GraphTriple;

use super::pool::DatabasePool;

/// SQLite-backed implementation of [`GraphStore`].
pub struct SqliteGraphStore {
    pool: DatabasePool,
}

impl SqliteGraphStore {
    /// Create a new graph store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Open (and migrate) the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = DatabasePool::new(database_url)
            .await
            .map_err(|e| StoreError::Connectivity(format!("{database_url}: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Number of distinct entities across all subjects.
    pub async fn entity_count(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entities")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count as u64)
    }
}

/// Map sqlx failures onto store errors, separating "cannot reach" from "query failed".
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Connectivity(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

/// Upsert an entity label and return its row id.
async fn upsert_entity(
    conn: &mut sqlx::SqliteConnection,
    label: &str,
    now: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO entities (label, created_at) VALUES (?, ?)
           ON CONFLICT (label) DO UPDATE SET label = excluded.label
           RETURNING id"#,
    )
    .bind(label)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    row.try_get("id")
}

impl GraphStore for SqliteGraphStore {
    async fn add_triples(&self, subject: &str, triples: &[GraphTriple]) -> Result<usize, StoreError> {
        if triples.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;

        for triple in triples {
            let source_id = upsert_entity(&mut tx, &triple.source, &now)
                .await
                .map_err(map_sqlx_error)?;
            let target_id = upsert_entity(&mut tx, &triple.target, &now)
                .await
                .map_err(map_sqlx_error)?;

            sqlx::query(
                r#"INSERT INTO relations (subject, source_id, relation, target_id, created_at)
                   VALUES (?, ?, ?, ?, ?)"#,
            )
            .bind(subject)
            .bind(source_id)
            .bind(&triple.relation)
            .bind(target_id)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        tracing::debug!(subject, count = triples.len(), "Appended graph relations");
        Ok(triples.len())
    }

    async fn triples_for_subject(&self, subject: &str) -> Result<Vec<GraphTriple>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT s.label AS source, r.relation AS relation, t.label AS target
               FROM relations r
               JOIN entities s ON s.id = r.source_id
               JOIN entities t ON t.id = r.target_id
               WHERE r.subject = ?
               ORDER BY r.id"#,
        )
        .bind(subject)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let mut triples = Vec::with_capacity(rows.len());
        for row in &rows {
            triples.push(GraphTriple {
                source: row.try_get("source").map_err(map_sqlx_error)?,
                relation: row.try_get("relation").map_err(map_sqlx_error)?,
                target: row.try_get("target").map_err(map_sqlx_error)?,
            });
        }

        Ok(triples)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.pool.ping().await.map_err(map_sqlx_error)
    }
}
