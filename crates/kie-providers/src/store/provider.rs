//! A SQLite-backed [`VectorStoreProvider`], one database file per base.

use std::path::Path;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::VectorStoreProvider;
use kie_domain::value_objects::{EmbeddedNode, KnowledgeItemId, NodeMetadata, QueryMode, QueryRequest, QueryResult};
use kie_domain::value_objects::node::VectorRecord;
use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;

use super::bm25;
use super::schema::{CREATE_EXTERNAL_ID_INDEX, CREATE_TABLE};
use super::similarity::{cosine, min_max_normalize};

/// A handle to one base's SQLite-backed vector store.
///
/// `add`/`delete`/`delete_by_external_id`/`clear_collection` take the inner
/// [`RwLock`]'s write guard; `query` takes its read guard. This serializes mutations
/// against each other and against in-flight queries, so a query started before
/// `clear_collection` either completes entirely against the old rows or waits and
/// observes the store fully cleared — never a partial view.
pub struct SqliteVectorStore {
    pool: RwLock<SqlitePool>,
}

impl SqliteVectorStore {
    /// Connect to (creating if absent) the SQLite file at `path` and apply the schema.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connect_and_init(path.as_ref()).await?;
        Ok(Self { pool: RwLock::new(pool) })
    }

    /// Block until every in-flight read or write guard on this store has released.
    /// Takes and immediately drops the write guard, so a caller that awaits this after
    /// removing its own reference to the store can be sure no other task is still
    /// mid-query or mid-write before touching the files underneath it.
    pub async fn quiesce(&self) {
        let _guard = self.pool.write().await;
    }

    async fn query_default(&self, pool: &SqlitePool, request: &QueryRequest) -> Result<QueryResult> {
        let Some(query_embedding) = &request.query_embedding else {
            return Err(Error::validation("default query mode requires query_embedding"));
        };
        let records = fetch_all(pool).await?;
        let mut scored: Vec<(VectorRecord, f32)> = records
            .into_iter()
            .filter(|r| r.embedding.len() == query_embedding.len())
            .map(|r| {
                let score = cosine(query_embedding, &r.embedding);
                (r, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(request.top_k());
        Ok(into_query_result(scored))
    }

    async fn query_bm25(&self, pool: &SqlitePool, request: &QueryRequest) -> Result<QueryResult> {
        let Some(query_str) = &request.query_str else {
            return Err(Error::validation("bm25 query mode requires query_str"));
        };
        let records = fetch_all(pool).await?;
        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let scores = bm25::score_all(query_str, &texts);
        let mut scored: Vec<(VectorRecord, f32)> = records.into_iter().zip(scores).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(request.top_k());
        Ok(into_query_result(scored))
    }

    async fn query_hybrid(&self, pool: &SqlitePool, request: &QueryRequest) -> Result<QueryResult> {
        let Some(query_embedding) = &request.query_embedding else {
            return Err(Error::validation("hybrid query mode requires query_embedding"));
        };
        let Some(query_str) = &request.query_str else {
            return Err(Error::validation("hybrid query mode requires query_str"));
        };
        let records = fetch_all(pool).await?;
        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let bm25_scores = min_max_normalize(&bm25::score_all(query_str, &texts));
        let vector_scores: Vec<f32> = records
            .iter()
            .map(|r| {
                if r.embedding.len() == query_embedding.len() {
                    cosine(query_embedding, &r.embedding)
                } else {
                    0.0
                }
            })
            .collect();
        let vector_scores = min_max_normalize(&vector_scores);

        let alpha = request.resolved_alpha();
        let mut scored: Vec<(VectorRecord, f32)> = records
            .into_iter()
            .zip(vector_scores)
            .zip(bm25_scores)
            .map(|((record, v), b)| (record, (alpha * v + (1.0 - alpha) * b).clamp(0.0, 1.0)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(request.top_k());
        Ok(into_query_result(scored))
    }
}

#[async_trait]
impl VectorStoreProvider for SqliteVectorStore {
    async fn add(&self, nodes: &[EmbeddedNode]) -> Result<Vec<String>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        let dims = nodes[0].vector.len();
        if nodes.iter().any(|n| n.vector.len() != dims) {
            return Err(Error::validation("mixed embedding dimensions within one insert batch"));
        }

        let pool = self.pool.write().await;

        if let Some(fixed) = fetch_fixed_dims(&pool).await? {
            if fixed != dims {
                return Err(Error::validation(format!(
                    "base is fixed at {fixed} embedding dimensions by earlier inserts, got {dims}"
                )));
            }
        }

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| Error::store(format!("begin insert transaction: {e}")))?;

        let mut row_ids = Vec::with_capacity(nodes.len());
        for embedded in nodes {
            let row_id = uuid::Uuid::new_v4().to_string();
            let metadata_json = serde_json::to_string(&embedded.node.metadata)
                .map_err(|e| Error::store(format!("serialize node metadata: {e}")))?;
            let embedding_blob = encode_embedding(&embedded.vector);
            #[allow(clippy::cast_possible_wrap)]
            let dims = dims as i64;

            sqlx::query(
                "INSERT INTO vector_rows (node_id, external_id, text, metadata_json, embedding_blob, dims) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&row_id)
            .bind(embedded.node.metadata.external_id.as_str())
            .bind(&embedded.node.text)
            .bind(&metadata_json)
            .bind(&embedding_blob)
            .bind(dims)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::store(format!("insert vector row: {e}")))?;

            row_ids.push(row_id);
        }

        tx.commit().await.map_err(|e| Error::store(format!("commit insert transaction: {e}")))?;
        Ok(row_ids)
    }

    async fn delete_by_external_id(&self, external_id: &KnowledgeItemId) -> Result<u64> {
        let pool = self.pool.write().await;
        let result = sqlx::query("DELETE FROM vector_rows WHERE external_id = ?")
            .bind(external_id.as_str())
            .execute(&*pool)
            .await
            .map_err(|e| Error::store(format!("delete by external id: {e}")))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, node_id: &str) -> Result<()> {
        let pool = self.pool.write().await;
        sqlx::query("DELETE FROM vector_rows WHERE node_id = ?")
            .bind(node_id)
            .execute(&*pool)
            .await
            .map_err(|e| Error::store(format!("delete row {node_id}: {e}")))?;
        Ok(())
    }

    async fn clear_collection(&self) -> Result<()> {
        let pool = self.pool.write().await;
        sqlx::query("DELETE FROM vector_rows")
            .execute(&*pool)
            .await
            .map_err(|e| Error::store(format!("clear collection: {e}")))?;
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResult> {
        let pool = self.pool.read().await;
        match request.mode {
            QueryMode::Default => self.query_default(&pool, &request).await,
            QueryMode::Bm25 => self.query_bm25(&pool, &request).await,
            QueryMode::Hybrid => self.query_hybrid(&pool, &request).await,
        }
    }
}

fn into_query_result(scored: Vec<(VectorRecord, f32)>) -> QueryResult {
    let (nodes, similarities) = scored.into_iter().unzip();
    QueryResult { nodes, similarities }
}

/// The embedding dimension already persisted for this base, if it has any rows. All
/// inserted rows carry the same `dims` value (enforced at insert time), so the first
/// row found fixes the base.
async fn fetch_fixed_dims(pool: &SqlitePool) -> Result<Option<usize>> {
    let row = sqlx::query("SELECT dims FROM vector_rows LIMIT 1")
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::store(format!("fetch fixed dims: {e}")))?;
    let Some(row) = row else {
        return Ok(None);
    };
    let dims: i64 = row.try_get("dims").map_err(|e| Error::store(e.to_string()))?;
    let dims = usize::try_from(dims).map_err(|e| Error::store(format!("stored dims out of range: {e}")))?;
    Ok(Some(dims))
}

async fn fetch_all(pool: &SqlitePool) -> Result<Vec<VectorRecord>> {
    let rows = sqlx::query("SELECT node_id, external_id, text, metadata_json, embedding_blob FROM vector_rows")
        .fetch_all(pool)
        .await
        .map_err(|e| Error::store(format!("fetch vector rows: {e}")))?;

    rows.iter()
        .map(|row| {
            let node_id: String = row.try_get("node_id").map_err(|e| Error::store(e.to_string()))?;
            let external_id: String = row.try_get("external_id").map_err(|e| Error::store(e.to_string()))?;
            let text: String = row.try_get("text").map_err(|e| Error::store(e.to_string()))?;
            let metadata_json: String = row.try_get("metadata_json").map_err(|e| Error::store(e.to_string()))?;
            let embedding_blob: Vec<u8> = row.try_get("embedding_blob").map_err(|e| Error::store(e.to_string()))?;

            let metadata: NodeMetadata = serde_json::from_str(&metadata_json)
                .map_err(|e| Error::store(format!("deserialize node metadata: {e}")))?;

            Ok(VectorRecord {
                node_id,
                external_id: KnowledgeItemId::new(external_id),
                text,
                metadata,
                embedding: decode_embedding(&embedding_blob),
            })
        })
        .collect()
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect()
}

async fn connect_and_init(path: &Path) -> Result<SqlitePool> {
    tracing::info!(path = %path.display(), "connecting to vector store database");

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io("create vector store directory", e))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());
    let pool = SqlitePool::connect(&db_url).await.map_err(|e| Error::store(format!("connect to {db_url}: {e}")))?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .execute(&pool)
        .await
        .map_err(|e| Error::store(format!("enable WAL mode: {e}")))?;
    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(&pool)
        .await
        .map_err(|e| Error::store(format!("set synchronous mode: {e}")))?;

    sqlx::query(CREATE_TABLE).execute(&pool).await.map_err(|e| Error::store(format!("create vector_rows table: {e}")))?;
    sqlx::query(CREATE_EXTERNAL_ID_INDEX)
        .execute(&pool)
        .await
        .map_err(|e| Error::store(format!("create external_id index: {e}")))?;

    Ok(pool)
}
