//! Vector store query shapes.

/// Default `topK` when a caller omits `similarity_top_k`.
pub const DEFAULT_DOCUMENT_COUNT: usize = 6;

/// Default hybrid mixing weight.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Selects how a query scores candidate rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Cosine similarity over the query embedding.
    #[default]
    Default,
    /// Lexical BM25 ranking over the query string.
    Bm25,
    /// Weighted combination of normalized vector similarity and normalized BM25 score.
    Hybrid,
}

/// A query against a single base's vector store.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Embedding to compare against, required for `default`/`hybrid` modes.
    pub query_embedding: Option<Vec<f32>>,
    /// Text to compare against, required for `bm25`/`hybrid` modes.
    pub query_str: Option<String>,
    /// Number of results to return; defaults to [`DEFAULT_DOCUMENT_COUNT`].
    pub similarity_top_k: Option<usize>,
    /// Scoring mode.
    pub mode: QueryMode,
    /// Hybrid mixing weight; clamped to `[0, 1]`. Defaults to [`DEFAULT_ALPHA`].
    pub alpha: Option<f32>,
}

impl QueryRequest {
    /// Resolved `topK`, applying the default when unset.
    #[must_use]
    pub fn top_k(&self) -> usize {
        self.similarity_top_k.unwrap_or(DEFAULT_DOCUMENT_COUNT)
    }

    /// Resolved hybrid weight, clamped to `[0, 1]`.
    #[must_use]
    pub fn resolved_alpha(&self) -> f32 {
        self.alpha.unwrap_or(DEFAULT_ALPHA).clamp(0.0, 1.0)
    }
}

/// Result of a vector store query: parallel arrays, `nodes[i]` scored by `similarities[i]`.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Matched records, ordered by descending score; ties break by insertion order.
    pub nodes: Vec<crate::value_objects::node::VectorRecord>,
    /// Scores parallel to `nodes`.
    pub similarities: Vec<f32>,
}
