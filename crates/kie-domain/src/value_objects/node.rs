//! Chunked text nodes produced by readers and consumed by the embedding pipeline and
//! vector store.

use crate::value_objects::ids::KnowledgeItemId;
use crate::value_objects::item::KnowledgeItemKind;

/// Metadata attached to every node after reader post-processing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeMetadata {
    /// Equal to the originating item's id on every node it produces.
    pub external_id: KnowledgeItemId,
    /// File path, URL, or the literal `"note"`.
    pub source: String,
    /// The originating item's kind.
    pub item_type: KnowledgeItemKind,
    /// Reader-specific free-form fields (e.g. heading path for markdown chunks).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NodeMetadata {
    /// Build metadata with no extra fields.
    #[must_use]
    pub fn new(external_id: KnowledgeItemId, source: impl Into<String>, item_type: KnowledgeItemKind) -> Self {
        Self {
            external_id,
            source: source.into(),
            item_type,
            extra: serde_json::Map::new(),
        }
    }
}

/// A chunk of text emitted by a reader, before embedding.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Node {
    /// Chunked text content.
    pub text: String,
    /// Metadata describing the chunk's provenance.
    pub metadata: NodeMetadata,
}

/// A node with its embedding attached.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmbeddedNode {
    /// The source node.
    pub node: Node,
    /// Embedding vector; length must match the owning base's fixed dimensions.
    pub vector: Vec<f32>,
}

/// A row as stored and returned by a vector store.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VectorRecord {
    /// Internally generated id for this stored row.
    pub node_id: String,
    /// The owning item's id, used for bulk deletion.
    pub external_id: KnowledgeItemId,
    /// Stored chunk text.
    pub text: String,
    /// Stored metadata.
    pub metadata: NodeMetadata,
    /// Stored embedding vector.
    pub embedding: Vec<f32>,
}
