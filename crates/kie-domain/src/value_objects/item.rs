//! Knowledge item shapes.
//!
//! Items are immutable inputs to the engine; their lifecycle status is owned by the
//! external catalog that produced them.

use std::path::PathBuf;

use crate::value_objects::ids::KnowledgeItemId;

/// The kind of content an item carries, driving reader selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeItemKind {
    /// A single file on disk.
    File,
    /// A directory to walk recursively.
    Directory,
    /// A single web page.
    Url,
    /// A sitemap whose listed pages are each fetched individually.
    Sitemap,
    /// Free-form text supplied directly by the caller.
    Note,
}

/// File-specific metadata carried alongside a file item.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FileDescriptor {
    /// Path to the file on disk.
    pub path: PathBuf,
    /// Lowercase extension without the leading dot, if any.
    #[serde(default)]
    pub ext: Option<String>,
    /// Size in bytes, as last observed by the caller.
    #[serde(default)]
    pub size: Option<u64>,
}

/// The type-specific payload of a [`crate::entities::KnowledgeItem`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KnowledgeItemData {
    /// Payload for [`KnowledgeItemKind::File`].
    File {
        /// Descriptor of the file to read.
        file: FileDescriptor,
    },
    /// Payload for [`KnowledgeItemKind::Directory`].
    Directory {
        /// Path to walk.
        path: PathBuf,
    },
    /// Payload for [`KnowledgeItemKind::Url`].
    Url {
        /// Page to fetch.
        url: String,
    },
    /// Payload for [`KnowledgeItemKind::Sitemap`].
    Sitemap {
        /// Sitemap to fetch and expand.
        url: String,
    },
    /// Payload for [`KnowledgeItemKind::Note`].
    Note {
        /// Raw note text.
        content: String,
        /// Origin the note was copied from, if any.
        #[serde(default)]
        source_url: Option<String>,
    },
}

/// An immutable unit of ingestion input.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeItem {
    /// Caller-supplied id, reused as `external_id` on every node the item produces.
    pub id: KnowledgeItemId,
    /// Kind discriminant, kept alongside `data` for readers that only need the tag.
    #[serde(rename = "type")]
    pub kind: KnowledgeItemKind,
    /// Type-specific payload.
    pub data: KnowledgeItemData,
}
