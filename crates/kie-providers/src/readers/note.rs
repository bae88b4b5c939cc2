//! Reads a free-form note item: `data.content` is treated as plain text and split with
//! the default chunker.

use async_trait::async_trait;
use kie_domain::error::Result;
use kie_domain::ports::{ContentReader, ReaderContext};
use kie_domain::value_objects::{KnowledgeItemData, KnowledgeItemKind, Node, NodeMetadata};

use super::chunker::split_fixed;

/// Reader for [`KnowledgeItemKind::Note`] items.
pub struct NoteReader;

#[async_trait]
impl ContentReader for NoteReader {
    async fn read(&self, context: ReaderContext<'_>) -> Result<Vec<Node>> {
        let KnowledgeItemData::Note { content, source_url } = &context.item.data else {
            return Ok(Vec::new());
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let source = source_url.clone().unwrap_or_else(|| "note".to_owned());
        let chunks = split_fixed(content, context.chunk_size, context.chunk_overlap);

        Ok(chunks
            .into_iter()
            .map(|text| Node {
                text,
                metadata: NodeMetadata::new(context.item.id.clone(), source.clone(), KnowledgeItemKind::Note),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kie_domain::value_objects::KnowledgeItem;
    use tokio_util::sync::CancellationToken;

    fn item(content: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: "note-1".into(),
            kind: KnowledgeItemKind::Note,
            data: KnowledgeItemData::Note {
                content: content.to_owned(),
                source_url: None,
            },
        }
    }

    #[tokio::test]
    async fn empty_content_returns_empty_result() {
        let item = item("   ");
        let mut progress = |_: u8| {};
        let nodes = NoteReader
            .read(ReaderContext {
                item: &item,
                chunk_size: 1024,
                chunk_overlap: 20,
                cancellation: CancellationToken::new(),
                progress: &mut progress,
            })
            .await
            .unwrap();
        assert!(nodes.is_empty());
    }

    #[tokio::test]
    async fn non_empty_content_is_chunked_and_tagged() {
        let item = item("hello world");
        let mut progress = |_: u8| {};
        let nodes = NoteReader
            .read(ReaderContext {
                item: &item,
                chunk_size: 1024,
                chunk_overlap: 20,
                cancellation: CancellationToken::new(),
                progress: &mut progress,
            })
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].metadata.external_id.as_str(), "note-1");
        assert_eq!(nodes[0].metadata.source, "note");
    }
}
