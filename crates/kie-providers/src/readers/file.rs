//! Reads a single file item, dispatching on extension: `.md` gets heading-based
//! segmentation, `.pdf`/`.csv`/`.docx`/`.html`/`.htm`/`.json`/`.epub` get a structured
//! loader followed by the fixed-size chunker, and anything else is loaded as plain text
//! and chunked the same way. A missing file is an empty result, not an error.

use async_trait::async_trait;
use kie_domain::error::Result;
use kie_domain::ports::{ContentReader, ReaderContext};
use kie_domain::value_objects::{KnowledgeItemData, KnowledgeItemKind, Node, NodeMetadata};

use super::chunker::split_fixed;
use super::loaders::load_document;
use super::markdown::split_by_heading;

/// Reader for [`KnowledgeItemKind::File`] items.
pub struct FileReader;

fn extension_of(file: &kie_domain::value_objects::FileDescriptor) -> String {
    file.ext.clone().unwrap_or_else(|| {
        file.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    })
}

#[async_trait]
impl ContentReader for FileReader {
    async fn read(&self, context: ReaderContext<'_>) -> Result<Vec<Node>> {
        let KnowledgeItemData::File { file } = &context.item.data else {
            return Ok(Vec::new());
        };

        if !tokio::fs::try_exists(&file.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let source = file.path.display().to_string();
        let ext = extension_of(file);

        if ext == "md" {
            let text = match tokio::fs::read_to_string(&file.path).await {
                Ok(text) => text,
                Err(_) => return Ok(Vec::new()),
            };
            let sections = split_by_heading(&text);
            return Ok(sections
                .into_iter()
                .map(|section| {
                    let mut metadata = NodeMetadata::new(context.item.id.clone(), source.clone(), KnowledgeItemKind::File);
                    if !section.heading_path.is_empty() {
                        metadata.extra.insert(
                            "heading_path".to_owned(),
                            serde_json::Value::String(section.heading_path.join(" / ")),
                        );
                    }
                    Node {
                        text: section.text,
                        metadata,
                    }
                })
                .collect());
        }

        let Some(document_text) = load_document(&file.path, &ext).await? else {
            return Ok(Vec::new());
        };

        Ok(split_fixed(&document_text, context.chunk_size, context.chunk_overlap)
            .into_iter()
            .map(|text| Node {
                text,
                metadata: NodeMetadata::new(context.item.id.clone(), source.clone(), KnowledgeItemKind::File),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kie_domain::value_objects::{FileDescriptor, KnowledgeItem};
    use tokio_util::sync::CancellationToken;

    fn item(path: std::path::PathBuf) -> KnowledgeItem {
        KnowledgeItem {
            id: "file-1".into(),
            kind: KnowledgeItemKind::File,
            data: KnowledgeItemData::File {
                file: FileDescriptor { path, ext: None, size: None },
            },
        }
    }

    #[tokio::test]
    async fn missing_file_is_empty_result() {
        let item = item("/nonexistent/path/does-not-exist.txt".into());
        let mut progress = |_: u8| {};
        let nodes = FileReader
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
    async fn plain_text_file_is_chunked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, "hello from disk").await.unwrap();
        let item = item(path);
        let mut progress = |_: u8| {};
        let nodes = FileReader
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
        assert_eq!(nodes[0].text, "hello from disk");
    }

    #[tokio::test]
    async fn markdown_file_segments_by_heading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        tokio::fs::write(&path, "# Title\nBody text.\n").await.unwrap();
        let item = item(path);
        let mut progress = |_: u8| {};
        let nodes = FileReader
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
        assert!(nodes[0].text.contains("Body text"));
    }
}
