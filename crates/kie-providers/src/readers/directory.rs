//! Walks a directory item and reads every file it contains, using the same
//! per-extension loader mapping as [`super::file::FileReader`]. A non-existent
//! directory is an empty result, not an error. Reports `{itemId, percent}` progress
//! through [`ReaderContext::progress`] as each file finishes, since a directory is the
//! one reader whose single item can take long enough for that to matter.

use async_trait::async_trait;
use ignore::WalkBuilder;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{ContentReader, ReaderContext};
use kie_domain::value_objects::{KnowledgeItemData, KnowledgeItemKind, Node, NodeMetadata};

use super::chunker::split_fixed;
use super::loaders::load_document;
use super::markdown::split_by_heading;

/// Reader for [`KnowledgeItemKind::Directory`] items.
pub struct DirectoryReader;

/// `done` out of `total` as a 0-100 percentage, rounded down. `total` is always
/// nonzero at call sites (the loop only runs when there's at least one file).
fn percent_done(done: usize, total: usize) -> u8 {
    u8::try_from((done * 100) / total).unwrap_or(100)
}

#[async_trait]
impl ContentReader for DirectoryReader {
    async fn read(&self, mut context: ReaderContext<'_>) -> Result<Vec<Node>> {
        let KnowledgeItemData::Directory { path } = &context.item.data else {
            return Ok(Vec::new());
        };

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let files: Vec<std::path::PathBuf> = WalkBuilder::new(path)
            .hidden(true)
            .build()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .collect();

        let total_files = files.len();
        let mut nodes = Vec::new();
        for (done, file_path) in files.into_iter().enumerate() {
            if context.cancellation.is_cancelled() {
                return Err(Error::cancelled("Cancelled"));
            }

            let source = file_path.display().to_string();
            let ext = file_path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();

            'file: {
                if ext == "md" {
                    let Ok(text) = tokio::fs::read_to_string(&file_path).await else {
                        break 'file;
                    };
                    for section in split_by_heading(&text) {
                        nodes.push(Node {
                            text: section.text,
                            metadata: NodeMetadata::new(context.item.id.clone(), source.clone(), KnowledgeItemKind::Directory),
                        });
                    }
                    break 'file;
                }

                let Ok(Some(document_text)) = load_document(&file_path, &ext).await else {
                    break 'file;
                };

                for text in split_fixed(&document_text, context.chunk_size, context.chunk_overlap) {
                    nodes.push(Node {
                        text,
                        metadata: NodeMetadata::new(context.item.id.clone(), source.clone(), KnowledgeItemKind::Directory),
                    });
                }
            }

            (context.progress)(percent_done(done + 1, total_files));
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kie_domain::value_objects::KnowledgeItem;
    use tokio_util::sync::CancellationToken;

    fn item(path: std::path::PathBuf) -> KnowledgeItem {
        KnowledgeItem {
            id: "dir-1".into(),
            kind: KnowledgeItemKind::Directory,
            data: KnowledgeItemData::Directory { path },
        }
    }

    #[tokio::test]
    async fn nonexistent_directory_is_empty_result() {
        let item = item("/nonexistent/does-not-exist".into());
        let mut progress = |_: u8| {};
        let nodes = DirectoryReader
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
    async fn walks_files_and_tags_source() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.txt"), "alpha content").await.unwrap();
        tokio::fs::write(dir.path().join("b.txt"), "beta content").await.unwrap();
        let item = item(dir.path().to_path_buf());
        let mut progress = |_: u8| {};
        let nodes = DirectoryReader
            .read(ReaderContext {
                item: &item,
                chunk_size: 1024,
                chunk_overlap: 20,
                cancellation: CancellationToken::new(),
                progress: &mut progress,
            })
            .await
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.metadata.external_id.as_str() == "dir-1"));
    }

    #[tokio::test]
    async fn reports_progress_as_files_complete() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.txt"), "alpha content").await.unwrap();
        tokio::fs::write(dir.path().join("b.txt"), "beta content").await.unwrap();
        tokio::fs::write(dir.path().join("c.txt"), "gamma content").await.unwrap();
        let item = item(dir.path().to_path_buf());
        let mut seen = Vec::new();
        let mut progress = |p: u8| seen.push(p);
        DirectoryReader
            .read(ReaderContext {
                item: &item,
                chunk_size: 1024,
                chunk_overlap: 20,
                cancellation: CancellationToken::new(),
                progress: &mut progress,
            })
            .await
            .unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }
}
