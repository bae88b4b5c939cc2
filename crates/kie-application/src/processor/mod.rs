//! The knowledge processor: composes a reader, the embedding pipeline, and a vector
//! store under a caller-supplied stage runner.

use std::collections::HashMap;
use std::sync::Arc;

use kie_domain::entities::KnowledgeBase;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{ContentReader, ReaderContext, Stage, StageRunner, VectorStoreProvider};
use kie_domain::registry::resolve_base;
use kie_domain::value_objects::{KnowledgeItem, KnowledgeItemKind, ProviderDescriptor};
use tokio_util::sync::CancellationToken;

use crate::pipeline::embed_nodes;

/// Composes a reader + embedding pipeline + vector store under a [`StageRunner`].
///
/// Holds no per-job state: readers and provider descriptors are wired once at
/// construction (by the composition root), and every other input — the base, the item,
/// the store, the runner, the cancellation signal, and the stage/progress callbacks —
/// is supplied per call to [`Self::process`].
pub struct KnowledgeProcessor {
    readers: HashMap<KnowledgeItemKind, Arc<dyn ContentReader>>,
    providers: HashMap<String, ProviderDescriptor>,
}

impl KnowledgeProcessor {
    /// Build a processor from its reader table and provider descriptor table.
    #[must_use]
    pub fn new(
        readers: HashMap<KnowledgeItemKind, Arc<dyn ContentReader>>,
        providers: HashMap<String, ProviderDescriptor>,
    ) -> Self {
        Self { readers, providers }
    }

    /// Run the five-step ingestion contract for `item` into `base`, writing to `store`.
    ///
    /// Empty reader output (absent input) returns `Ok(())` without touching `store` —
    /// this is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `item.kind` has no registered reader or the
    /// base/provider resolution fails; otherwise propagates reader, embedding, or store
    /// errors.
    pub async fn process<R, F, P>(
        &self,
        base: &KnowledgeBase,
        item: &KnowledgeItem,
        store: &dyn VectorStoreProvider,
        runner: &R,
        cancellation: CancellationToken,
        mut on_stage: F,
        mut on_progress: P,
    ) -> Result<()>
    where
        R: StageRunner,
        F: FnMut(Stage),
        P: FnMut(u8) + Send,
    {
        let reader = Arc::clone(self.readers.get(&item.kind).ok_or_else(|| {
            Error::validation(format!("unsupported item type: {:?}", item.kind))
        })?);

        let resolved = resolve_base(base, &self.providers, false)?;

        on_stage(Stage::Ocr);
        runner.run_stage(Stage::Ocr, Box::pin(async { Ok(()) })).await?;

        on_stage(Stage::Read);
        let read_cancellation = cancellation.clone();
        let chunk_size = base.chunk_size;
        let chunk_overlap = base.chunk_overlap;
        let progress_ref = &mut on_progress;
        let nodes = runner
            .run_stage(
                Stage::Read,
                Box::pin(async move {
                    let mut report_progress = move |p: u8| progress_ref(p);
                    let context = ReaderContext {
                        item,
                        chunk_size,
                        chunk_overlap,
                        cancellation: read_cancellation,
                        progress: &mut report_progress,
                    };
                    reader.read(context).await
                }),
            )
            .await?;

        if nodes.is_empty() {
            return Ok(());
        }

        on_stage(Stage::Embed);
        let embed_cancellation = cancellation.clone();
        runner
            .run_stage(
                Stage::Embed,
                Box::pin(async move {
                    let embedded = embed_nodes(nodes, &resolved, &embed_cancellation, |p| on_progress(p)).await?;
                    store.add(&embedded).await
                }),
            )
            .await?;

        Ok(())
    }
}
