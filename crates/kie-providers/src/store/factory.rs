//! A cache of per-base store handles, keyed by base id. Mirrors the base lifecycle from
//! §4.7: a base's store is created lazily on first reference, reset clears it in place,
//! and delete drops the cache entry and removes the on-disk directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use kie_domain::error::Result;
use kie_domain::value_objects::KnowledgeBaseId;

use super::provider::SqliteVectorStore;

/// Sanitize a base id into a filesystem-safe directory name: anything outside
/// `[A-Za-z0-9_-]` becomes `_`.
fn sanitize(base_id: &str) -> String {
    base_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Lazily creates and caches one [`SqliteVectorStore`] per base, under a shared root
/// directory.
pub struct SqliteVectorStoreFactory {
    root: PathBuf,
    stores: DashMap<KnowledgeBaseId, Arc<SqliteVectorStore>>,
}

impl SqliteVectorStoreFactory {
    /// Build a factory rooted at `knowledge_store_root`; the directory is created lazily
    /// per base, not eagerly here.
    #[must_use]
    pub fn new(knowledge_store_root: impl Into<PathBuf>) -> Self {
        Self {
            root: knowledge_store_root.into(),
            stores: DashMap::new(),
        }
    }

    fn base_dir(&self, base_id: &KnowledgeBaseId) -> PathBuf {
        self.root.join(sanitize(&base_id.as_str()))
    }

    /// Return the cached store for `base_id`, creating and connecting it on first
    /// reference. Idempotent: concurrent first references converge on one handle.
    pub async fn get_or_create(&self, base_id: &KnowledgeBaseId) -> Result<Arc<SqliteVectorStore>> {
        if let Some(existing) = self.stores.get(base_id) {
            return Ok(Arc::clone(&existing));
        }

        let db_path = self.base_dir(base_id).join("vectors.db");
        let store = Arc::new(SqliteVectorStore::connect(&db_path).await?);
        let entry = self.stores.entry(base_id.clone()).or_insert(store);
        Ok(Arc::clone(&entry))
    }

    /// Clear a base's collection in place, without dropping the cache entry. A no-op if
    /// the base has no store yet.
    pub async fn reset(&self, base_id: &KnowledgeBaseId) -> Result<()> {
        if let Some(store) = self.stores.get(base_id) {
            store.clear_collection().await?;
        }
        Ok(())
    }

    /// Drop the cache entry and remove the base's directory recursively. Best-effort on
    /// the filesystem removal: if the directory can't be removed (e.g. a lingering file
    /// handle) this logs and returns `Ok(())` rather than hard-failing, per §4.7.
    ///
    /// Waits for the store's own guard before removing anything, so an add/query already
    /// in flight when this is called completes against an intact database rather than
    /// racing the directory removal.
    pub async fn delete(&self, base_id: &KnowledgeBaseId) {
        if let Some((_, store)) = self.stores.remove(base_id) {
            store.quiesce().await;
        }
        let dir = self.base_dir(base_id);
        if tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            if let Err(err) = tokio::fs::remove_dir_all(&dir).await {
                tracing::warn!(base_id = %base_id, error = %err, "failed to remove base directory, continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_unsafe_characters() {
        assert_eq!(sanitize("my base/with spaces!"), "my_base_with_spaces_");
    }

    #[tokio::test]
    async fn get_or_create_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let factory = SqliteVectorStoreFactory::new(dir.path());
        let base_id = KnowledgeBaseId::from_name("kb1");
        let a = factory.get_or_create(&base_id).await.unwrap();
        let b = factory.get_or_create(&base_id).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn delete_removes_directory_and_cache_entry() {
        let dir = tempfile::tempdir().unwrap();
        let factory = SqliteVectorStoreFactory::new(dir.path());
        let base_id = KnowledgeBaseId::from_name("kb1");
        factory.get_or_create(&base_id).await.unwrap();
        let base_dir = factory.base_dir(&base_id);
        assert!(tokio::fs::try_exists(&base_dir).await.unwrap());

        factory.delete(&base_id).await;
        assert!(!tokio::fs::try_exists(&base_dir).await.unwrap());
        assert!(factory.stores.get(&base_id).is_none());
    }
}
