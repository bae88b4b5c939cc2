//! Top-level application configuration, loaded via `figment`.

use std::collections::HashMap;
use std::path::PathBuf;

use kie_domain::error::{Error, Result};
use kie_domain::value_objects::ProviderDescriptor;
use serde::{Deserialize, Serialize};

use crate::queue::QueueManagerConfig;

/// Layered configuration for the knowledge ingestion engine.
///
/// Field names and defaults match the configuration table exactly. No CLI flags or
/// ambient environment variables are read beyond what `figment`'s `Env` provider
/// surfaces under the `KIE_` prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Max parallel jobs across all bases.
    pub global_concurrency: i64,
    /// Max parallel jobs per base.
    pub per_base_concurrency: i64,
    /// Pool size for the read stage.
    pub io_concurrency: i64,
    /// Pool size for the embed stage.
    pub embedding_concurrency: i64,
    /// Pool size for the write stage.
    pub write_concurrency: i64,
    /// Backpressure cap on total queued jobs; `None` is unbounded.
    pub max_queue_size: Option<usize>,
    /// Coalescing window for progress updates, in milliseconds.
    pub progress_throttle_ms: u64,
    /// Stale-progress expiry, in milliseconds.
    pub progress_ttl_ms: u64,
    /// Default chunk size in characters.
    pub chunk_size: usize,
    /// Default chunk overlap in characters.
    pub chunk_overlap: usize,
    /// Default `topK` for queries.
    pub document_count: usize,
    /// Default hybrid mixing weight.
    pub default_alpha: f32,
    /// Root directory under which each base's store directory is created.
    pub knowledge_store_root: PathBuf,
    /// Registered provider descriptors, keyed by [`ProviderDescriptor::id`].
    ///
    /// Not part of spec.md's configuration table (providers there are supplied by the
    /// caller's external catalog); carried here so this library has a concrete source
    /// for the table `kie_domain::registry::resolve_base` needs.
    pub providers: HashMap<String, ProviderDescriptor>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            global_concurrency: 1,
            per_base_concurrency: 1,
            io_concurrency: 1,
            embedding_concurrency: 1,
            write_concurrency: 1,
            max_queue_size: None,
            progress_throttle_ms: 500,
            progress_ttl_ms: 600_000,
            chunk_size: 1024,
            chunk_overlap: 20,
            document_count: 6,
            default_alpha: 0.5,
            knowledge_store_root: PathBuf::from("./knowledge-store"),
            providers: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (TOML) layered under environment overrides
    /// prefixed `KIE_` (e.g. `KIE_GLOBAL_CONCURRENCY=4`), falling back to defaults for
    /// anything unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file exists but fails to parse, or if
    /// the merged configuration fails validation.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::providers::{Env, Format, Toml};
        use figment::Figment;

        let config: Self = Figment::from(figment::providers::Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("KIE_"))
            .extract()
            .map_err(|e| Error::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the scheduler or chunker unusable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `default_alpha` is outside `[0, 1]` or
    /// `chunk_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_alpha) {
            return Err(Error::configuration("default_alpha must be in [0, 1]"));
        }
        if self.chunk_size == 0 {
            return Err(Error::configuration("chunk_size must be positive"));
        }
        Ok(())
    }

    /// Project out the scheduler-relevant fields.
    #[must_use]
    pub fn queue_manager_config(&self) -> QueueManagerConfig {
        QueueManagerConfig {
            global_concurrency: usize::try_from(self.global_concurrency.max(1)).unwrap_or(1),
            per_base_concurrency: usize::try_from(self.per_base_concurrency.max(1)).unwrap_or(1),
            io_concurrency: self.io_concurrency,
            embedding_concurrency: self.embedding_concurrency,
            write_concurrency: self.write_concurrency,
            max_queue_size: self.max_queue_size,
            progress_throttle_ms: self.progress_throttle_ms,
            progress_ttl_ms: self.progress_ttl_ms,
        }
    }
}
