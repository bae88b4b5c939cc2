//! Embedding provider registry.
//!
//! Providers register themselves via `#[linkme::distributed_slice(EMBEDDING_PROVIDERS)]`
//! in the crate that implements them (`kie-providers`); this module only resolves.

use std::collections::HashMap;

/// Configuration passed to an embedding provider's constructor.
///
/// Contains every field a provider might need; a given provider uses what applies and
/// ignores the rest.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingProviderConfig {
    /// Provider id, matched against each registered entry's `name`.
    pub provider: String,
    /// Model id to embed with.
    pub model: Option<String>,
    /// Credential sent with each request.
    pub api_key: Option<String>,
    /// Normalized base URL.
    pub base_url: Option<String>,
    /// Embedding dimensions, if the caller has pinned them.
    pub dimensions: Option<usize>,
    /// Provider-specific extra fields.
    pub extra: HashMap<String, String>,
}

crate::impl_config_builder!(EmbeddingProviderConfig {
    /// Set the model id.
    model: with_model(into String),
    /// Set the API key.
    api_key: with_api_key(into String),
    /// Set the normalized base URL.
    base_url: with_base_url(into String),
    /// Set the embedding dimensions.
    dimensions: with_dimensions(usize),
});

crate::impl_registry!(
    provider_trait: crate::ports::EmbeddingProvider,
    config_type: EmbeddingProviderConfig,
    entry_type: EmbeddingProviderEntry,
    slice_name: EMBEDDING_PROVIDERS,
    resolve_fn: resolve_embedding_provider_exact,
    list_fn: list_embedding_providers
);

/// Id of the provider used as the catch-all when no registered provider matches.
pub const FALLBACK_PROVIDER_ID: &str = "openai-compatible";

/// Resolve a configured provider by id, falling back to the OpenAI-compatible adapter
/// when no exact match is registered.
///
/// # Errors
///
/// Returns a configuration error if neither the requested provider nor the fallback is
/// registered.
pub fn resolve_embedding_provider(
    config: &EmbeddingProviderConfig,
) -> crate::error::Result<std::sync::Arc<dyn crate::ports::EmbeddingProvider>> {
    match resolve_embedding_provider_exact(config) {
        Ok(provider) => Ok(provider),
        Err(_) if config.provider != FALLBACK_PROVIDER_ID => {
            let mut fallback_config = config.clone();
            fallback_config.provider = FALLBACK_PROVIDER_ID.to_owned();
            resolve_embedding_provider_exact(&fallback_config)
        }
        Err(e) => Err(e),
    }
}
