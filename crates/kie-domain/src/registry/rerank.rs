//! Rerank provider registry.
//!
//! Unlike the embedding registry, resolution here additionally supports prefix/
//! substring matching against a provider id (so a configured id like `my-tei-server`
//! resolves to the `tei` entry), per the source behavior this module mirrors.

use std::collections::HashMap;

/// Configuration passed to a rerank provider's constructor.
#[derive(Debug, Clone, Default)]
pub struct RerankProviderConfig {
    /// Configured provider id; matched exactly first, then by substring.
    pub provider: String,
    /// Model id to rerank with.
    pub model: Option<String>,
    /// Credential sent with each request.
    pub api_key: Option<String>,
    /// Normalized base URL.
    pub base_url: Option<String>,
    /// Provider-specific extra fields.
    pub extra: HashMap<String, String>,
}

crate::impl_config_builder!(RerankProviderConfig {
    /// Set the model id.
    model: with_model(into String),
    /// Set the API key.
    api_key: with_api_key(into String),
    /// Set the normalized base URL.
    base_url: with_base_url(into String),
});

crate::impl_registry!(
    provider_trait: crate::ports::RerankProvider,
    config_type: RerankProviderConfig,
    entry_type: RerankProviderEntry,
    slice_name: RERANK_PROVIDERS,
    resolve_fn: resolve_rerank_provider_exact,
    list_fn: list_rerank_providers
);

/// Id of the provider used when neither an exact nor a substring match is found.
pub const FALLBACK_PROVIDER_ID: &str = "default";

/// Resolve a configured provider by exact id, then by substring match, then fall back
/// to the generic `default` adapter.
///
/// # Errors
///
/// Returns a configuration error if the fallback itself is not registered.
pub fn resolve_rerank_provider(
    config: &RerankProviderConfig,
) -> crate::error::Result<std::sync::Arc<dyn crate::ports::RerankProvider>> {
    if let Ok(provider) = resolve_rerank_provider_exact(config) {
        return Ok(provider);
    }

    for entry in &RERANK_PROVIDERS {
        if config.provider.contains(entry.name) {
            return (entry.build)(config).map_err(crate::error::Error::configuration);
        }
    }

    if config.provider == FALLBACK_PROVIDER_ID {
        return Err(crate::error::Error::configuration(format!(
            "no rerank provider registered for fallback id '{FALLBACK_PROVIDER_ID}'"
        )));
    }

    let mut fallback_config = config.clone();
    fallback_config.provider = FALLBACK_PROVIDER_ID.to_owned();
    resolve_rerank_provider_exact(&fallback_config)
}
