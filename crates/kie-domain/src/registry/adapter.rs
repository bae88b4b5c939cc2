//! Resolves a [`KnowledgeBase`] and a table of [`ProviderDescriptor`]s into a
//! [`ResolvedBase`] carrying live provider clients.
//!
//! Implements the resolution rules verbatim: the model reference is already parsed
//! (provider/model split happened at [`crate::value_objects::ModelReference::parse`]
//! time), so this module only looks up the provider descriptor, normalizes its base
//! URL, and resolves a concrete client through the provider registries.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{KnowledgeBase, ResolvedBase};
use crate::error::{Error, Result};
use crate::ports::{EmbeddingProvider, RerankProvider};
use crate::registry::embedding::{resolve_embedding_provider, EmbeddingProviderConfig};
use crate::registry::rerank::{resolve_rerank_provider, RerankProviderConfig};
use crate::value_objects::{ModelReference, ProviderDescriptor};

/// Resolve `base` against `providers`, optionally also resolving its rerank client.
///
/// # Errors
///
/// Returns [`Error::Validation`] if a referenced provider id has no descriptor, or if
/// `want_rerank` is set but `base.rerank_model` is absent. Returns
/// [`Error::ServiceUnavailable`] if a resolved base URL is empty after normalization.
/// Returns [`Error::Configuration`] if no provider (and no fallback) is registered for
/// a provider's kind.
pub fn resolve_base(
    base: &KnowledgeBase,
    providers: &HashMap<String, ProviderDescriptor>,
    want_rerank: bool,
) -> Result<ResolvedBase> {
    let embed_client = resolve_embedding_client(&base.embedding_model, providers)?;

    let rerank_client = if want_rerank {
        let rerank_model = base.rerank_model.as_ref().ok_or_else(|| {
            Error::validation(format!("base '{}' has no rerank model configured", base.id))
        })?;
        Some(resolve_rerank_client(rerank_model, providers)?)
    } else {
        None
    };

    Ok(ResolvedBase {
        id: base.id.clone(),
        dimensions: base.dimensions,
        chunk_size: base.chunk_size,
        chunk_overlap: base.chunk_overlap,
        embed_client,
        rerank_client,
    })
}

fn descriptor_for<'a>(
    provider_id: &str,
    providers: &'a HashMap<String, ProviderDescriptor>,
) -> Result<&'a ProviderDescriptor> {
    providers.get(provider_id).ok_or_else(|| {
        Error::validation(format!("no provider descriptor registered for '{provider_id}'"))
    })
}

fn resolve_embedding_client(
    model: &ModelReference,
    providers: &HashMap<String, ProviderDescriptor>,
) -> Result<Arc<dyn EmbeddingProvider>> {
    let descriptor = descriptor_for(&model.provider_id, providers)?;
    let base_url = descriptor.normalized_base_url()?;

    let mut config = EmbeddingProviderConfig::new(descriptor.id.clone())
        .with_model(model.model_id.clone())
        .with_base_url(base_url);
    if let Some(key) = &descriptor.api_key {
        config = config.with_api_key(key.clone());
    }

    resolve_embedding_provider(&config)
}

fn resolve_rerank_client(
    model: &ModelReference,
    providers: &HashMap<String, ProviderDescriptor>,
) -> Result<Arc<dyn RerankProvider>> {
    let descriptor = descriptor_for(&model.provider_id, providers)?;
    let base_url = descriptor.normalized_base_url()?;

    let mut config = RerankProviderConfig::new(descriptor.id.clone())
        .with_model(model.model_id.clone())
        .with_base_url(base_url);
    if let Some(key) = &descriptor.api_key {
        config = config.with_api_key(key.clone());
    }

    resolve_rerank_provider(&config)
}
