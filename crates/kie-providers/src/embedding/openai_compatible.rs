//! OpenAI-compatible embedding provider, registered as the catch-all fallback for any
//! provider id the registry doesn't recognize directly. Posts to `{base_url}/v1/embeddings`,
//! defaulting to the public OpenAI endpoint if no base URL was configured.

use std::sync::Arc;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::EmbeddingProvider;
use kie_domain::registry::embedding::{EmbeddingProviderConfig, EmbeddingProviderEntry, EMBEDDING_PROVIDERS, FALLBACK_PROVIDER_ID};
use serde::{Deserialize, Serialize};

/// Generic OpenAI-wire-format embedding client, used when no dedicated adapter matches
/// a configured provider id.
pub struct OpenAiCompatibleEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

impl OpenAiCompatibleEmbeddingProvider {
    fn from_config(config: &EmbeddingProviderConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_owned());
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleEmbeddingProvider {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self
            .model
            .as_deref()
            .ok_or_else(|| Error::configuration("openai-compatible embedding provider requires a model"))?;

        let mut request = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .json(&EmbeddingRequest {
                model,
                input: texts,
                dimensions: self.dimensions,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("openai-compatible embeddings request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::provider(format!(
                "openai-compatible embeddings returned status {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("openai-compatible embeddings response malformed: {e}")))?;

        let mut ordered: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for datum in body.data {
            if let Some(slot) = ordered.get_mut(datum.index) {
                *slot = Some(datum.embedding);
            }
        }
        ordered
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| Error::provider(format!("openai-compatible embeddings response missing index {i}")))
            })
            .collect()
    }

    fn provider_id(&self) -> &str {
        FALLBACK_PROVIDER_ID
    }
}

fn build(config: &EmbeddingProviderConfig) -> std::result::Result<Arc<dyn EmbeddingProvider>, String> {
    Ok(Arc::new(OpenAiCompatibleEmbeddingProvider::from_config(config)))
}

#[linkme::distributed_slice(EMBEDDING_PROVIDERS)]
static OPENAI_COMPATIBLE_EMBEDDING_PROVIDER: EmbeddingProviderEntry = EmbeddingProviderEntry {
    name: FALLBACK_PROVIDER_ID,
    description: "Generic OpenAI-wire-format embeddings endpoint, used as the fallback",
    build,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_public_openai_endpoint() {
        let config = EmbeddingProviderConfig::new(FALLBACK_PROVIDER_ID);
        let provider = OpenAiCompatibleEmbeddingProvider::from_config(&config);
        assert_eq!(provider.base_url, "https://api.openai.com");
    }
}
