//! OpenAI embedding provider: posts to `{base_url}/v1/embeddings`, passing
//! `dimensions` under the `openai` key when the caller has one pinned.

use std::sync::Arc;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::EmbeddingProvider;
use kie_domain::registry::embedding::{EmbeddingProviderConfig, EmbeddingProviderEntry, EMBEDDING_PROVIDERS};
use serde::{Deserialize, Serialize};

/// Embeds text against the OpenAI embeddings endpoint.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAiEmbeddingProvider {
    fn from_config(config: &EmbeddingProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_owned());
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::configuration("openai embedding provider requires a model"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            model,
            dimensions: config.dimensions,
        })
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
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
                dimensions: self.dimensions,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("openai embeddings request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::provider(format!(
                "openai embeddings returned status {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("openai embeddings response malformed: {e}")))?;

        let mut ordered: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for datum in body.data {
            if let Some(slot) = ordered.get_mut(datum.index) {
                *slot = Some(datum.embedding);
            }
        }
        ordered
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| Error::provider(format!("openai embeddings response missing index {i}"))))
            .collect()
    }

    fn provider_id(&self) -> &str {
        "openai"
    }
}

fn build(config: &EmbeddingProviderConfig) -> std::result::Result<Arc<dyn EmbeddingProvider>, String> {
    OpenAiEmbeddingProvider::from_config(config)
        .map(|p| Arc::new(p) as Arc<dyn EmbeddingProvider>)
        .map_err(|e| e.to_string())
}

#[linkme::distributed_slice(EMBEDDING_PROVIDERS)]
static OPENAI_EMBEDDING_PROVIDER: EmbeddingProviderEntry = EmbeddingProviderEntry {
    name: "openai",
    description: "OpenAI embeddings API",
    build,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_to_public_endpoint() {
        let config = EmbeddingProviderConfig::new("openai").with_model("text-embedding-3-small");
        let provider = OpenAiEmbeddingProvider::from_config(&config).unwrap();
        assert_eq!(provider.base_url, "https://api.openai.com");
    }

    #[test]
    fn missing_model_is_a_configuration_error() {
        let config = EmbeddingProviderConfig::new("openai");
        assert!(OpenAiEmbeddingProvider::from_config(&config).is_err());
    }
}
