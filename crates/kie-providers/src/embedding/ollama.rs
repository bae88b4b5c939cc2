//! Ollama embedding provider: posts to `{base_url}/api/embed`. The base URL reaching
//! this adapter has already had a trailing `/api` stripped by
//! [`kie_domain::value_objects::ProviderDescriptor::normalized_base_url`]; this module
//! re-appends the path segment it actually needs.

use std::sync::Arc;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::EmbeddingProvider;
use kie_domain::registry::embedding::{EmbeddingProviderConfig, EmbeddingProviderEntry, EMBEDDING_PROVIDERS};
use serde::{Deserialize, Serialize};

/// Embeds text against a local or remote Ollama server.
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: Option<usize>,
}

impl OllamaEmbeddingProvider {
    fn from_config(config: &EmbeddingProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_owned());
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::configuration("ollama embedding provider requires a model"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            model,
            dimensions: config.dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    ollama: DimensionsOption,
}

#[derive(Serialize)]
struct DimensionsOption {
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
                options: self.dimensions.map(|dimensions| OllamaOptions {
                    ollama: DimensionsOption { dimensions },
                }),
            })
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("ollama embed request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::provider(format!("ollama embed returned status {}", response.status())));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("ollama embed response malformed: {e}")))?;

        if body.embeddings.len() != texts.len() {
            return Err(Error::provider(format!(
                "ollama embed returned {} vectors for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }

        Ok(body.embeddings)
    }

    fn provider_id(&self) -> &str {
        "ollama"
    }
}

fn build(config: &EmbeddingProviderConfig) -> std::result::Result<Arc<dyn EmbeddingProvider>, String> {
    OllamaEmbeddingProvider::from_config(config)
        .map(|p| Arc::new(p) as Arc<dyn EmbeddingProvider>)
        .map_err(|e| e.to_string())
}

#[linkme::distributed_slice(EMBEDDING_PROVIDERS)]
static OLLAMA_EMBEDDING_PROVIDER: EmbeddingProviderEntry = EmbeddingProviderEntry {
    name: "ollama",
    description: "Local or remote Ollama embeddings server",
    build,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_to_localhost() {
        let config = EmbeddingProviderConfig::new("ollama").with_model("nomic-embed-text");
        let provider = OllamaEmbeddingProvider::from_config(&config).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
    }
}
