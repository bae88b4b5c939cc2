//! The generic fallback rerank provider, used when no dedicated or substring-matched
//! adapter applies. Speaks the common OpenAI-style rerank wire format:
//! `{"results": [{"index", "relevance_score"}]}`.

use std::sync::Arc;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{RerankProvider, RerankResult};
use kie_domain::registry::rerank::{RerankProviderConfig, RerankProviderEntry, RERANK_PROVIDERS, FALLBACK_PROVIDER_ID};
use serde::{Deserialize, Serialize};

/// Generic OpenAI-wire-format rerank client.
pub struct DefaultRerankProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl DefaultRerankProvider {
    fn from_config(config: &RerankProviderConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:8080".to_owned());
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<DefaultResult>,
}

#[derive(Deserialize)]
struct DefaultResult {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl RerankProvider for DefaultRerankProvider {
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<RerankResult>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = self
            .client
            .post(format!("{}/rerank", self.base_url))
            .json(&RerankRequest {
                model: self.model.as_deref(),
                query,
                documents: docs,
                top_n,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("default rerank request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::provider(format!("default rerank returned status {}", response.status())));
        }

        let body: RerankResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("default rerank response malformed: {e}")))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| RerankResult {
                index: r.index,
                relevance_score: r.relevance_score,
            })
            .collect())
    }

    fn provider_id(&self) -> &str {
        FALLBACK_PROVIDER_ID
    }
}

fn build(config: &RerankProviderConfig) -> std::result::Result<Arc<dyn RerankProvider>, String> {
    Ok(Arc::new(DefaultRerankProvider::from_config(config)))
}

#[linkme::distributed_slice(RERANK_PROVIDERS)]
static DEFAULT_RERANK_PROVIDER: RerankProviderEntry = RerankProviderEntry {
    name: FALLBACK_PROVIDER_ID,
    description: "Generic OpenAI-style rerank endpoint, used as the fallback",
    build,
};
