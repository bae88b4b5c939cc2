//! VoyageAI rerank provider.

use std::sync::Arc;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{RerankProvider, RerankResult};
use kie_domain::registry::rerank::{RerankProviderConfig, RerankProviderEntry, RERANK_PROVIDERS};
use serde::{Deserialize, Serialize};

/// Reranks documents against the VoyageAI rerank API.
pub struct VoyageAiRerankProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl VoyageAiRerankProvider {
    fn from_config(config: &RerankProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.voyageai.com".to_owned());
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::configuration("voyageai rerank provider requires a model"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            model,
        })
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [String],
    model: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    data: Vec<VoyageResult>,
}

#[derive(Deserialize)]
struct VoyageResult {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl RerankProvider for VoyageAiRerankProvider {
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<RerankResult>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = self
            .client
            .post(format!("{}/v1/rerank", self.base_url))
            .json(&RerankRequest {
                query,
                documents: docs,
                model: &self.model,
                top_k: top_n,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("voyageai rerank request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::provider(format!("voyageai rerank returned status {}", response.status())));
        }

        let body: RerankResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("voyageai rerank response malformed: {e}")))?;

        Ok(body
            .data
            .into_iter()
            .map(|r| RerankResult {
                index: r.index,
                relevance_score: r.relevance_score,
            })
            .collect())
    }

    fn provider_id(&self) -> &str {
        "voyageai"
    }
}

fn build(config: &RerankProviderConfig) -> std::result::Result<Arc<dyn RerankProvider>, String> {
    VoyageAiRerankProvider::from_config(config)
        .map(|p| Arc::new(p) as Arc<dyn RerankProvider>)
        .map_err(|e| e.to_string())
}

#[linkme::distributed_slice(RERANK_PROVIDERS)]
static VOYAGEAI_RERANK_PROVIDER: RerankProviderEntry = RerankProviderEntry {
    name: "voyageai",
    description: "VoyageAI rerank API",
    build,
};
