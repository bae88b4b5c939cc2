//! Alibaba Bailian (DashScope) rerank provider.

use std::sync::Arc;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{RerankProvider, RerankResult};
use kie_domain::registry::rerank::{RerankProviderConfig, RerankProviderEntry, RERANK_PROVIDERS};
use serde::{Deserialize, Serialize};

/// Reranks documents against Alibaba's DashScope text-rerank service.
pub struct BailianRerankProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl BailianRerankProvider {
    fn from_config(config: &RerankProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://dashscope.aliyuncs.com".to_owned());
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::configuration("bailian rerank provider requires a model"))?;
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
    model: &'a str,
    input: RerankInput<'a>,
    parameters: RerankParameters,
}

#[derive(Serialize)]
struct RerankInput<'a> {
    query: &'a str,
    documents: &'a [String],
}

#[derive(Serialize)]
struct RerankParameters {
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    output: RerankOutput,
}

#[derive(Deserialize)]
struct RerankOutput {
    results: Vec<BailianResult>,
}

#[derive(Deserialize)]
struct BailianResult {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl RerankProvider for BailianRerankProvider {
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<RerankResult>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = self
            .client
            .post(format!(
                "{}/api/v1/services/rerank/text-rerank/text-rerank",
                self.base_url
            ))
            .json(&RerankRequest {
                model: &self.model,
                input: RerankInput { query, documents: docs },
                parameters: RerankParameters { top_n },
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("bailian rerank request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::provider(format!("bailian rerank returned status {}", response.status())));
        }

        let body: RerankResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("bailian rerank response malformed: {e}")))?;

        Ok(body
            .output
            .results
            .into_iter()
            .map(|r| RerankResult {
                index: r.index,
                relevance_score: r.relevance_score,
            })
            .collect())
    }

    fn provider_id(&self) -> &str {
        "bailian"
    }
}

fn build(config: &RerankProviderConfig) -> std::result::Result<Arc<dyn RerankProvider>, String> {
    BailianRerankProvider::from_config(config)
        .map(|p| Arc::new(p) as Arc<dyn RerankProvider>)
        .map_err(|e| e.to_string())
}

#[linkme::distributed_slice(RERANK_PROVIDERS)]
static BAILIAN_RERANK_PROVIDER: RerankProviderEntry = RerankProviderEntry {
    name: "bailian",
    description: "Alibaba Bailian (DashScope) text-rerank service",
    build,
};
