//! Jina AI rerank provider. `jina-reranker-m0` is multimodal: documents are sent as
//! `{"text": ...}` objects instead of bare strings so the server can tell text
//! candidates apart from image candidates (this adapter only ever sends text).

use std::sync::Arc;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{RerankProvider, RerankResult};
use kie_domain::registry::rerank::{RerankProviderConfig, RerankProviderEntry, RERANK_PROVIDERS};
use serde::{Deserialize, Serialize};

const MULTIMODAL_MODEL: &str = "jina-reranker-m0";

/// Reranks documents against the Jina AI rerank API.
pub struct JinaRerankProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl JinaRerankProvider {
    fn from_config(config: &RerankProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.jina.ai".to_owned());
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::configuration("jina rerank provider requires a model"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            model,
        })
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum JinaDocument<'a> {
    Plain(&'a str),
    Multimodal { text: &'a str },
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<JinaDocument<'a>>,
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<JinaResult>,
}

#[derive(Deserialize)]
struct JinaResult {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl RerankProvider for JinaRerankProvider {
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<RerankResult>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let multimodal = self.model == MULTIMODAL_MODEL;
        let documents: Vec<JinaDocument<'_>> = docs
            .iter()
            .map(|d| {
                if multimodal {
                    JinaDocument::Multimodal { text: d }
                } else {
                    JinaDocument::Plain(d)
                }
            })
            .collect();

        let mut request = self
            .client
            .post(format!("{}/v1/rerank", self.base_url))
            .json(&RerankRequest {
                model: &self.model,
                query,
                documents,
                top_n,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("jina rerank request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::provider(format!("jina rerank returned status {}", response.status())));
        }

        let body: RerankResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("jina rerank response malformed: {e}")))?;

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
        "jina"
    }
}

fn build(config: &RerankProviderConfig) -> std::result::Result<Arc<dyn RerankProvider>, String> {
    JinaRerankProvider::from_config(config)
        .map(|p| Arc::new(p) as Arc<dyn RerankProvider>)
        .map_err(|e| e.to_string())
}

#[linkme::distributed_slice(RERANK_PROVIDERS)]
static JINA_RERANK_PROVIDER: RerankProviderEntry = RerankProviderEntry {
    name: "jina",
    description: "Jina AI rerank API",
    build,
};
