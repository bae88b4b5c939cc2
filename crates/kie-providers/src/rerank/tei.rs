//! Text Embeddings Inference (TEI) rerank provider. Matched by substring against any
//! configured provider id containing `tei` (self-hosted servers are usually named
//! after their deployment, e.g. `my-tei-server`), per the rerank registry's fallback
//! scan.

use std::sync::Arc;

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{RerankProvider, RerankResult};
use kie_domain::registry::rerank::{RerankProviderConfig, RerankProviderEntry, RERANK_PROVIDERS};
use serde::{Deserialize, Serialize};

/// Reranks documents against a self-hosted Text Embeddings Inference server.
pub struct TeiRerankProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TeiRerankProvider {
    fn from_config(config: &RerankProviderConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:8080".to_owned());
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
        }
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
}

#[derive(Deserialize)]
struct TeiResult {
    index: usize,
    score: f32,
}

#[async_trait]
impl RerankProvider for TeiRerankProvider {
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<RerankResult>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = self
            .client
            .post(format!("{}/rerank", self.base_url))
            .json(&RerankRequest { query, texts: docs });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("tei rerank request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::provider(format!("tei rerank returned status {}", response.status())));
        }

        let mut results: Vec<TeiResult> = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("tei rerank response malformed: {e}")))?;

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_n);
        Ok(results
            .into_iter()
            .map(|r| RerankResult {
                index: r.index,
                relevance_score: r.score,
            })
            .collect())
    }

    fn provider_id(&self) -> &str {
        "tei"
    }
}

fn build(config: &RerankProviderConfig) -> std::result::Result<Arc<dyn RerankProvider>, String> {
    Ok(Arc::new(TeiRerankProvider::from_config(config)))
}

#[linkme::distributed_slice(RERANK_PROVIDERS)]
static TEI_RERANK_PROVIDER: RerankProviderEntry = RerankProviderEntry {
    name: "tei",
    description: "Self-hosted Text Embeddings Inference rerank server",
    build,
};
