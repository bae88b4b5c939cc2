//! Fetches a single web page and extracts its text with the shared HTML extractor. An
//! unparseable URL is an empty result, not an error; a non-2xx response is a thrown
//! content-read error.

use async_trait::async_trait;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{ContentReader, ReaderContext};
use kie_domain::value_objects::{KnowledgeItemData, KnowledgeItemKind, Node, NodeMetadata};

use super::chunker::split_fixed;
use super::html_extract::extract_text;

/// Reader for [`KnowledgeItemKind::Url`] items.
pub struct UrlReader {
    client: reqwest::Client,
}

impl Default for UrlReader {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl UrlReader {
    /// Build a reader using an already-configured client (tests, or a shared pool).
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `url` and extract its text, or `Ok(None)` if the URL itself is invalid.
    pub(super) async fn fetch_text(&self, url: &str) -> Result<Option<String>> {
        if reqwest::Url::parse(url).is_err() {
            return Ok(None);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::content_read(format!("fetching {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::content_read(format!("fetching {url}: status {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::content_read(format!("reading body of {url}: {e}")))?;
        Ok(Some(extract_text(&body)))
    }
}

#[async_trait]
impl ContentReader for UrlReader {
    async fn read(&self, context: ReaderContext<'_>) -> Result<Vec<Node>> {
        let KnowledgeItemData::Url { url } = &context.item.data else {
            return Ok(Vec::new());
        };

        let Some(text) = self.fetch_text(url).await? else {
            return Ok(Vec::new());
        };

        Ok(split_fixed(&text, context.chunk_size, context.chunk_overlap)
            .into_iter()
            .map(|chunk| Node {
                text: chunk,
                metadata: NodeMetadata::new(context.item.id.clone(), url.clone(), KnowledgeItemKind::Url),
            })
            .collect())
    }
}
