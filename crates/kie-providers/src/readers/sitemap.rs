//! Fetches a sitemap and reads every listed page with `http://.../<loc>` entries,
//! concurrency 5, failures logged and skipped rather than failing the whole job.
//! Deduplication of repeated `<loc>` entries is not required.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{ContentReader, ReaderContext};
use kie_domain::value_objects::{KnowledgeItemData, KnowledgeItemKind, Node, NodeMetadata};
use regex::Regex;

use super::chunker::split_fixed;
use super::url::UrlReader;

const SITEMAP_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_FETCH_CONCURRENCY: usize = 5;

fn loc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").expect("static pattern is valid"))
}

fn extract_locs(xml: &str) -> Vec<String> {
    loc_regex().captures_iter(xml).map(|c| c[1].trim().to_owned()).collect()
}

/// Reader for [`KnowledgeItemKind::Sitemap`] items.
pub struct SitemapReader {
    client: reqwest::Client,
}

impl Default for SitemapReader {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ContentReader for SitemapReader {
    async fn read(&self, context: ReaderContext<'_>) -> Result<Vec<Node>> {
        let KnowledgeItemData::Sitemap { url } = &context.item.data else {
            return Ok(Vec::new());
        };

        if reqwest::Url::parse(url).is_err() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(url)
            .timeout(SITEMAP_FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::content_read(format!("fetching sitemap {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::content_read(format!(
                "fetching sitemap {url}: status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::content_read(format!("reading sitemap body {url}: {e}")))?;
        let locs = extract_locs(&body);

        let page_reader = UrlReader::with_client(self.client.clone());
        let fetched: Vec<(String, String)> = futures::stream::iter(locs)
            .map(|loc| {
                let page_reader = &page_reader;
                async move {
                    match page_reader.fetch_text(&loc).await {
                        Ok(Some(text)) => Some((loc, text)),
                        Ok(None) => None,
                        Err(err) => {
                            tracing::warn!(url = %loc, error = %err, "sitemap page fetch failed, skipping");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(PAGE_FETCH_CONCURRENCY)
            .filter_map(|result| async move { result })
            .collect()
            .await;

        if context.cancellation.is_cancelled() {
            return Err(Error::cancelled("Cancelled"));
        }

        let mut nodes = Vec::new();
        for (loc, text) in fetched {
            for chunk in split_fixed(&text, context.chunk_size, context.chunk_overlap) {
                nodes.push(Node {
                    text: chunk,
                    metadata: NodeMetadata::new(context.item.id.clone(), loc.clone(), KnowledgeItemKind::Sitemap),
                });
            }
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_loc_entries() {
        let xml = "<urlset><url><loc>https://a.example.com/1</loc></url><url><loc>https://a.example.com/2</loc></url></urlset>";
        let locs = extract_locs(xml);
        assert_eq!(locs, vec!["https://a.example.com/1".to_owned(), "https://a.example.com/2".to_owned()]);
    }

    #[test]
    fn no_loc_entries_is_empty() {
        assert!(extract_locs("<urlset></urlset>").is_empty());
    }
}
