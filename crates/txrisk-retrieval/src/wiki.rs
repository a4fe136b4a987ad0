//! Encyclopedic summary retriever
//!
//! One MediaWiki `generator=search` call returns the top pages together with
//! their plain-text intro extracts.

use crate::RetrievalError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use txrisk_domain::traits::Retriever;
use txrisk_domain::{EvidenceDocument, RetrieverKind, WikiEvidence};

/// English Wikipedia API
pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

const USER_AGENT: &str = concat!("txrisk/", env!("CARGO_PKG_VERSION"));

/// Retriever backed by the MediaWiki query API
pub struct WikiRetriever {
    endpoint: String,
    top_k: usize,
    max_chars: usize,
    best_effort: bool,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    pageid: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    index: usize,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: Option<String>,
}

impl WikiRetriever {
    /// Create a retriever with 3 results of at most 4000 characters
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                RetrievalError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            endpoint: endpoint.into(),
            top_k: 3,
            max_chars: 4000,
            best_effort: true,
            client,
        })
    }

    /// Set the number of pages returned
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the summary length limit
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Whether failures yield an empty result instead of an error
    pub fn with_best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    async fn search(&self, query: &str) -> Result<Vec<EvidenceDocument>, RetrievalError> {
        let limit = self.top_k.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts|info"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("inprop", "url"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await
            .map_err(|e| RetrievalError::remote(RetrieverKind::Wiki, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::remote(
                RetrieverKind::Wiki,
                format!("HTTP {}", status),
            ));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            RetrievalError::remote(
                RetrieverKind::Wiki,
                format!("Failed to parse search response: {}", e),
            )
        })?;

        Ok(self.into_documents(parsed))
    }

    fn into_documents(&self, response: SearchResponse) -> Vec<EvidenceDocument> {
        let mut pages = response.query.map(|q| q.pages).unwrap_or_default();
        pages.sort_by_key(|page| page.index);

        pages
            .into_iter()
            .take(self.top_k)
            .map(|page| {
                EvidenceDocument::Wiki(WikiEvidence {
                    summary: page.extract.chars().take(self.max_chars).collect(),
                    title: page.title,
                    url: page.fullurl,
                    page_id: page.pageid,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for WikiRetriever {
    type Error = RetrievalError;

    fn kind(&self) -> RetrieverKind {
        RetrieverKind::Wiki
    }

    #[instrument(skip(self, query))]
    async fn retrieve(&self, query: &str) -> Result<Vec<EvidenceDocument>, RetrievalError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        match self.search(query).await {
            Ok(documents) => {
                debug!(pages = documents.len(), "Wiki lookup complete");
                Ok(documents)
            }
            Err(e) if self.best_effort => {
                warn!(error = %e, "Wiki lookup failed; continuing without encyclopedic evidence");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn retriever() -> WikiRetriever {
        WikiRetriever::new(DEFAULT_ENDPOINT, Duration::from_secs(1))
            .unwrap()
            .with_top_k(2)
            .with_max_chars(5)
    }

    #[test]
    fn pages_sorted_by_search_index_and_truncated() {
        let response: SearchResponse = serde_json::from_value(json!({
            "query": {"pages": [
                {"pageid": 2, "title": "Second", "index": 2, "extract": "Beta text", "fullurl": "https://w/2"},
                {"pageid": 3, "title": "Third", "index": 3, "extract": "Gamma"},
                {"pageid": 1, "title": "First", "index": 1, "extract": "Alphabet"}
            ]}
        }))
        .unwrap();

        let documents = retriever().into_documents(response);
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].content(), "Alpha");
        assert_eq!(documents[1].content(), "Beta ");

        let EvidenceDocument::Wiki(second) = &documents[1] else {
            panic!("expected wiki evidence");
        };
        assert_eq!(second.title, "Second");
        assert_eq!(second.url.as_deref(), Some("https://w/2"));
        assert_eq!(second.page_id, 2);
    }

    #[test]
    fn no_query_block_means_no_pages() {
        let response: SearchResponse =
            serde_json::from_value(json!({"batchcomplete": true})).unwrap();
        assert!(retriever().into_documents(response).is_empty());
    }
}
