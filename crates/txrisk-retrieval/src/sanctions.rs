//! Sanctions-matching retriever
//!
//! Sends one multi-query match request per call: a `Person` query built from
//! the `Person:` hint and a `Company` query built from the `Company:` hint.
//! Missing hints are sent as empty names rather than rejected. Every
//! candidate entity in the response becomes one evidence document.
//!
//! A non-success status is always an error. An empty match and a failed
//! lookup mean different things for risk scoring, so failures are never
//! converted into empty results here.

use crate::RetrievalError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};
use txrisk_domain::traits::Retriever;
use txrisk_domain::{EvidenceDocument, QueryHints, RetrieverKind, SanctionsEvidence};

/// Public matching API
pub const DEFAULT_ENDPOINT: &str = "https://api.opensanctions.org";

/// Default dataset collection
pub const DEFAULT_DATASET: &str = "default";

const PERSON_QUERY: &str = "query-A";
const COMPANY_QUERY: &str = "query-B";

/// Retriever backed by an OpenSanctions-compatible `/match` endpoint
pub struct SanctionsRetriever {
    endpoint: String,
    dataset: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    #[serde(default)]
    responses: BTreeMap<String, QueryResponse>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<MatchCandidate>,
}

#[derive(Debug, Deserialize)]
struct MatchCandidate {
    id: String,
    #[serde(default)]
    score: f64,
    #[serde(rename = "match", default)]
    matched: bool,
    #[serde(default)]
    datasets: Vec<String>,
    #[serde(default)]
    properties: CandidateProperties,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateProperties {
    #[serde(default)]
    name: Vec<String>,
    #[serde(default)]
    topics: Vec<String>,
}

impl SanctionsRetriever {
    /// Create a retriever
    pub fn new(
        endpoint: impl Into<String>,
        dataset: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                RetrievalError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            dataset: dataset.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn request_body(hints: &QueryHints) -> serde_json::Value {
        json!({
            "queries": {
                PERSON_QUERY: {
                    "schema": "Person",
                    "properties": { "name": [hints.person] }
                },
                COMPANY_QUERY: {
                    "schema": "Company",
                    "properties": { "name": [hints.company] }
                }
            }
        })
    }

    fn into_documents(response: MatchResponse) -> Vec<EvidenceDocument> {
        // BTreeMap iteration keeps query-A (person) ahead of query-B (company)
        response
            .responses
            .into_iter()
            .flat_map(|(query, answer)| {
                answer.results.into_iter().map(move |candidate| {
                    EvidenceDocument::Sanctions(SanctionsEvidence::new(
                        candidate.id,
                        candidate.properties.name,
                        candidate.score,
                        candidate.matched,
                        candidate.properties.topics,
                        candidate.datasets,
                        query.clone(),
                    ))
                })
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for SanctionsRetriever {
    type Error = RetrievalError;

    fn kind(&self) -> RetrieverKind {
        RetrieverKind::Sanctions
    }

    #[instrument(skip(self, query), fields(dataset = %self.dataset))]
    async fn retrieve(&self, query: &str) -> Result<Vec<EvidenceDocument>, RetrievalError> {
        let hints = QueryHints::parse(query);
        debug!(person = %hints.person, company = %hints.company, "Matching sanctions entities");

        let url = format!("{}/match/{}", self.endpoint, self.dataset);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", self.api_key))
            .json(&Self::request_body(&hints))
            .send()
            .await
            .map_err(|e| {
                RetrievalError::remote(RetrieverKind::Sanctions, format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::remote(
                RetrieverKind::Sanctions,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let parsed: MatchResponse = response.json().await.map_err(|e| {
            RetrievalError::remote(
                RetrieverKind::Sanctions,
                format!("Failed to parse match response: {}", e),
            )
        })?;

        let documents = Self::into_documents(parsed);
        debug!(matches = documents.len(), "Sanctions matching complete");
        Ok(documents)
    }
}
