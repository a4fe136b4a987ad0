//! Evidence documents produced by the source retrievers
//!
//! Each retriever kind has its own typed payload. All of them share the
//! same base view: a `content` string that is fed to the model and a
//! `metadata` mapping used for logging and inspection.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Identity of a source retriever
///
/// The declaration order is the tie-break priority used by the ensemble:
/// sanctions first, then the encyclopedia, then the static instructions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RetrieverKind {
    /// Remote sanctions entity-matching service
    Sanctions,
    /// Remote encyclopedic summaries
    Wiki,
    /// Local guidance corpus behind an embedding index
    Instructions,
}

impl RetrieverKind {
    /// All kinds in priority order
    pub const ALL: [RetrieverKind; 3] = [
        RetrieverKind::Sanctions,
        RetrieverKind::Wiki,
        RetrieverKind::Instructions,
    ];

    /// Tie-break priority (lower wins)
    pub fn priority(self) -> usize {
        match self {
            RetrieverKind::Sanctions => 0,
            RetrieverKind::Wiki => 1,
            RetrieverKind::Instructions => 2,
        }
    }

    /// Stable lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            RetrieverKind::Sanctions => "sanctions",
            RetrieverKind::Wiki => "wiki",
            RetrieverKind::Instructions => "instructions",
        }
    }
}

impl fmt::Display for RetrieverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A matched entity from the sanctions service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanctionsEvidence {
    content: String,

    /// Entity identifier in the sanctions registry
    pub entity_id: String,

    /// Names recorded for the entity
    pub names: Vec<String>,

    /// Match score reported by the service
    pub score: f64,

    /// Whether the service considers this a match
    pub matched: bool,

    /// Topic tags, sorted and deduplicated
    pub topics: Vec<String>,

    /// Datasets the entity appears in, sorted and deduplicated
    pub datasets: Vec<String>,

    /// Key of the query that produced the match
    pub query: String,
}

impl SanctionsEvidence {
    /// Build a sanctions document; topics and datasets are normalized
    pub fn new(
        entity_id: impl Into<String>,
        names: Vec<String>,
        score: f64,
        matched: bool,
        topics: impl IntoIterator<Item = String>,
        datasets: impl IntoIterator<Item = String>,
        query: impl Into<String>,
    ) -> Self {
        let content = format!("Sanctions data for {}", names.join(", "));
        Self {
            content,
            entity_id: entity_id.into(),
            names,
            score,
            matched,
            topics: dedup_sorted(topics),
            datasets: dedup_sorted(datasets),
            query: query.into(),
        }
    }
}

/// An encyclopedic page summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiEvidence {
    /// Page summary text
    pub summary: String,

    /// Page title
    pub title: String,

    /// Canonical page URL, when the service reports one
    pub url: Option<String>,

    /// Page identifier
    pub page_id: u64,
}

/// A chunk of the static guidance corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionEvidence {
    /// Chunk text
    pub text: String,

    /// Chunk position in the corpus
    pub chunk: usize,

    /// Cosine similarity to the query
    pub similarity: f32,

    /// Where the corpus was loaded from
    pub source: String,
}

/// A retrieved document, tagged by the retriever that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EvidenceDocument {
    /// Sanctions match
    Sanctions(SanctionsEvidence),
    /// Encyclopedic summary
    Wiki(WikiEvidence),
    /// Guidance chunk
    Instructions(InstructionEvidence),
}

impl EvidenceDocument {
    /// Retriever that produced this document
    pub fn kind(&self) -> RetrieverKind {
        match self {
            EvidenceDocument::Sanctions(_) => RetrieverKind::Sanctions,
            EvidenceDocument::Wiki(_) => RetrieverKind::Wiki,
            EvidenceDocument::Instructions(_) => RetrieverKind::Instructions,
        }
    }

    /// Text fed to the model
    pub fn content(&self) -> &str {
        match self {
            EvidenceDocument::Sanctions(doc) => &doc.content,
            EvidenceDocument::Wiki(doc) => &doc.summary,
            EvidenceDocument::Instructions(doc) => &doc.text,
        }
    }

    /// Retriever-specific metadata as a string-keyed mapping
    pub fn metadata(&self) -> Map<String, Value> {
        let value = match self {
            EvidenceDocument::Sanctions(doc) => json!({
                "id": doc.entity_id,
                "name": doc.names,
                "score": doc.score,
                "match": doc.matched,
                "topics": doc.topics,
                "datasets": doc.datasets,
                "query": doc.query,
            }),
            EvidenceDocument::Wiki(doc) => json!({
                "title": doc.title,
                "source": doc.url,
                "page_id": doc.page_id,
            }),
            EvidenceDocument::Instructions(doc) => json!({
                "chunk": doc.chunk,
                "similarity": doc.similarity,
                "source": doc.source,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

fn dedup_sorted(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_priority_matches_ordering() {
        let mut kinds = vec![
            RetrieverKind::Instructions,
            RetrieverKind::Sanctions,
            RetrieverKind::Wiki,
        ];
        kinds.sort();
        assert_eq!(kinds, RetrieverKind::ALL.to_vec());
        assert!(RetrieverKind::Sanctions.priority() < RetrieverKind::Wiki.priority());
        assert!(RetrieverKind::Wiki.priority() < RetrieverKind::Instructions.priority());
    }

    #[test]
    fn test_sanctions_content_and_dedup() {
        let doc = SanctionsEvidence::new(
            "NK-123",
            strings(&["SovCo Capital Partners"]),
            0.87,
            true,
            strings(&["sanction", "role.oligarch", "sanction"]),
            strings(&["us_ofac_sdn", "eu_fsf", "us_ofac_sdn"]),
            "query-B",
        );
        assert_eq!(doc.content, "Sanctions data for SovCo Capital Partners");
        assert_eq!(doc.topics, strings(&["role.oligarch", "sanction"]));
        assert_eq!(doc.datasets, strings(&["eu_fsf", "us_ofac_sdn"]));
    }

    #[test]
    fn test_metadata_per_kind() {
        let doc = EvidenceDocument::Sanctions(SanctionsEvidence::new(
            "Q1",
            strings(&["A", "B"]),
            0.5,
            false,
            Vec::new(),
            strings(&["default"]),
            "query-A",
        ));
        let meta = doc.metadata();
        assert_eq!(meta["id"], "Q1");
        assert_eq!(meta["name"], json!(["A", "B"]));
        assert_eq!(meta["match"], false);
        assert_eq!(doc.content(), "Sanctions data for A, B");
        assert_eq!(doc.kind(), RetrieverKind::Sanctions);

        let doc = EvidenceDocument::Wiki(WikiEvidence {
            summary: "A bank.".to_string(),
            title: "Socombank".to_string(),
            url: None,
            page_id: 42,
        });
        assert_eq!(doc.metadata()["title"], "Socombank");
        assert_eq!(doc.content(), "A bank.");
    }

    #[test]
    fn test_tagged_serialization() {
        let doc = EvidenceDocument::Instructions(InstructionEvidence {
            text: "Flag shell companies.".to_string(),
            chunk: 3,
            similarity: 0.5,
            source: "guidance.md".to_string(),
        });
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["kind"], "instructions");
        let back: EvidenceDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
