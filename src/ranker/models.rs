use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;

/// A catalog item with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub item: CatalogItem,

    /// Cosine similarity rounded to three decimals
    pub similarity: f64,

    /// Full-precision similarity the ranking was sorted on
    #[serde(skip)]
    pub raw_similarity: f64,
}

/// Output of a ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub matches: Vec<ScoredCandidate>,

    /// Wall-clock milliseconds for the whole ranking
    pub latency: u64,

    /// Dimensionality of the query embedding
    pub query_embedding_size: usize,
}

impl MatchResult {
    pub fn top_match(&self) -> Option<&ScoredCandidate> {
        self.matches.first()
    }
}
