//! Similarity ranking: embed a query and every candidate, score by cosine
//! similarity, return the top matches.

pub mod error;
pub mod models;
pub mod similarity;

pub use error::{RankError, Result};
pub use models::{MatchResult, ScoredCandidate};
pub use similarity::{cosine_similarity, round_score};

use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::{validate_items, Catalog, CatalogItem};
use crate::embedding::{Embedder, EmbeddingError};

/// Number of matches returned by a ranking.
pub const TOP_K: usize = 3;

pub struct SimilarityRanker {
    embedder: Arc<dyn Embedder>,
    max_concurrent_embeddings: Option<usize>,
}

impl SimilarityRanker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            max_concurrent_embeddings: None,
        }
    }

    /// Bound the candidate fan-out. `None` issues every candidate call at once.
    pub fn with_max_concurrent_embeddings(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent_embeddings = limit.map(|n| n.max(1));
        self
    }

    pub fn model(&self) -> &str {
        self.embedder.model()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub async fn rank_catalog(&self, query: &str, catalog: &Catalog) -> Result<MatchResult> {
        self.rank(query, catalog.items()).await
    }

    /// Rank `candidates` against `query` and return the top [`TOP_K`].
    ///
    /// The query is embedded first; candidate embeddings are then requested
    /// concurrently and awaited together. Any failure aborts the whole call
    /// and no partial result is produced.
    pub async fn rank(&self, query: &str, candidates: &[CatalogItem]) -> Result<MatchResult> {
        let start_time = Instant::now();

        if query.trim().is_empty() {
            return Err(RankError::Input("query is empty".to_string()));
        }
        validate_items(candidates).map_err(RankError::Input)?;

        info!(
            query,
            candidates = candidates.len(),
            model = self.model(),
            "Processing vibe query"
        );

        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            warn!(error = %e, "Query embedding failed");
            RankError::from(e)
        })?;
        if similarity::is_zero_vector(&query_embedding) {
            return Err(RankError::DegenerateVector {
                subject: "query".to_string(),
            });
        }
        let dimensions = query_embedding.len();

        let candidate_embeddings = self.embed_candidates(candidates).await?;

        let mut scored = Vec::with_capacity(candidates.len());
        for (item, embedding) in candidates.iter().zip(candidate_embeddings) {
            if embedding.len() != dimensions {
                return Err(RankError::DimensionMismatch {
                    subject: format!("candidate '{}'", item.id),
                    expected: dimensions,
                    actual: embedding.len(),
                });
            }
            let score = cosine_similarity(&query_embedding, &embedding).ok_or_else(|| {
                RankError::DegenerateVector {
                    subject: format!("candidate '{}'", item.id),
                }
            })?;
            debug!(id = %item.id, score, "Scored candidate");
            scored.push((item, score));
        }

        // Stable: equal scores keep input order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let matches: Vec<ScoredCandidate> = scored
            .into_iter()
            .take(TOP_K)
            .map(|(item, score)| ScoredCandidate {
                item: item.clone(),
                similarity: round_score(score),
                raw_similarity: score,
            })
            .collect();

        let latency = (start_time.elapsed().as_secs_f64() * 1000.0).round() as u64;

        if let Some(top) = matches.first() {
            info!(
                latency_ms = latency,
                top_match = %top.item.name,
                similarity = top.similarity,
                "Ranking complete"
            );
        }

        Ok(MatchResult {
            matches,
            latency,
            query_embedding_size: dimensions,
        })
    }

    /// Every call runs to completion before the batch is judged; the first
    /// failure in input order is reported.
    async fn embed_candidates(&self, candidates: &[CatalogItem]) -> Result<Vec<Vec<f32>>> {
        let limit = self
            .max_concurrent_embeddings
            .unwrap_or(candidates.len())
            .max(1);

        // Futures own their text and embedder handle so the ranking future is Send
        let texts: Vec<String> = candidates.iter().map(CatalogItem::embedding_text).collect();
        let results: Vec<std::result::Result<Vec<f32>, EmbeddingError>> = stream::iter(texts)
            .map(|text| {
                let embedder = Arc::clone(&self.embedder);
                async move { embedder.embed(&text).await }
            })
            .buffered(limit)
            .collect()
            .await;

        results
            .into_iter()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                warn!(error = %e, "Candidate embedding failed, aborting ranking");
                RankError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::time::Duration;
    use tracing_test::traced_test;

    /// Looks vectors up by exact text; unknown text is a provider error.
    #[derive(Default)]
    struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        failures: HashMap<String, u16>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubEmbedder {
        fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.to_string(), vector);
            self
        }

        fn failing(mut self, text: &str, status: u16) -> Self {
            self.failures.insert(text.to_string(), status);
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(AtomicOrdering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            let now = self.in_flight.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, AtomicOrdering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, AtomicOrdering::SeqCst);

            if let Some(status) = self.failures.get(text) {
                return Err(EmbeddingError::Status {
                    status: *status,
                    body: "stub failure".to_string(),
                });
            }
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| EmbeddingError::Malformed(format!("no stub vector for '{text}'")))
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    fn item(id: &str, name: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            vibes: vec![],
            price: 10.0,
            image_url: String::new(),
        }
    }

    fn unit(dims: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dims];
        v[axis] = 1.0;
        v
    }

    fn ranker(stub: StubEmbedder) -> (SimilarityRanker, Arc<StubEmbedder>) {
        let stub = Arc::new(stub);
        (SimilarityRanker::new(stub.clone()), stub)
    }

    #[tokio::test]
    async fn test_identical_text_ranks_above_orthogonal_and_keeps_order() {
        let shirt_a = item("a", "red cotton shirt");
        let shirt_b = item("b", "red cotton shirt");
        let coat = item("c", "blue wool coat");

        let (ranker, stub) = ranker(
            StubEmbedder::default()
                .with("red cotton shirt", unit(3, 0))
                .with(&shirt_a.embedding_text(), unit(3, 0))
                .with(&coat.embedding_text(), unit(3, 1)),
        );

        // Orthogonal item listed first to prove ordering comes from the score
        let candidates = vec![coat, shirt_a, shirt_b];
        let result = ranker.rank("red cotton shirt", &candidates).await.unwrap();

        let ids: Vec<_> = result.matches.iter().map(|m| m.item.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(result.matches[0].similarity, 1.0);
        assert_eq!(result.matches[1].similarity, 1.0);
        assert_eq!(result.matches[2].similarity, 0.0);
        assert_eq!(result.query_embedding_size, 3);
        assert_eq!(stub.calls(), 4);
    }

    #[tokio::test]
    async fn test_rank_runs_on_spawned_task() {
        let tee = item("t", "plain tee");
        let jacket = item("j", "leather jacket");
        let (ranker, stub) = ranker(
            StubEmbedder::default()
                .with("basics", vec![1.0, 0.0])
                .with(&tee.embedding_text(), vec![1.0, 0.0])
                .with(&jacket.embedding_text(), vec![0.0, 1.0]),
        );
        let ranker = Arc::new(ranker);

        let task = tokio::spawn({
            let ranker = Arc::clone(&ranker);
            async move { ranker.rank("basics", &[jacket, tee]).await }
        });
        let result = task.await.unwrap().unwrap();

        assert_eq!(result.matches[0].item.id, "t");
        assert_eq!(result.matches.len(), 2);
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_logs_top_match() {
        let tee = item("t", "plain tee");
        let (ranker, _) = ranker(
            StubEmbedder::default()
                .with("basics", vec![1.0, 0.0])
                .with(&tee.embedding_text(), vec![1.0, 0.0]),
        );

        ranker.rank("basics", &[tee]).await.unwrap();
        assert!(logs_contain("Processing vibe query"));
        assert!(logs_contain("Ranking complete"));
        assert!(logs_contain("plain tee"));
    }

    #[tokio::test]
    async fn test_returns_at_most_top_k() {
        let items: Vec<_> = (0..5).map(|i| item(&i.to_string(), &format!("item {i}"))).collect();
        let mut stub = StubEmbedder::default().with("query", vec![1.0, 0.0]);
        for (i, it) in items.iter().enumerate() {
            stub = stub.with(&it.embedding_text(), vec![1.0, i as f32]);
        }
        let (ranker, _) = ranker(stub);

        let result = ranker.rank("query", &items).await.unwrap();
        assert_eq!(result.matches.len(), TOP_K);
        let ids: Vec<_> = result.matches.iter().map(|m| m.item.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);

        let two = &items[..2];
        let result = ranker.rank("query", two).await.unwrap();
        assert_eq!(result.matches.len(), 2);
    }

    #[tokio::test]
    async fn test_sort_uses_full_precision_before_rounding() {
        let low = item("low", "low");
        let high = item("high", "high");
        // Both round to 0.123; only the unrounded score separates them.
        let q = vec![1.0f32, 0.0];
        let v_low = vec![0.1234f32, (1.0f32 - 0.1234 * 0.1234).sqrt()];
        let v_high = vec![0.12342f32, (1.0f32 - 0.12342 * 0.12342).sqrt()];

        let (ranker, _) = ranker(
            StubEmbedder::default()
                .with("q", q)
                .with(&low.embedding_text(), v_low)
                .with(&high.embedding_text(), v_high),
        );

        let result = ranker.rank("q", &[low, high]).await.unwrap();
        assert_eq!(result.matches[0].item.id, "high");
        assert_eq!(result.matches[0].similarity, 0.123);
        assert_eq!(result.matches[1].similarity, 0.123);
        assert!(result.matches[0].raw_similarity > result.matches[1].raw_similarity);
    }

    #[tokio::test]
    async fn test_query_failure_aborts_before_candidates() {
        let items = vec![item("1", "one")];
        let (ranker, stub) = ranker(
            StubEmbedder::default()
                .failing("query", 401)
                .with(&items[0].embedding_text(), vec![1.0]),
        );

        let err = ranker.rank("query", &items).await.unwrap_err();
        assert!(matches!(err, RankError::EmbeddingProvider(_)));
        assert_eq!(err.provider_status(), Some(401));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_candidate_failure_fails_whole_batch() {
        let items = vec![item("1", "one"), item("2", "two"), item("3", "three")];
        let (ranker, stub) = ranker(
            StubEmbedder::default()
                .with("query", vec![1.0, 0.0])
                .with(&items[0].embedding_text(), vec![1.0, 0.0])
                .failing(&items[1].embedding_text(), 500)
                .with(&items[2].embedding_text(), vec![0.0, 1.0]),
        );

        let err = ranker.rank("query", &items).await.unwrap_err();
        assert_eq!(err.kind(), "embedding_provider");
        assert_eq!(err.provider_status(), Some(500));
        // Every issued call ran to completion
        assert_eq!(stub.calls(), 4);
    }

    #[tokio::test]
    async fn test_input_errors_make_no_calls() {
        let items = vec![item("1", "one")];
        let (ranker, stub) = ranker(StubEmbedder::default());

        assert!(matches!(
            ranker.rank("   ", &items).await,
            Err(RankError::Input(_))
        ));
        assert!(matches!(
            ranker.rank("query", &[]).await,
            Err(RankError::Input(_))
        ));
        let dup = vec![item("1", "one"), item("1", "again")];
        assert!(matches!(
            ranker.rank("query", &dup).await,
            Err(RankError::Input(_))
        ));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_vectors_are_degenerate() {
        let items = vec![item("1", "one")];

        let (ranker, stub) = ranker(
            StubEmbedder::default()
                .with("query", vec![0.0, 0.0])
                .with(&items[0].embedding_text(), vec![1.0, 0.0]),
        );
        let err = ranker.rank("query", &items).await.unwrap_err();
        assert!(matches!(err, RankError::DegenerateVector { ref subject } if subject == "query"));
        assert_eq!(stub.calls(), 1);

        let (ranker, _) = ranker_with_zero_candidate(&items[0]);
        let err = ranker.rank("query", &items).await.unwrap_err();
        assert_eq!(err.kind(), "degenerate_vector");
        assert!(err.to_string().contains("candidate '1'"));
    }

    fn ranker_with_zero_candidate(it: &CatalogItem) -> (SimilarityRanker, Arc<StubEmbedder>) {
        ranker(
            StubEmbedder::default()
                .with("query", vec![1.0, 0.0])
                .with(&it.embedding_text(), vec![0.0, 0.0]),
        )
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let items = vec![item("1", "one")];
        let (ranker, _) = ranker(
            StubEmbedder::default()
                .with("query", vec![1.0, 0.0])
                .with(&items[0].embedding_text(), vec![1.0, 0.0, 0.0]),
        );

        match ranker.rank("query", &items).await {
            Err(RankError::DimensionMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fan_out_is_unbounded_by_default_and_bounded_on_request() {
        let items: Vec<_> = (0..6).map(|i| item(&i.to_string(), &format!("item {i}"))).collect();
        let build = || {
            let mut stub = StubEmbedder::default()
                .with("query", vec![1.0, 0.0])
                .with_delay(Duration::from_millis(20));
            for it in &items {
                stub = stub.with(&it.embedding_text(), vec![1.0, 1.0]);
            }
            Arc::new(stub)
        };

        let stub = build();
        let ranker = SimilarityRanker::new(stub.clone());
        ranker.rank("query", &items).await.unwrap();
        assert_eq!(stub.max_in_flight.load(AtomicOrdering::SeqCst), items.len());

        let stub = build();
        let ranker = SimilarityRanker::new(stub.clone()).with_max_concurrent_embeddings(Some(2));
        let result = ranker.rank("query", &items).await.unwrap();
        assert_eq!(stub.max_in_flight.load(AtomicOrdering::SeqCst), 2);
        // All scores tie, so input order survives
        let ids: Vec<_> = result.matches.iter().map(|m| m.item.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }
}
