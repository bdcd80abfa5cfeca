pub mod api;
pub mod application;
pub mod catalog;
pub mod config;
pub mod embedding;
pub mod logging;
pub mod ranker;

pub use catalog::{Catalog, CatalogItem};
pub use config::Config;
pub use embedding::{Embedder, EmbeddingError, EmbeddingHealth, SimpleEmbedder};
pub use ranker::{MatchResult, RankError, ScoredCandidate, SimilarityRanker, TOP_K};
