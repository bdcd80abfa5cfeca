use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::{api::AppState, Catalog, Config, SimilarityRanker, SimpleEmbedder};

/// Dependency injection container for the application
pub struct DependencyContainer {
    pub config: Config,
    pub embedder: Arc<SimpleEmbedder>,
    pub ranker: Arc<SimilarityRanker>,
    pub catalog: Arc<Catalog>,
}

impl DependencyContainer {
    pub fn new(config: Config) -> Result<Self> {
        info!("🔧 Initializing dependency container...");

        let embedder = Arc::new(
            SimpleEmbedder::from_config(&config.embedding)
                .context("Failed to create embedding client")?,
        );

        let ranker = Arc::new(
            SimilarityRanker::new(embedder.clone())
                .with_max_concurrent_embeddings(config.ranker.max_concurrent_embeddings),
        );

        let catalog = Arc::new(Catalog::load(config.catalog_path.as_deref())?);

        info!(
            provider = %config.embedding.provider,
            model = %config.embedding.model,
            catalog_size = catalog.len(),
            "✅ Dependency container initialized"
        );

        Ok(Self {
            config,
            embedder,
            ranker,
            catalog,
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            ranker: self.ranker.clone(),
            catalog: self.catalog.clone(),
        }
    }
}
