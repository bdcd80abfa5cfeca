use crate::application::{shutdown_signal, DependencyContainer};
use crate::api::create_api_router;
use crate::{embedding, Catalog, Config};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Starts the HTTP API
pub struct ServerCommandHandler {
    container: Arc<DependencyContainer>,
}

impl ServerCommandHandler {
    pub fn new(container: Arc<DependencyContainer>) -> Self {
        Self { container }
    }

    pub async fn start_http(&self) -> Result<()> {
        let config = &self.container.config;
        let addr = format!("{}:{}", config.http_host, config.http_port);

        let router = create_api_router(
            self.container.app_state(),
            Duration::from_secs(config.operational.request_timeout_seconds),
        );

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("🚀 Vibe matcher listening on http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        info!("🎉 Server stopped");
        Ok(())
    }
}

/// One-shot ranking from the command line
pub struct RankCommandHandler {
    container: Arc<DependencyContainer>,
}

impl RankCommandHandler {
    pub fn new(container: Arc<DependencyContainer>) -> Self {
        Self { container }
    }

    /// Rank against `catalog` (or the configured catalog) and print JSON.
    pub async fn rank(&self, query: &str, catalog: Option<&Path>) -> Result<()> {
        let result = match catalog {
            Some(path) => {
                let catalog = Catalog::from_path(path)?;
                self.container.ranker.rank_catalog(query, &catalog).await?
            }
            None => {
                self.container
                    .ranker
                    .rank_catalog(query, &self.container.catalog)
                    .await?
            }
        };

        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}

pub struct HealthCommandHandler {
    container: Arc<DependencyContainer>,
}

impl HealthCommandHandler {
    pub fn new(container: Arc<DependencyContainer>) -> Self {
        Self { container }
    }

    pub async fn run_health_check(&self) -> Result<()> {
        info!("🏥 Probing embedding provider...");

        let health = embedding::health_check(self.container.embedder.as_ref()).await;
        if health.is_healthy() {
            info!(
                "✅ {} healthy: {} dimensions in {}ms",
                health.model, health.embedding_dimensions, health.response_time_ms
            );
            Ok(())
        } else {
            let reason = health.error.unwrap_or_default();
            error!("❌ {} unhealthy: {}", health.model, reason);
            Err(anyhow::anyhow!("Embedding provider health check failed: {reason}"))
        }
    }
}

/// Configuration commands; these run before the container is built so a
/// broken configuration can still be inspected.
pub struct ConfigCommandHandler;

impl ConfigCommandHandler {
    /// Print the report for `loaded`, including the load error if the
    /// environment could not be parsed.
    pub fn diagnose(loaded: &Result<Config>) {
        println!("{}", Self::diagnostic_report(loaded));
    }

    pub fn diagnostic_report(loaded: &Result<Config>) -> String {
        match loaded {
            Ok(config) => config.create_diagnostic_report(),
            Err(e) => format!(
                "=== Vibe Matcher - Configuration Report ===\n\n\
                 Failed to load configuration from environment:\n  ❌ {e:#}\n\n\
                 === End Configuration Report ===\n"
            ),
        }
    }

    /// Write a `.env.example` next to the working directory
    pub fn init_config(output: Option<PathBuf>) -> Result<PathBuf> {
        let path = output.unwrap_or_else(|| PathBuf::from(".env.example"));
        std::fs::write(&path, SAMPLE_ENV)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        info!("📋 Created {} with default configuration", path.display());
        info!("   Copy this to .env and modify as needed");
        Ok(path)
    }
}

const SAMPLE_ENV: &str = r#"# Vibe Matcher Configuration

# Embedding Configuration (openai or mock)
EMBEDDING_PROVIDER=openai
EMBEDDING_MODEL=text-embedding-3-small
EMBEDDING_BASE_URL=https://api.openai.com
EMBEDDING_API_KEY=
EMBEDDING_TIMEOUT_SECONDS=30

# Ranking
# MAX_CONCURRENT_EMBEDDINGS=8

# Server Configuration
HTTP_HOST=0.0.0.0
HTTP_PORT=8080
REQUEST_TIMEOUT_SECONDS=60
# CATALOG_PATH=./catalog.json

# Logging
LOG_LEVEL=info
LOG_FORMAT=text
"#;
