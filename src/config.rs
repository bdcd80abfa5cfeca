use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::embedding::{EmbeddingProvider, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Embedding service configuration
    pub embedding: EmbeddingConfig,

    /// HTTP bind address
    pub http_host: String,

    /// HTTP server port
    pub http_port: u16,

    /// JSON catalog file; the built-in catalog is used when unset
    pub catalog_path: Option<PathBuf>,

    /// Ranking settings
    pub ranker: RankerConfig,

    /// Operational settings
    pub operational: OperationalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider (openai or mock)
    pub provider: String,

    /// Model name to use for embeddings
    pub model: String,

    /// Bearer credential for the provider
    pub api_key: String,

    /// Base URL for the embedding service
    pub base_url: String,

    /// Transport timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Ceiling on candidate embedding calls in flight; unset sends all at once
    pub max_concurrent_embeddings: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalConfig {
    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            catalog_path: None,
            ranker: RankerConfig::default(),
            operational: OperationalConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key: String::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for OperationalConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 60,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Config::default();

        // Embedding configuration
        if let Ok(provider) = env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(model) = env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }

        if let Ok(base_url) = env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = base_url;
        }

        if let Some(timeout) = parse_var("EMBEDDING_TIMEOUT_SECONDS")? {
            config.embedding.timeout_seconds = timeout;
        }

        // EMBEDDING_API_KEY wins over the conventional OPENAI_API_KEY
        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            config.embedding.api_key = api_key;
        }
        if let Ok(api_key) = env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = api_key;
        }

        // Server configuration
        if let Ok(host) = env::var("HTTP_HOST") {
            config.http_host = host;
        }

        if let Some(port) = parse_var("HTTP_PORT")? {
            config.http_port = port;
        }

        if let Ok(path) = env::var("CATALOG_PATH") {
            if !path.is_empty() {
                config.catalog_path = Some(PathBuf::from(path));
            }
        }

        // Ranker configuration
        if let Some(limit) = parse_var("MAX_CONCURRENT_EMBEDDINGS")? {
            config.ranker.max_concurrent_embeddings = Some(limit);
        }

        // Operational configuration
        if let Some(timeout) = parse_var("REQUEST_TIMEOUT_SECONDS")? {
            config.operational.request_timeout_seconds = timeout;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            config.operational.log_level = level;
        }

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.operational.json_logs = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match EmbeddingProvider::parse(&self.embedding.provider) {
            Some(EmbeddingProvider::OpenAI) => {
                if self.embedding.api_key.is_empty() {
                    return Err(anyhow::anyhow!(
                        "API key is required for the openai provider (set EMBEDDING_API_KEY or OPENAI_API_KEY)"
                    ));
                }
                if self.embedding.base_url.is_empty() {
                    return Err(anyhow::anyhow!("Base URL is required for the openai provider"));
                }
            }
            Some(EmbeddingProvider::Mock) => {}
            None => {
                return Err(anyhow::anyhow!(
                    "Invalid embedding provider: {}. Must be 'openai' or 'mock'",
                    self.embedding.provider
                ));
            }
        }

        if self.embedding.model.is_empty() {
            return Err(anyhow::anyhow!("Embedding model is required"));
        }

        if self.embedding.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Embedding timeout must be greater than 0"));
        }

        if self.ranker.max_concurrent_embeddings == Some(0) {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_EMBEDDINGS must be greater than 0"
            ));
        }

        if self.operational.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Create a diagnostic report for troubleshooting setup
    pub fn create_diagnostic_report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Vibe Matcher - Configuration Report ===\n\n");

        report.push_str("Embedding Configuration:\n");
        report.push_str(&format!("  Provider: {}\n", self.embedding.provider));
        report.push_str(&format!("  Model: {}\n", self.embedding.model));
        report.push_str(&format!("  Base URL: {}\n", self.embedding.base_url));
        report.push_str(&format!("  Timeout: {}s\n", self.embedding.timeout_seconds));
        report.push_str(&format!(
            "  API Key: {}\n",
            if self.embedding.api_key.is_empty() {
                "Not set"
            } else {
                "***configured***"
            }
        ));

        report.push_str("\nServer Configuration:\n");
        report.push_str(&format!("  Bind: {}:{}\n", self.http_host, self.http_port));
        report.push_str(&format!(
            "  Request Timeout: {}s\n",
            self.operational.request_timeout_seconds
        ));
        report.push_str(&format!(
            "  Catalog: {}\n",
            self.catalog_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string())
        ));
        report.push_str(&format!(
            "  Max Concurrent Embeddings: {}\n",
            self.ranker
                .max_concurrent_embeddings
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        ));

        report.push_str("\nValidation Results:\n");
        match self.validate() {
            Ok(_) => report.push_str("  ✅ All configuration checks passed\n"),
            Err(e) => report.push_str(&format!("  ❌ Configuration error: {e}\n")),
        }

        report.push_str("\n=== End Configuration Report ===\n");
        report
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(None),
    }
}
