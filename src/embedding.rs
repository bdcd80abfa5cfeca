use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::EmbeddingConfig;

pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

const MOCK_MODEL: &str = "mock-model";
const MOCK_DIMENSIONS: usize = 256;
const HEALTH_PROBE_TEXT: &str = "Health check test";

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("embedding provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("embedding provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl EmbeddingError {
    /// HTTP status reported by the provider, if the call got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Rate limits, upstream 5xx and network failures, including a response
    /// body cut off mid-stream. Authentication and malformed payloads are
    /// configuration problems.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
            }
            Self::Malformed(_) | Self::Client(_) => false,
        }
    }
}

/// Text-to-vector capability the ranker is built on.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model identifier; every vector compared by the ranker comes from it.
    fn model(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAI,
    Mock, // Offline, deterministic
}

impl EmbeddingProvider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimpleEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: EmbeddingProvider,
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}

impl SimpleEmbedder {
    pub fn new(api_key: String) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            api_key,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            provider: EmbeddingProvider::OpenAI,
        })
    }

    pub fn new_mock() -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: build_client(Duration::from_secs(1))?,
            api_key: String::new(),
            model: MOCK_MODEL.to_string(),
            base_url: String::new(),
            provider: EmbeddingProvider::Mock,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let provider = EmbeddingProvider::parse(&config.provider).ok_or_else(|| {
            EmbeddingError::Client(format!("unknown embedding provider '{}'", config.provider))
        })?;

        // Hash-seeded vectors are not the configured model's output
        let model = match provider {
            EmbeddingProvider::OpenAI => config.model.clone(),
            EmbeddingProvider::Mock => MOCK_MODEL.to_string(),
        };

        Ok(Self {
            client: build_client(Duration::from_secs(config.timeout_seconds))?,
            api_key: config.api_key.clone(),
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            provider,
        })
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn provider(&self) -> EmbeddingProvider {
        self.provider
    }

    async fn generate_openai_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OpenAIEmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = status.as_u16(), %body, "Embedding API error");
            return Err(status_error(status, body));
        }

        // A body cut off in transit stays a transport error; only bytes that
        // arrive intact and fail to decode count as malformed.
        let bytes = response.bytes().await?;
        let payload: OpenAIEmbeddingResponse = serde_json::from_slice(&bytes)
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

        let embedding = payload
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Malformed("no embedding data in response".into()))?;

        check_vector(embedding)
    }

    /// Hash-seeded unit vector; identical text always maps to the same vector.
    fn generate_mock_embedding(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();

        let mut embedding: Vec<f32> = (0..MOCK_DIMENSIONS)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((seed >> 33) % 1000) as f32 / 1000.0 - 0.5
            })
            .collect();

        let magnitude = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }
        embedding
    }
}

#[async_trait]
impl Embedder for SimpleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        debug!(provider = ?self.provider, len = text.len(), "Generating embedding");
        match self.provider {
            EmbeddingProvider::OpenAI => self.generate_openai_embedding(text).await,
            EmbeddingProvider::Mock => Ok(self.generate_mock_embedding(text)),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Health status of the embedding provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingHealth {
    pub status: String,
    pub model: String,
    pub response_time_ms: u64,
    pub embedding_dimensions: usize,
    pub error: Option<String>,
}

impl EmbeddingHealth {
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// Embed a fixed probe string and report how the provider responded.
pub async fn health_check(embedder: &dyn Embedder) -> EmbeddingHealth {
    let start_time = Instant::now();
    let result = embedder.embed(HEALTH_PROBE_TEXT).await;
    let response_time_ms = start_time.elapsed().as_millis() as u64;

    let (status, embedding_dimensions, error) = match result {
        Ok(embedding) => ("healthy", embedding.len(), None),
        Err(e) => ("unhealthy", 0, Some(e.to_string())),
    };

    EmbeddingHealth {
        status: status.to_string(),
        model: embedder.model().to_string(),
        response_time_ms,
        embedding_dimensions,
        error,
    }
}

fn build_client(timeout: Duration) -> Result<Client, EmbeddingError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EmbeddingError::Client(e.to_string()))
}

fn status_error(status: StatusCode, body: String) -> EmbeddingError {
    EmbeddingError::Status {
        status: status.as_u16(),
        body,
    }
}

fn check_vector(embedding: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
    if embedding.is_empty() {
        return Err(EmbeddingError::Malformed("empty embedding vector".into()));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::Malformed(
            "embedding contains non-finite values".into(),
        ));
    }
    Ok(embedding)
}
