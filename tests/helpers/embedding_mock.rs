//! Mock OpenAI-compatible embedding provider
//!
//! Serves `POST /v1/embeddings` on an ephemeral port so the real HTTP client
//! can be exercised without network access. Vectors are looked up by exact
//! input text; unknown text gets a deterministic byte-derived vector.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const MOCK_API_KEY: &str = "test-key";

#[derive(Clone)]
pub struct MockEmbeddingConfig {
    pub api_key: String,
    pub dimensions: usize,
    pub vectors: HashMap<String, Vec<f32>>,
    pub failures: HashMap<String, u16>, // Respond with this status for the text
    pub malformed: Vec<String>,         // Respond 200 with an unusable body
    pub response_delay_ms: Option<u64>,
}

impl Default for MockEmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: MOCK_API_KEY.to_string(),
            dimensions: 8,
            vectors: HashMap::new(),
            failures: HashMap::new(),
            malformed: Vec::new(),
            response_delay_ms: None,
        }
    }
}

impl MockEmbeddingConfig {
    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing(mut self, text: &str, status: u16) -> Self {
        self.failures.insert(text.to_string(), status);
        self
    }

    pub fn malformed(mut self, text: &str) -> Self {
        self.malformed.push(text.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub input: String,
}

pub struct MockEmbeddingServer {
    config: MockEmbeddingConfig,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

/// Running server: base URL plus the log of requests it has served.
pub struct MockHandle {
    pub url: String,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl MockHandle {
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

impl MockEmbeddingServer {
    pub fn new(config: MockEmbeddingConfig) -> Self {
        Self {
            config,
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn start(self) -> Result<MockHandle, Box<dyn std::error::Error>> {
        let state = AppState {
            config: Arc::new(self.config),
            requests: self.requests.clone(),
        };

        let app = Router::new()
            .route("/v1/embeddings", post(embeddings_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(MockHandle {
            url: format!("http://{addr}"),
            requests: self.requests,
        })
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<MockEmbeddingConfig>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

#[derive(Deserialize)]
struct EmbeddingsRequest {
    model: String,
    input: String,
}

async fn embeddings_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<EmbeddingsRequest>,
) -> Response {
    state.requests.write().await.push(RecordedRequest {
        model: request.model.clone(),
        input: request.input.clone(),
    });

    if let Some(delay) = state.config.response_delay_ms {
        tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
    }

    let expected = format!("Bearer {}", state.config.api_key);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Invalid API key"}})),
        )
            .into_response();
    }

    if let Some(status) = state.config.failures.get(&request.input) {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "upstream exploded").into_response();
    }

    if state.config.malformed.contains(&request.input) {
        return Json(json!({"data": []})).into_response();
    }

    let embedding = state
        .config
        .vectors
        .get(&request.input)
        .cloned()
        .unwrap_or_else(|| byte_embedding(&request.input, state.config.dimensions));

    Json(json!({
        "object": "list",
        "model": request.model,
        "data": [{"object": "embedding", "index": 0, "embedding": embedding}],
    }))
    .into_response()
}

fn byte_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut embedding = vec![0.0f32; dimensions];
    for (i, byte) in text.bytes().enumerate() {
        embedding[i % dimensions] += (byte as f32 / 255.0) - 0.5;
    }

    let magnitude = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for val in embedding.iter_mut() {
            *val /= magnitude;
        }
    }
    embedding
}
