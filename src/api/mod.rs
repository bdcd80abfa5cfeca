pub mod match_api;

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::{Catalog, CatalogItem};
use crate::embedding;
use crate::ranker::SimilarityRanker;

/// Application state for the web API
#[derive(Clone)]
pub struct AppState {
    pub ranker: Arc<SimilarityRanker>,
    pub catalog: Arc<Catalog>,
}

/// Create the main API router
pub fn create_api_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/catalog", get(list_catalog))
        .route("/api/match", post(match_api::match_vibes))
        // Path the web frontend invokes
        .route("/functions/v1/vibe-matcher", post(match_api::match_vibes))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthParams {
    #[serde(default)]
    pub deep: bool,
}

/// Health check endpoint; `?deep=true` also probes the embedding provider.
async fn health_check(
    State(state): State<AppState>,
    Query(params): Query<HealthParams>,
) -> Json<Value> {
    let mut body = json!({
        "status": "ok",
        "service": "vibe-matcher",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.ranker.model(),
        "catalogSize": state.catalog.len(),
    });

    if params.deep {
        let health = embedding::health_check(state.ranker.embedder()).await;
        if !health.is_healthy() {
            body["status"] = json!("degraded");
        }
        body["embedding"] = json!(health);
    }

    Json(body)
}

async fn list_catalog(State(state): State<AppState>) -> Json<Vec<CatalogItem>> {
    Json(state.catalog.items().to_vec())
}
