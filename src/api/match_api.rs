use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::AppState;
use crate::catalog::CatalogItem;
use crate::ranker::{MatchResult, RankError};

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub query: Option<String>,

    /// Candidates to rank; the server catalog when omitted
    #[serde(default)]
    pub products: Option<Vec<CatalogItem>>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Rank(RankError),
}

impl From<RankError> for ApiError {
    fn from(e: RankError) -> Self {
        match e {
            RankError::Input(msg) => ApiError::BadRequest(msg),
            other => ApiError::Rank(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message, "kind": "input" })),
            )
                .into_response(),
            ApiError::Rank(e) => {
                error!(error = %e, kind = e.kind(), "Error in vibe-matcher");
                let mut body = json!({ "error": e.to_string(), "kind": e.kind() });
                if let Some(status) = e.provider_status() {
                    body["providerStatus"] = json!(status);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Rank the supplied products (or the server catalog) against a vibe query.
pub async fn match_vibes(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResult>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let query = request
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing query".to_string()))?;

    let result = match request.products {
        Some(products) => state.ranker.rank(&query, &products).await?,
        None => state.ranker.rank_catalog(&query, &state.catalog).await?,
    };

    Ok(Json(result))
}
