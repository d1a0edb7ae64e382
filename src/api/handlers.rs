// src/api/handlers.rs
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::cache::ScoreCache;
use crate::types::ExchangeScore;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("pair parameter is required")]
    MissingPair,
    #[error("pair not available, check configured pairs")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingPair => StatusCode::BAD_REQUEST,
            ApiError::NotFound(pair) => {
                tracing::warn!(pair = %pair, "pair not found in cache");
                StatusCode::NOT_FOUND
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct PairScores {
    pub pair: String,
    pub scores: Vec<ExchangeScore>,
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /v1/scores/{pair}: ranked list for one pair, best first
pub async fn pair_scores(
    State(cache): State<ScoreCache>,
    Path(pair): Path<String>,
) -> Result<Json<PairScores>, ApiError> {
    let pair = pair.trim().to_uppercase();
    if pair.is_empty() {
        return Err(ApiError::MissingPair);
    }
    tracing::debug!(pair = %pair, "fetching scores");

    let scores = cache.get(&pair).await.ok_or_else(|| ApiError::NotFound(pair.clone()))?;
    Ok(Json(PairScores { pair, scores: scores.as_ref().clone() }))
}

/// GET /v1/scores/ with an empty pair segment
pub async fn missing_pair() -> ApiError {
    ApiError::MissingPair
}

/// GET /v1/scores: every cached pair
pub async fn all_scores(State(cache): State<ScoreCache>) -> Json<Vec<PairScores>> {
    let all = cache
        .snapshot()
        .await
        .into_iter()
        .map(|(pair, scores)| PairScores { pair, scores: scores.as_ref().clone() })
        .collect();
    Json(all)
}

/// GET /metrics
#[cfg(feature = "metrics")]
pub async fn metrics() -> String {
    crate::metrics::render()
}
