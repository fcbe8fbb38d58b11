//! Trend API endpoints.
//!
//! The track endpoint is fire-and-forget: it answers before the increment
//! reaches the store and never reports a store failure to the caller.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, LookupParams, TrackRequest, TrendingParams};
use crate::models::{TrendRecord, TrendStats};
use crate::services::TrendingQuery;

/// `POST /api/trends/track`
pub async fn track_search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrackRequest>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    state.trend_service().track(&request.query);
    (StatusCode::ACCEPTED, Json(ApiResponse::success(())))
}

/// `GET /api/trends?limit=N`
///
/// The limit defaults to `trends.default_limit` and is clamped to
/// `[1, trends.max_limit]`.
pub async fn get_trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingParams>,
) -> Result<Json<ApiResponse<Vec<TrendingQuery>>>, ApiError> {
    let limit = state.config().trends.clamp_limit(params.limit);
    let items = state.trend_service().top_trending(limit).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// `GET /api/trends/stats`
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TrendStats>>, ApiError> {
    let stats = state.trend_service().stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// `GET /api/trends/lookup?query=...`
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<ApiResponse<TrendRecord>>, ApiError> {
    let record = state
        .trend_service()
        .lookup(&params.query)
        .await?
        .ok_or_else(|| ApiError::not_found("Query", format!("'{}'", params.query.trim())))?;

    Ok(Json(ApiResponse::success(record)))
}
