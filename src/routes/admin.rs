use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{AuditEntry, Recommendation},
    services::{
        admin::{parse_score, ScoreChange},
        DashboardStats, StreamerOverview,
    },
};

use super::AppState;

/// Score body; numbers and numeric strings are both accepted
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub score: serde_json::Value,
}

pub async fn stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    state.identity.require_admin().await?;
    Ok(Json(state.admin.stats().await?))
}

pub async fn streamers(State(state): State<AppState>) -> AppResult<Json<Vec<StreamerOverview>>> {
    state.identity.require_admin().await?;
    Ok(Json(state.admin.streamers().await?))
}

pub async fn audit_log(State(state): State<AppState>) -> AppResult<Json<Vec<AuditEntry>>> {
    state.identity.require_admin().await?;
    Ok(Json(state.admin.audit_log().await?))
}

pub async fn set_score(
    State(state): State<AppState>,
    Path((streamer, movie_id)): Path<(String, u64)>,
    Json(request): Json<ScoreRequest>,
) -> AppResult<Json<ScoreChange>> {
    let admin = state.identity.require_admin().await?;
    let score = parse_score(&request.score)?;
    let change = state
        .admin
        .set_custom_score(&admin, &streamer, movie_id, score)
        .await?;
    Ok(Json(change))
}

pub async fn delete_recommendation(
    State(state): State<AppState>,
    Path((streamer, movie_id)): Path<(String, u64)>,
) -> AppResult<Json<Recommendation>> {
    let admin = state.identity.require_admin().await?;
    let removed = state
        .admin
        .delete_recommendation(&admin, &streamer, movie_id)
        .await?;
    Ok(Json(removed))
}
