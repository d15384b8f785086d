use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{DownvoteOutcome, MovieSummary, UpvoteOutcome},
    services::StreamerFeed,
};

use super::{movies::viewer_options, AppState};

#[derive(Debug, Serialize)]
pub struct VoteResponse<T> {
    pub outcome: T,
}

/// Ranked recommendations of a streamer, or popular movies when none qualify
pub async fn feed(
    State(state): State<AppState>,
    Path(streamer): Path<String>,
) -> AppResult<Json<StreamerFeed>> {
    let options = viewer_options(&state).await?;
    let viewer = state.identity.current().await?;
    let feed = state
        .recommendations
        .feed(&streamer, &options, viewer.as_ref(), &state.catalog)
        .await?;
    Ok(Json(feed))
}

pub async fn upvote(
    State(state): State<AppState>,
    Path((streamer, movie_id)): Path<(String, u64)>,
    Json(movie): Json<MovieSummary>,
) -> AppResult<Json<VoteResponse<UpvoteOutcome>>> {
    let voter = state.identity.current().await?;
    let outcome = state
        .recommendations
        .upvote(&streamer, movie_id, movie, voter.as_ref())
        .await?;
    Ok(Json(VoteResponse { outcome }))
}

pub async fn downvote(
    State(state): State<AppState>,
    Path((streamer, movie_id)): Path<(String, u64)>,
) -> AppResult<Json<VoteResponse<DownvoteOutcome>>> {
    let voter = state.identity.current().await?;
    let outcome = state
        .recommendations
        .downvote(&streamer, movie_id, voter.as_ref())
        .await?;
    Ok(Json(VoteResponse { outcome }))
}
