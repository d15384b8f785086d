use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MoviePage, Trailer},
    services::FeedOptions,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "first_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

/// Language and adult filter of the active identity, or the configured defaults
pub(crate) async fn viewer_options(state: &AppState) -> AppResult<FeedOptions> {
    Ok(match state.identity.current().await? {
        Some(identity) => FeedOptions {
            language: identity.language,
            adult_filter: identity.adult_filter,
        },
        None => FeedOptions {
            language: state.config.default_language.clone(),
            adult_filter: state.config.default_adult_filter,
        },
    })
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<MoviePage>> {
    let options = viewer_options(&state).await?;
    let page = state
        .catalog
        .search(&query.q, &options.language, !options.adult_filter, query.page)
        .await?;
    Ok(Json(page))
}

pub async fn popular(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    let options = viewer_options(&state).await?;
    let page = state
        .catalog
        .popular(&options.language, !options.adult_filter, query.page)
        .await;
    Ok(Json(page))
}

pub async fn top_rated(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    let options = viewer_options(&state).await?;
    let page = state
        .catalog
        .top_rated(&options.language, !options.adult_filter, query.page)
        .await;
    Ok(Json(page))
}

pub async fn upcoming(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    let options = viewer_options(&state).await?;
    let page = state
        .catalog
        .upcoming(&options.language, !options.adult_filter, query.page)
        .await;
    Ok(Json(page))
}

pub async fn by_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<u64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    let options = viewer_options(&state).await?;
    let page = state
        .catalog
        .by_genre(genre_id, &options.language, !options.adult_filter, query.page)
        .await;
    Ok(Json(page))
}

pub async fn details(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<MovieDetails>> {
    let options = viewer_options(&state).await?;
    state
        .catalog
        .details(movie_id, &options.language)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))
}

pub async fn trailer(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<Trailer>> {
    let options = viewer_options(&state).await?;
    state
        .catalog
        .trailer(movie_id, &options.language)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No trailer for movie {}", movie_id)))
}
