use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod admin;
pub mod movies;
pub mod recommendations;
pub mod session;
pub mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Session
        .route(
            "/session",
            post(session::login).get(session::current).delete(session::logout),
        )
        .route(
            "/session/preferences",
            patch(session::update_preferences),
        )
        .route("/languages", get(session::languages))
        // Catalog
        .route("/movies/search", get(movies::search))
        .route("/movies/popular", get(movies::popular))
        .route("/movies/top-rated", get(movies::top_rated))
        .route("/movies/upcoming", get(movies::upcoming))
        .route("/movies/genre/:genre_id", get(movies::by_genre))
        .route("/movies/:movie_id", get(movies::details))
        .route("/movies/:movie_id/trailer", get(movies::trailer))
        // Viewer page
        .route(
            "/streamers/:streamer/recommendations",
            get(recommendations::feed),
        )
        .route(
            "/streamers/:streamer/recommendations/:movie_id/upvote",
            post(recommendations::upvote),
        )
        .route(
            "/streamers/:streamer/recommendations/:movie_id/downvote",
            post(recommendations::downvote),
        )
        // Admin dashboard
        .route("/admin/stats", get(admin::stats))
        .route("/admin/streamers", get(admin::streamers))
        .route("/admin/log", get(admin::audit_log))
        .route(
            "/admin/streamers/:streamer/recommendations/:movie_id/score",
            put(admin::set_score),
        )
        .route(
            "/admin/streamers/:streamer/recommendations/:movie_id",
            delete(admin::delete_recommendation),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
