use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{Identity, Language, LoginRequest, PreferencesUpdate, SUPPORTED_LANGUAGES},
};

use super::AppState;

/// Active identity plus the capabilities derived from it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub identity: Identity,
    pub is_admin: bool,
}

impl SessionResponse {
    fn new(state: &AppState, identity: Identity) -> Self {
        Self {
            is_admin: state.identity.is_admin(&identity),
            identity,
        }
    }
}

/// Simulated login; replaces any active identity
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let identity = state.identity.login(request).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::new(&state, identity))))
}

pub async fn current(State(state): State<AppState>) -> AppResult<Json<SessionResponse>> {
    let identity = state.identity.require_current().await?;
    Ok(Json(SessionResponse::new(&state, identity)))
}

pub async fn logout(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.identity.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<PreferencesUpdate>,
) -> AppResult<Json<SessionResponse>> {
    let identity = state.identity.update_preferences(update).await?;
    Ok(Json(SessionResponse::new(&state, identity)))
}

pub async fn languages() -> Json<&'static [Language]> {
    Json(SUPPORTED_LANGUAGES)
}
