use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{ProfileResponse, UpdateProfileRequest, UpdateProfileResponse};
use super::repo_types::UserProfile;
use super::services::{self, PROFILE_UPDATED};
use crate::{auth::extractors::AuthUser, error::AppError, json::AppJson, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/users/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = services::get_profile(&state.users, user_id).await?;
    Ok(Json(ProfileResponse {
        user: UserProfile::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, AppError> {
    let user = services::update_profile(&state.users, user_id, payload).await?;
    Ok(Json(UpdateProfileResponse {
        user: UserProfile::from(&user),
        message: PROFILE_UPDATED.into(),
    }))
}
