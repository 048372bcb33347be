use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::services;
use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    response::Envelope,
    state::AppState,
    store::{ProfileUpdate, User},
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/user/:id", get(get_profile).put(update_profile))
}

#[instrument(skip(state, current))]
pub async fn get_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<User>>, ApiError> {
    current.ensure_self(id)?;
    let user = services::get_user(state.store.as_ref(), id).await?;
    Ok(Envelope::ok(user))
}

#[instrument(skip(state, current, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<Envelope<User>>, ApiError> {
    current.ensure_self(id)?;
    let user = services::update_profile(state.store.as_ref(), id, payload).await?;
    Ok(Envelope::ok_with("Profile updated successfully", user))
}
