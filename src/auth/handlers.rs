use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
        extractors::{CurrentUser, SessionToken},
        jwt::{JwtKeys, TokenKind},
        services, session,
    },
    error::ApiError,
    response::Envelope,
    state::AppState,
    store::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Opens a session for a committed user and hands out its token pair.
async fn start_session(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let ttl = state.config.jwt.session_ttl();
    let session = session::establish(state.store.as_ref(), user.id, ttl).await?;
    let pair = JwtKeys::from_ref(state).sign_pair(user.id, session.id)?;
    Ok(AuthResponse {
        user,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<AuthResponse>>), ApiError> {
    let user = services::register(
        state.store.as_ref(),
        &payload.name,
        &payload.email,
        &payload.password,
    )
    .await?;
    let response = start_session(&state, user).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::ok_with("Account created successfully", response),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    let user =
        services::authenticate(state.store.as_ref(), &payload.email, &payload.password).await?;
    let response = start_session(&state, user).await?;
    Ok(Envelope::ok_with("Login successful", response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_kind(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token"))?;

    // Refreshing never revives a cleared or expired session.
    let user = session::current(state.store.as_ref(), claims.sid)
        .await?
        .filter(|u| u.id == claims.sub)
        .ok_or(ApiError::Unauthorized("Session expired, please log in again"))?;

    let ttl = state.config.jwt.session_ttl();
    if !session::extend(state.store.as_ref(), claims.sid, ttl).await? {
        return Err(ApiError::Unauthorized("Session expired, please log in again"));
    }

    let pair = keys.sign_pair(user.id, claims.sid)?;
    Ok(Envelope::ok(AuthResponse {
        user,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

#[instrument(skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    token: Option<SessionToken>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if let Some(SessionToken(claims)) = token {
        session::clear(state.store.as_ref(), claims.sid).await?;
        info!(user_id = %claims.sub, "user logged out");
    }
    Ok(Envelope::message("Logged out"))
}

#[instrument(skip(current))]
pub async fn me(current: CurrentUser) -> Json<Envelope<User>> {
    Envelope::ok(current.user)
}
