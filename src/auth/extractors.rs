use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::jwt::{Claims, JwtKeys, TokenKind};
use super::session;
use crate::{error::ApiError, state::AppState, store::User};

/// A signed, unexpired access token. Its session may already be cleared.
pub struct SessionToken(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for SessionToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized("Invalid Authorization header"))?;

        let claims = keys.verify_kind(token, TokenKind::Access).map_err(|e| {
            debug!(error = %e, "rejected access token");
            ApiError::Unauthorized("Invalid or expired token")
        })?;

        Ok(SessionToken(claims))
    }
}

/// The user acting on this request, resolved through a live session.
pub struct CurrentUser {
    pub user: User,
    pub session_id: Uuid,
}

impl CurrentUser {
    /// Per-user routes only serve the caller's own account.
    pub fn ensure_self(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.user.id == user_id {
            Ok(())
        } else {
            warn!(user_id = %self.user.id, target = %user_id, "cross-account access refused");
            Err(ApiError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionToken(claims) = SessionToken::from_request_parts(parts, state).await?;

        let user = session::current(state.store.as_ref(), claims.sid)
            .await?
            .filter(|u| u.id == claims.sub)
            .ok_or(ApiError::Unauthorized("Session expired, please log in again"))?;

        Ok(CurrentUser {
            user,
            session_id: claims.sid,
        })
    }
}
