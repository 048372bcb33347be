//! Who is acting on a request.
//!
//! A session names exactly one user. It is created only after the login or
//! registration that produced the user id has committed, and it stops
//! resolving once cleared, once it expires, or once its user is gone.

use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AccountError;
use crate::store::{AccountStore, SessionRecord, User};

/// Opens a session valid for `ttl`, dropping the user's expired ones first.
pub async fn establish(
    store: &dyn AccountStore,
    user_id: Uuid,
    ttl: Duration,
) -> Result<SessionRecord, AccountError> {
    let now = OffsetDateTime::now_utc();
    let pruned = store.delete_expired_sessions(user_id, now).await?;
    if pruned > 0 {
        debug!(user_id = %user_id, pruned, "expired sessions removed");
    }
    let session = store.create_session(user_id, now + ttl).await?;
    info!(user_id = %user_id, session_id = %session.id, "session established");
    Ok(session)
}

/// Resolves the session's user. Expired sessions and sessions pointing at a
/// vanished user are dropped.
pub async fn current(
    store: &dyn AccountStore,
    session_id: Uuid,
) -> Result<Option<User>, AccountError> {
    let Some(session) = store.find_session(session_id).await? else {
        debug!(session_id = %session_id, "no such session");
        return Ok(None);
    };
    if session.is_expired(OffsetDateTime::now_utc()) {
        info!(session_id = %session_id, user_id = %session.user_id, "dropping expired session");
        store.delete_session(session_id).await?;
        return Ok(None);
    }
    match store.find_user_by_id(session.user_id).await? {
        Some(user) => Ok(Some(user)),
        None => {
            info!(session_id = %session_id, user_id = %session.user_id, "dropping stale session");
            store.delete_session(session_id).await?;
            Ok(None)
        }
    }
}

/// Pushes expiry to `ttl` from now. Returns false if the session is already gone.
pub async fn extend(
    store: &dyn AccountStore,
    session_id: Uuid,
    ttl: Duration,
) -> Result<bool, AccountError> {
    let extended = store
        .extend_session(session_id, OffsetDateTime::now_utc() + ttl)
        .await?;
    debug!(session_id = %session_id, extended, "session extended");
    Ok(extended)
}

/// Idempotent.
pub async fn clear(store: &dyn AccountStore, session_id: Uuid) -> Result<(), AccountError> {
    store.delete_session(session_id).await?;
    info!(session_id = %session_id, "session cleared");
    Ok(())
}
