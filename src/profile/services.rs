use tracing::info;
use uuid::Uuid;

use crate::auth::services::validate_name;
use crate::error::AccountError;
use crate::store::{AccountStore, ProfileUpdate, User};

pub async fn get_user(store: &dyn AccountStore, user_id: Uuid) -> Result<User, AccountError> {
    store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AccountError::NotFound("User"))
}

/// Coalescing update: absent keys keep their value, present ones (even `""`) overwrite.
pub async fn update_profile(
    store: &dyn AccountStore,
    user_id: Uuid,
    mut update: ProfileUpdate,
) -> Result<User, AccountError> {
    if let Some(name) = update.name.as_mut() {
        *name = name.trim().to_owned();
        validate_name(name)?;
    }
    if update.is_empty() {
        return get_user(store, user_id).await;
    }

    let user = store
        .update_profile(user_id, &update)
        .await?
        .ok_or(AccountError::NotFound("User"))?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}
