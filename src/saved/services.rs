use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AccountError;
use crate::store::{AccountStore, ItemKind, ItemSnapshot, SaveOutcome, SavedItem};

async fn ensure_user(store: &dyn AccountStore, user_id: Uuid) -> Result<(), AccountError> {
    match store.find_user_by_id(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AccountError::NotFound("User")),
    }
}

/// Saving an item that is already in the ledger returns the stored record.
pub async fn save(
    store: &dyn AccountStore,
    user_id: Uuid,
    kind: ItemKind,
    mut snapshot: ItemSnapshot,
) -> Result<SaveOutcome, AccountError> {
    snapshot.name = snapshot.name.trim().to_owned();
    if snapshot.name.is_empty() {
        return Err(AccountError::Validation("Item name is required".into()));
    }
    ensure_user(store, user_id).await?;

    let outcome = store.save_item(user_id, kind, &snapshot).await?;
    if outcome.created {
        info!(user_id = %user_id, %kind, name = %outcome.item.name, "item saved");
    } else {
        debug!(user_id = %user_id, %kind, name = %outcome.item.name, "item already saved");
    }
    Ok(outcome)
}

/// Removing an item that isn't saved is a no-op.
pub async fn unsave(
    store: &dyn AccountStore,
    user_id: Uuid,
    kind: ItemKind,
    name: &str,
) -> Result<(), AccountError> {
    ensure_user(store, user_id).await?;
    let removed = store.remove_item(user_id, kind, name.trim()).await?;
    debug!(user_id = %user_id, %kind, name = %name.trim(), removed, "unsave");
    Ok(())
}

pub async fn unsave_by_id(
    store: &dyn AccountStore,
    user_id: Uuid,
    kind: ItemKind,
    item_id: Uuid,
) -> Result<(), AccountError> {
    ensure_user(store, user_id).await?;
    let removed = store.remove_item_by_id(user_id, kind, item_id).await?;
    debug!(user_id = %user_id, %kind, item_id = %item_id, removed, "unsave by id");
    Ok(())
}

pub async fn is_saved(
    store: &dyn AccountStore,
    user_id: Uuid,
    kind: ItemKind,
    name: &str,
) -> Result<bool, AccountError> {
    ensure_user(store, user_id).await?;
    Ok(store.find_item(user_id, kind, name.trim()).await?.is_some())
}

/// Oldest first.
pub async fn list_saved(
    store: &dyn AccountStore,
    user_id: Uuid,
    kind: ItemKind,
) -> Result<Vec<SavedItem>, AccountError> {
    ensure_user(store, user_id).await?;
    Ok(store.list_items(user_id, kind).await?)
}
