use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

mod memory;
mod postgres;
mod types;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use types::{
    ItemKind, ItemSnapshot, NewUser, ProfileUpdate, SaveOutcome, SavedItem, SessionRecord, User,
};

/// Persistence behind accounts, sessions and the saved-item ledger.
///
/// Every method is a single atomic read-modify-write. Lookups by email expect
/// an already-normalized (trimmed, lower-cased) address.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns `None` when the email is already taken; the store is left untouched.
    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()>;
    /// Returns `None` when the user doesn't exist.
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate)
        -> anyhow::Result<Option<User>>;

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<SessionRecord>;
    async fn find_session(&self, id: Uuid) -> anyhow::Result<Option<SessionRecord>>;
    /// Moves `expires_at` forward. Returns false when the session is gone.
    async fn extend_session(&self, id: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<bool>;
    async fn delete_session(&self, id: Uuid) -> anyhow::Result<()>;
    /// Deletes the user's sessions that expired at or before `now`; returns how many.
    async fn delete_expired_sessions(&self, user_id: Uuid, now: OffsetDateTime)
        -> anyhow::Result<u64>;

    /// Inserts unless `(user_id, kind, snapshot.name)` exists, in which case the
    /// stored row comes back with `created = false`.
    async fn save_item(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        snapshot: &ItemSnapshot,
    ) -> anyhow::Result<SaveOutcome>;
    /// Returns whether a row was removed.
    async fn remove_item(&self, user_id: Uuid, kind: ItemKind, name: &str) -> anyhow::Result<bool>;
    async fn remove_item_by_id(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        item_id: Uuid,
    ) -> anyhow::Result<bool>;
    async fn find_item(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        name: &str,
    ) -> anyhow::Result<Option<SavedItem>>;
    /// Oldest first.
    async fn list_items(&self, user_id: Uuid, kind: ItemKind) -> anyhow::Result<Vec<SavedItem>>;
}
